pub mod http_object_store;
pub mod speechkit_async_recognizer;
pub mod speechkit_sync_recognizer;
