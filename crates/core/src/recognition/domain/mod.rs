pub mod async_recognizer;
pub mod job_poller;
pub mod object_store;
pub mod recognition_error;
pub mod sync_recognizer;
pub mod transcript;
