use crate::recognition::domain::recognition_error::RecognitionError;

/// Domain interface for the synchronous speech recognition backend.
///
/// Accepts small payloads only; the caller is responsible for keeping
/// requests under the backend's hard ceiling (the size guard certifies
/// chunks before they reach this path).
pub trait SyncRecognizer: Send {
    fn recognize(&self, audio: &[u8], language: &str) -> Result<String, RecognitionError>;
}
