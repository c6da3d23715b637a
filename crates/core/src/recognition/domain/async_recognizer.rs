use crate::recognition::domain::recognition_error::RecognitionError;

/// Reported state of a long-running recognition job.
#[derive(Clone, Debug, PartialEq)]
pub enum JobStatus {
    Pending,
    /// Ordered result segments; may be empty when no speech was detected.
    Done(Vec<String>),
    Failed(String),
}

/// Domain interface for the asynchronous, object-storage-backed
/// recognition backend.
pub trait AsyncRecognizer: Send {
    /// Submit a job for the audio at `audio_uri`; returns the job id.
    fn submit(&self, audio_uri: &str, language: &str) -> Result<String, RecognitionError>;

    /// Query job state. `RecognitionError::JobExpired` means the backend
    /// no longer knows the id and polling must stop.
    fn status(&self, job_id: &str) -> Result<JobStatus, RecognitionError>;
}
