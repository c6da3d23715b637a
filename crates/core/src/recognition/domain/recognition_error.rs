use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecognitionError {
    /// The payload exceeds the backend's request ceiling.
    #[error("payload of {bytes} bytes exceeds the backend request ceiling")]
    SizeExceeded { bytes: u64 },
    /// Invalid or missing credentials; check the API key, folder id and
    /// the service account roles.
    #[error("authentication rejected by the recognition backend: {0}")]
    Auth(String),
    /// Request quota exhausted; retry later.
    #[error("recognition backend rate limit exceeded")]
    RateLimited,
    /// Any other backend-reported failure.
    #[error("recognition backend error: {0}")]
    Backend(String),
    /// A long-running job reported a terminal error payload.
    #[error("recognition job failed: {0}")]
    JobFailed(String),
    /// The job id is unknown to the backend; its results window has
    /// likely expired.
    #[error("recognition job not found (results are kept for ~3 days)")]
    JobExpired,
    /// No terminal status within the wall-clock budget. The backend job
    /// is not cancelled.
    #[error("timed out after {waited_secs}s waiting for the recognition job")]
    Timeout { waited_secs: u64 },
    /// Upload to or deletion from object storage failed.
    #[error("object storage error: {0}")]
    Storage(String),
}

impl RecognitionError {
    /// Failures that invalidate the whole run rather than one chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_and_rate_limit_are_fatal() {
        assert!(RecognitionError::Auth("bad key".to_string()).is_fatal());
        assert!(RecognitionError::RateLimited.is_fatal());
    }

    #[test]
    fn test_per_chunk_failures_are_not_fatal() {
        assert!(!RecognitionError::SizeExceeded { bytes: 2_000_000 }.is_fatal());
        assert!(!RecognitionError::Backend("oops".to_string()).is_fatal());
        assert!(!RecognitionError::Timeout { waited_secs: 600 }.is_fatal());
        assert!(!RecognitionError::JobExpired.is_fatal());
    }
}
