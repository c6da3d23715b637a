use std::time::{Duration, Instant};

use crate::recognition::domain::async_recognizer::{AsyncRecognizer, JobStatus};
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::shared::constants::NO_SPEECH_TEXT;

/// Polls a long-running recognition job until it is done, fails, or the
/// wall-clock budget runs out.
///
/// State machine: submitted → polling → { done | failed | timeout }.
/// A timeout abandons polling only; the backend job itself is not
/// cancelled. A `JobExpired` status error short-circuits immediately,
/// since continuing to poll an expired job can never succeed.
pub struct JobPoller {
    interval: Duration,
    max_wait: Duration,
}

impl JobPoller {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    /// Poll until terminal. A `Done` job with no segments yields the
    /// no-speech sentinel rather than an error.
    pub fn wait(
        &self,
        backend: &dyn AsyncRecognizer,
        job_id: &str,
    ) -> Result<String, RecognitionError> {
        let start = Instant::now();
        loop {
            match backend.status(job_id)? {
                JobStatus::Done(segments) => {
                    log::info!("job {job_id} done with {} segments", segments.len());
                    return Ok(join_segments(&segments));
                }
                JobStatus::Failed(message) => {
                    return Err(RecognitionError::JobFailed(message));
                }
                JobStatus::Pending => {
                    let waited = start.elapsed();
                    if waited >= self.max_wait {
                        return Err(RecognitionError::Timeout {
                            waited_secs: waited.as_secs(),
                        });
                    }
                    log::debug!("job {job_id} still running ({}s)", waited.as_secs());
                    std::thread::sleep(self.interval);
                }
            }
        }
    }
}

fn join_segments(segments: &[String]) -> String {
    let text = segments
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        NO_SPEECH_TEXT.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Reports `Pending` a fixed number of times, then a terminal status.
    struct ScriptedBackend {
        pending_polls: usize,
        terminal: Mutex<Option<JobStatus>>,
        polls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn done_after(pending_polls: usize, segments: Vec<&str>) -> Self {
            Self {
                pending_polls,
                terminal: Mutex::new(Some(JobStatus::Done(
                    segments.into_iter().map(String::from).collect(),
                ))),
                polls: AtomicUsize::new(0),
            }
        }
    }

    impl AsyncRecognizer for ScriptedBackend {
        fn submit(&self, _: &str, _: &str) -> Result<String, RecognitionError> {
            Ok("job-1".to_string())
        }

        fn status(&self, _: &str) -> Result<JobStatus, RecognitionError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n < self.pending_polls {
                Ok(JobStatus::Pending)
            } else {
                Ok(self.terminal.lock().unwrap().take().unwrap_or(JobStatus::Pending))
            }
        }
    }

    struct NeverDone;

    impl AsyncRecognizer for NeverDone {
        fn submit(&self, _: &str, _: &str) -> Result<String, RecognitionError> {
            Ok("job-1".to_string())
        }

        fn status(&self, _: &str) -> Result<JobStatus, RecognitionError> {
            Ok(JobStatus::Pending)
        }
    }

    struct ExpiredBackend {
        polls: AtomicUsize,
    }

    impl AsyncRecognizer for ExpiredBackend {
        fn submit(&self, _: &str, _: &str) -> Result<String, RecognitionError> {
            Ok("job-1".to_string())
        }

        fn status(&self, _: &str) -> Result<JobStatus, RecognitionError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Err(RecognitionError::JobExpired)
        }
    }

    fn fast_poller() -> JobPoller {
        JobPoller::new(Duration::from_millis(1), Duration::from_secs(5))
    }

    #[test]
    fn test_done_after_n_polls() {
        let backend = ScriptedBackend::done_after(3, vec!["hello", "world"]);
        let text = fast_poller().wait(&backend, "job-1").unwrap();
        assert_eq!(text, "hello world");
        // 3 pending polls plus the terminal one
        assert_eq!(backend.polls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_immediate_done() {
        let backend = ScriptedBackend::done_after(0, vec!["text"]);
        let text = fast_poller().wait(&backend, "job-1").unwrap();
        assert_eq!(text, "text");
        assert_eq!(backend.polls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_segments_yield_no_speech_sentinel() {
        let backend = ScriptedBackend::done_after(0, vec![]);
        let text = fast_poller().wait(&backend, "job-1").unwrap();
        assert_eq!(text, NO_SPEECH_TEXT);
    }

    #[test]
    fn test_blank_segments_yield_no_speech_sentinel() {
        let backend = ScriptedBackend::done_after(0, vec!["", "  "]);
        let text = fast_poller().wait(&backend, "job-1").unwrap();
        assert_eq!(text, NO_SPEECH_TEXT);
    }

    #[test]
    fn test_failed_job_propagates_backend_message() {
        let backend = ScriptedBackend {
            pending_polls: 1,
            terminal: Mutex::new(Some(JobStatus::Failed("audio too noisy".to_string()))),
            polls: AtomicUsize::new(0),
        };
        let err = fast_poller().wait(&backend, "job-1").unwrap_err();
        match err {
            RecognitionError::JobFailed(message) => assert_eq!(message, "audio too noisy"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timeout_at_wall_clock_bound() {
        let poller = JobPoller::new(Duration::from_millis(5), Duration::from_millis(50));
        let start = Instant::now();
        let err = poller.wait(&NeverDone, "job-1").unwrap_err();
        let elapsed = start.elapsed();
        assert!(matches!(err, RecognitionError::Timeout { .. }));
        assert!(elapsed >= Duration::from_millis(50));
        // generous upper bound: must not poll indefinitely
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_expired_job_short_circuits() {
        let backend = ExpiredBackend {
            polls: AtomicUsize::new(0),
        };
        let err = fast_poller().wait(&backend, "job-1").unwrap_err();
        assert!(matches!(err, RecognitionError::JobExpired));
        assert_eq!(backend.polls.load(Ordering::SeqCst), 1);
    }
}
