use std::fs;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::chunking::domain::chunk_extractor::{ChunkError, ChunkExtractor};
use crate::chunking::domain::chunk_plan::ChunkPlan;
use crate::chunking::domain::size_guard::SizeGuard;
use crate::media::domain::audio_track::AudioTrack;
use crate::media::domain::media_engine::{MediaEngine, MediaEngineError};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::recognition::domain::async_recognizer::AsyncRecognizer;
use crate::recognition::domain::job_poller::JobPoller;
use crate::recognition::domain::object_store::ObjectStore;
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::domain::sync_recognizer::SyncRecognizer;
use crate::recognition::domain::transcript::TranscriptResult;
use crate::shared::config::TranscribeConfig;
use crate::shared::constants::{AUDIO_CHANNELS, SPEECH_SAMPLE_RATE};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Media(#[from] MediaEngineError),
    #[error("source runs {actual_hours:.2}h, above the {max_hours:.1}h limit")]
    TrackTooLong { actual_hours: f64, max_hours: f64 },
    #[error("source has no measurable duration")]
    EmptyDuration,
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The asynchronous recognition path: an object store to stage the track
/// and a long-running recognition backend reading from it.
pub struct AsyncBackend {
    pub recognizer: Box<dyn AsyncRecognizer>,
    pub store: Box<dyn ObjectStore>,
}

/// Orchestrates the full video transcription pipeline.
///
/// Probes and extracts the audio track into a run-scoped scratch
/// directory, then dispatches: async recognition when a backend is
/// configured and the track fits its ceiling, whole-track sync
/// recognition for small tracks, and the chunked sync path otherwise.
/// Async and whole-track failures degrade to the chunked path unless the
/// failure is fatal (bad credentials, exhausted quota), which aborts the
/// run.
pub struct TranscribeVideoUseCase {
    engine: Box<dyn MediaEngine>,
    sync_recognizer: Box<dyn SyncRecognizer>,
    async_backend: Option<AsyncBackend>,
    config: TranscribeConfig,
    logger: Box<dyn PipelineLogger>,
}

impl TranscribeVideoUseCase {
    pub fn new(
        engine: Box<dyn MediaEngine>,
        sync_recognizer: Box<dyn SyncRecognizer>,
        async_backend: Option<AsyncBackend>,
        config: TranscribeConfig,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            engine,
            sync_recognizer,
            async_backend,
            config,
            logger,
        }
    }

    pub fn execute(&mut self, source: &Path) -> Result<String, PipelineError> {
        let info = self.engine.probe(source)?;
        if info.duration_seconds <= 0.0 {
            return Err(PipelineError::EmptyDuration);
        }
        if info.duration_seconds > self.config.max_track_seconds {
            return Err(PipelineError::TrackTooLong {
                actual_hours: info.duration_seconds / 3600.0,
                max_hours: self.config.max_track_seconds / 3600.0,
            });
        }

        let scratch = tempfile::Builder::new().prefix("videoscribe-").tempdir()?;
        let track = self.extract_track(source, info.duration_seconds, scratch.path())?;
        self.logger.info(&format!(
            "extracted audio track: {:.1}s, {:.2} MB at {} bit/s",
            track.duration_seconds,
            track.size_mb(),
            track.bitrate
        ));

        let text = self.dispatch(&track)?;
        self.logger.summary();
        Ok(text)
    }

    fn extract_track(
        &mut self,
        source: &Path,
        duration_seconds: f64,
        scratch: &Path,
    ) -> Result<AudioTrack, PipelineError> {
        let output = scratch.join("track.ogg");
        let started = Instant::now();
        self.engine
            .extract_audio(source, &output, self.config.track_bitrate)?;
        self.logger
            .timing("extract_track", started.elapsed().as_secs_f64() * 1000.0);

        let byte_size = fs::metadata(&output)?.len();
        Ok(AudioTrack {
            source_path: source.to_path_buf(),
            path: output,
            bitrate: self.config.track_bitrate,
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: AUDIO_CHANNELS,
            duration_seconds,
            byte_size,
        })
    }

    fn dispatch(&mut self, track: &AudioTrack) -> Result<String, PipelineError> {
        if track.byte_size <= self.config.async_ceiling_bytes {
            if let Some(backend) = &self.async_backend {
                match Self::transcribe_async(backend, &self.config, self.logger.as_mut(), track) {
                    Ok(text) => return Ok(text),
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => {
                        log::warn!("async recognition failed, falling back: {e}");
                    }
                }
            }
        }

        if track.byte_size <= self.config.sync_ceiling_bytes {
            let bytes = fs::read(&track.path)?;
            match self.sync_recognizer.recognize(&bytes, &self.config.language) {
                Ok(text) => return Ok(text),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    log::warn!("whole-track recognition failed, chunking instead: {e}");
                }
            }
        }

        self.transcribe_chunked(track)
    }

    fn transcribe_async(
        backend: &AsyncBackend,
        config: &TranscribeConfig,
        logger: &mut dyn PipelineLogger,
        track: &AudioTrack,
    ) -> Result<String, RecognitionError> {
        let key = staging_key(&track.path);
        let uri = backend
            .store
            .upload(&track.path, &key)
            .map_err(|e| RecognitionError::Storage(e.to_string()))?;

        let started = Instant::now();
        let outcome = backend
            .recognizer
            .submit(&uri, &config.language)
            .and_then(|job_id| {
                logger.info(&format!("submitted recognition job {job_id}"));
                JobPoller::new(config.poll_interval, config.max_poll_wait)
                    .wait(backend.recognizer.as_ref(), &job_id)
            });
        logger.timing("async_job", started.elapsed().as_secs_f64() * 1000.0);

        backend.store.delete(&key);
        outcome
    }

    fn transcribe_chunked(&mut self, track: &AudioTrack) -> Result<String, PipelineError> {
        let config = self.config.clone();
        let scratch = track.path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let extractor = ChunkExtractor::new(self.engine.as_ref(), scratch);
        let guard = SizeGuard::new(&extractor, &config);

        let plan = ChunkPlan::plan(
            track.duration_seconds,
            config.target_chunk_bytes,
            config.standard_bitrate,
            config.min_chunk_seconds,
            config.max_chunk_seconds,
        );
        log::info!(
            "chunking plan: {} chunks of {:.0}s",
            plan.chunk_count,
            plan.chunk_duration
        );

        let windows = plan.windows(track.duration_seconds);
        let total = windows.len();
        let mut result = TranscriptResult::new();

        for (i, window) in windows.into_iter().enumerate() {
            self.logger.progress(i + 1, total);
            let started = Instant::now();

            match guard.ensure_within_budget(&track.source_path, window) {
                Ok(chunks) => {
                    for chunk in chunks {
                        let attempt = match fs::read(&chunk.path) {
                            Ok(bytes) => {
                                self.sync_recognizer.recognize(&bytes, &config.language)
                            }
                            Err(e) => {
                                Err(RecognitionError::Backend(format!("unreadable chunk: {e}")))
                            }
                        };
                        chunk.remove();
                        match attempt {
                            Ok(text) => result.push(text),
                            Err(e) if e.is_fatal() => return Err(e.into()),
                            Err(e) => {
                                log::warn!("chunk at {:.1}s failed: {e}", chunk.window.start);
                                result.push_failure();
                            }
                        }
                    }
                }
                Err(ChunkError::Media(e)) => return Err(e.into()),
                Err(e) => {
                    log::warn!("window at {:.1}s yielded no chunks: {e}", window.start);
                    result.push_failure();
                }
            }

            self.logger
                .timing("chunk", started.elapsed().as_secs_f64() * 1000.0);
        }

        if result.failed_count() > 0 {
            log::warn!(
                "{} of {} entries failed and were skipped",
                result.failed_count(),
                result.len()
            );
        }
        Ok(result.aggregate())
    }
}

/// Storage key for the staged track: unique per run, grouped under a
/// single prefix so leftover objects are easy to find.
fn staging_key(track_path: &Path) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let filename = track_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("track.ogg");
    format!("audio/{millis}_{filename}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::domain::media_engine::MediaInfo;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::recognition::domain::async_recognizer::JobStatus;
    use crate::recognition::domain::object_store::StorageError;
    use crate::shared::constants::OGG_MAGIC;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn ogg_bytes(len: u64) -> Vec<u8> {
        let mut bytes = OGG_MAGIC.to_vec();
        bytes.resize(len as usize, 0);
        bytes
    }

    /// Media stub with a fixed track size and duration-proportional
    /// segment sizes, optionally inflated inside a hot time range.
    struct StubMedia {
        duration: f64,
        track_bytes: u64,
        hot: Option<(f64, f64, f64)>,
    }

    impl MediaEngine for StubMedia {
        fn probe(&self, _: &Path) -> Result<MediaInfo, MediaEngineError> {
            Ok(MediaInfo {
                duration_seconds: self.duration,
            })
        }

        fn extract_audio(&self, _: &Path, output: &Path, _: u32) -> Result<(), MediaEngineError> {
            fs::write(output, ogg_bytes(self.track_bytes))?;
            Ok(())
        }

        fn extract_segment(
            &self,
            _: &Path,
            output: &Path,
            start: f64,
            duration: f64,
            bitrate: u32,
        ) -> Result<(), MediaEngineError> {
            let mut size = duration * bitrate as f64 / 8.0;
            if let Some((hot_start, hot_end, multiplier)) = self.hot {
                if start < hot_end && start + duration > hot_start {
                    size *= multiplier;
                }
            }
            fs::write(output, ogg_bytes((size as u64).max(4)))?;
            Ok(())
        }
    }

    /// Returns "s0", "s1", ... per call; optionally fails one call with a
    /// non-fatal backend error.
    struct CountingSync {
        calls: Arc<AtomicUsize>,
        fail_index: Option<usize>,
    }

    impl CountingSync {
        fn new() -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                fail_index: None,
            }
        }
    }

    impl SyncRecognizer for CountingSync {
        fn recognize(&self, _: &[u8], _: &str) -> Result<String, RecognitionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_index == Some(n) {
                Err(RecognitionError::Backend("transient".to_string()))
            } else {
                Ok(format!("s{n}"))
            }
        }
    }

    struct FixedSync {
        text: String,
        calls: AtomicUsize,
    }

    impl SyncRecognizer for FixedSync {
        fn recognize(&self, _: &[u8], _: &str) -> Result<String, RecognitionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    struct AuthSync;

    impl SyncRecognizer for AuthSync {
        fn recognize(&self, _: &[u8], _: &str) -> Result<String, RecognitionError> {
            Err(RecognitionError::Auth("bad key".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        uploads: Mutex<Vec<String>>,
        deletes: Mutex<Vec<String>>,
    }

    impl ObjectStore for RecordingStore {
        fn upload(&self, _: &Path, key: &str) -> Result<String, StorageError> {
            self.uploads.lock().unwrap().push(key.to_string());
            Ok(format!("https://storage.test/bucket/{key}"))
        }

        fn delete(&self, key: &str) {
            self.deletes.lock().unwrap().push(key.to_string());
        }
    }

    struct DoneAsync {
        text: String,
    }

    impl AsyncRecognizer for DoneAsync {
        fn submit(&self, _: &str, _: &str) -> Result<String, RecognitionError> {
            Ok("op-1".to_string())
        }

        fn status(&self, _: &str) -> Result<JobStatus, RecognitionError> {
            Ok(JobStatus::Done(vec![self.text.clone()]))
        }
    }

    struct FailSubmitAsync;

    impl AsyncRecognizer for FailSubmitAsync {
        fn submit(&self, _: &str, _: &str) -> Result<String, RecognitionError> {
            Err(RecognitionError::Backend("submit rejected".to_string()))
        }

        fn status(&self, _: &str) -> Result<JobStatus, RecognitionError> {
            Ok(JobStatus::Pending)
        }
    }

    fn test_config() -> TranscribeConfig {
        TranscribeConfig {
            poll_interval: Duration::from_millis(1),
            max_poll_wait: Duration::from_millis(100),
            ..TranscribeConfig::default()
        }
    }

    fn use_case(
        engine: StubMedia,
        sync: Box<dyn SyncRecognizer>,
        async_backend: Option<AsyncBackend>,
    ) -> TranscribeVideoUseCase {
        TranscribeVideoUseCase::new(
            Box::new(engine),
            sync,
            async_backend,
            test_config(),
            Box::new(NullPipelineLogger),
        )
    }

    fn expected_series(count: usize) -> String {
        (0..count)
            .map(|i| format!("s{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_small_track_transcribed_whole() {
        let engine = StubMedia {
            duration: 30.0,
            track_bytes: 10_000,
            hot: None,
        };
        let sync = FixedSync {
            text: "whole track text".to_string(),
            calls: AtomicUsize::new(0),
        };
        let mut uc = use_case(engine, Box::new(sync), None);
        let text = uc.execute(Path::new("in.mp4")).unwrap();
        assert_eq!(text, "whole track text");
    }

    #[test]
    fn test_long_track_chunked_in_order() {
        // 600s at the default 25s clamp gives 24 chunks.
        let engine = StubMedia {
            duration: 600.0,
            track_bytes: 2 * 1024 * 1024,
            hot: None,
        };
        let mut uc = use_case(engine, Box::new(CountingSync::new()), None);
        let text = uc.execute(Path::new("in.mp4")).unwrap();
        assert_eq!(text, expected_series(24));
    }

    #[test]
    fn test_hot_region_escalates_without_reordering() {
        // Chunk 5 covers [125, 150): inflated 15x it overflows the sync
        // ceiling at the standard bitrate but fits compressed.
        let engine = StubMedia {
            duration: 600.0,
            track_bytes: 2 * 1024 * 1024,
            hot: Some((125.0, 150.0, 15.0)),
        };
        let mut uc = use_case(engine, Box::new(CountingSync::new()), None);
        let text = uc.execute(Path::new("in.mp4")).unwrap();
        assert_eq!(text, expected_series(24));
    }

    #[test]
    fn test_async_path_preferred_when_configured() {
        let engine = StubMedia {
            duration: 600.0,
            track_bytes: 2 * 1024 * 1024,
            hot: None,
        };
        let sync = CountingSync::new();
        let sync_calls = sync.calls.clone();
        let backend = AsyncBackend {
            recognizer: Box::new(DoneAsync {
                text: "async result".to_string(),
            }),
            store: Box::new(RecordingStore::default()),
        };
        let mut uc = use_case(engine, Box::new(sync), Some(backend));
        let text = uc.execute(Path::new("in.mp4")).unwrap();
        assert_eq!(text, "async result");
        assert_eq!(sync_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_staged_object_uploaded_then_deleted() {
        let engine = StubMedia {
            duration: 60.0,
            track_bytes: 50_000,
            hot: None,
        };
        let store = std::sync::Arc::new(RecordingStore::default());

        struct SharedStore(std::sync::Arc<RecordingStore>);
        impl ObjectStore for SharedStore {
            fn upload(&self, local: &Path, key: &str) -> Result<String, StorageError> {
                self.0.upload(local, key)
            }
            fn delete(&self, key: &str) {
                self.0.delete(key)
            }
        }

        let backend = AsyncBackend {
            recognizer: Box::new(DoneAsync {
                text: "ok".to_string(),
            }),
            store: Box::new(SharedStore(store.clone())),
        };
        let mut uc = use_case(engine, Box::new(CountingSync::new()), Some(backend));
        uc.execute(Path::new("in.mp4")).unwrap();

        let uploads = store.uploads.lock().unwrap();
        let deletes = store.deletes.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].starts_with("audio/"));
        assert_eq!(*deletes, *uploads);
    }

    #[test]
    fn test_async_failure_falls_back_to_whole_track_sync() {
        let engine = StubMedia {
            duration: 30.0,
            track_bytes: 10_000,
            hot: None,
        };
        let backend = AsyncBackend {
            recognizer: Box::new(FailSubmitAsync),
            store: Box::new(RecordingStore::default()),
        };
        let sync = FixedSync {
            text: "fallback".to_string(),
            calls: AtomicUsize::new(0),
        };
        let mut uc = use_case(engine, Box::new(sync), Some(backend));
        let text = uc.execute(Path::new("in.mp4")).unwrap();
        assert_eq!(text, "fallback");
    }

    #[test]
    fn test_async_failure_large_track_falls_back_to_chunked() {
        let engine = StubMedia {
            duration: 60.0,
            track_bytes: 2 * 1024 * 1024,
            hot: None,
        };
        let backend = AsyncBackend {
            recognizer: Box::new(FailSubmitAsync),
            store: Box::new(RecordingStore::default()),
        };
        let mut uc = use_case(engine, Box::new(CountingSync::new()), Some(backend));
        let text = uc.execute(Path::new("in.mp4")).unwrap();
        // 60s / 25s clamp = 3 chunks
        assert_eq!(text, expected_series(3));
    }

    #[test]
    fn test_auth_failure_aborts_run() {
        let engine = StubMedia {
            duration: 600.0,
            track_bytes: 2 * 1024 * 1024,
            hot: None,
        };
        let mut uc = use_case(engine, Box::new(AuthSync), None);
        let err = uc.execute(Path::new("in.mp4")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Recognition(RecognitionError::Auth(_))
        ));
    }

    #[test]
    fn test_failed_chunk_skipped_not_fatal() {
        let engine = StubMedia {
            duration: 75.0,
            track_bytes: 2 * 1024 * 1024,
            hot: None,
        };
        let sync = CountingSync {
            calls: Arc::new(AtomicUsize::new(0)),
            fail_index: Some(1),
        };
        let mut uc = use_case(engine, Box::new(sync), None);
        let text = uc.execute(Path::new("in.mp4")).unwrap();
        assert_eq!(text, "s0 s2");
    }

    #[test]
    fn test_track_too_long_rejected() {
        let engine = StubMedia {
            duration: 4.0 * 3600.0 + 10.0,
            track_bytes: 1_000,
            hot: None,
        };
        let mut uc = use_case(engine, Box::new(CountingSync::new()), None);
        let err = uc.execute(Path::new("in.mp4")).unwrap_err();
        assert!(matches!(err, PipelineError::TrackTooLong { .. }));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let engine = StubMedia {
            duration: 0.0,
            track_bytes: 1_000,
            hot: None,
        };
        let mut uc = use_case(engine, Box::new(CountingSync::new()), None);
        let err = uc.execute(Path::new("in.mp4")).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDuration));
    }

    #[test]
    fn test_staging_key_shape() {
        let key = staging_key(Path::new("/tmp/scratch/track.ogg"));
        assert!(key.starts_with("audio/"));
        assert!(key.ends_with("_track.ogg"));
    }
}
