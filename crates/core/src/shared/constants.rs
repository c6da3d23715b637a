/// Sample rate expected by the speech recognition backends.
pub const SPEECH_SAMPLE_RATE: u32 = 16_000;

/// All extracted audio is mono.
pub const AUDIO_CHANNELS: u16 = 1;

/// Bitrate for the full-track extraction.
pub const TRACK_BITRATE: u32 = 32_000;

/// Baseline chunk bitrate, tuned for recognition quality.
pub const STANDARD_BITRATE: u32 = 24_000;

/// One step down from the standard bitrate; the lowest that still keeps
/// speech intelligible for the recognizer.
pub const COMPRESSED_BITRATE: u32 = 20_000;

/// Target per-chunk size (0.7 MiB), deliberately below the sync backend's
/// hard ceiling to leave margin for container overhead.
pub const TARGET_CHUNK_BYTES: u64 = 7 * 1024 * 1024 / 10;

/// Hard payload ceiling of the synchronous recognition endpoint.
pub const SYNC_CEILING_BYTES: u64 = 1024 * 1024;

/// Upper bound accepted by the asynchronous (object-storage-backed) path.
pub const ASYNC_CEILING_BYTES: u64 = 1024 * 1024 * 1024;

/// Chunk duration clamp, in seconds.
pub const MIN_CHUNK_SECONDS: u64 = 15;
pub const MAX_CHUNK_SECONDS: u64 = 25;

/// Sub-window length used when a compressed chunk still overflows.
pub const SUBDIVIDE_SECONDS: f64 = 10.0;

/// Minimum window granularity; at this length the size guard accepts
/// whatever the encoder produces rather than subdividing further.
pub const MIN_WINDOW_SECONDS: f64 = 5.0;

/// The async recognition backend accepts at most 4 hours of audio.
pub const MAX_TRACK_SECONDS: f64 = 4.0 * 3600.0;

/// Interval between status polls of a long-running recognition job.
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Wall-clock budget for a long-running recognition job.
pub const MAX_POLL_WAIT_SECS: u64 = 600;

/// First four bytes of a valid OGG container.
pub const OGG_MAGIC: [u8; 4] = *b"OggS";

/// Returned when a completed recognition job contains no segments.
pub const NO_SPEECH_TEXT: &str = "[no speech detected]";

/// Returned when every chunk of a run failed to transcribe.
pub const TRANSCRIPT_UNAVAILABLE_TEXT: &str = "[transcription unavailable]";
