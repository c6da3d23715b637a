use std::time::Duration;

use crate::shared::constants::{
    ASYNC_CEILING_BYTES, COMPRESSED_BITRATE, MAX_CHUNK_SECONDS, MAX_POLL_WAIT_SECS, MAX_TRACK_SECONDS,
    MIN_CHUNK_SECONDS, MIN_WINDOW_SECONDS, POLL_INTERVAL_SECS, STANDARD_BITRATE,
    SUBDIVIDE_SECONDS, SYNC_CEILING_BYTES, TARGET_CHUNK_BYTES, TRACK_BITRATE,
};

/// Tunables for one transcription run.
///
/// Passed explicitly into each component rather than read from globals,
/// so tests can run with tiny ceilings and durations.
#[derive(Clone, Debug)]
pub struct TranscribeConfig {
    /// Bitrate for the full-track extraction.
    pub track_bitrate: u32,
    /// Baseline chunk bitrate (standard escalation tier).
    pub standard_bitrate: u32,
    /// Reduced chunk bitrate (compressed escalation tier).
    pub compressed_bitrate: u32,
    /// Target per-chunk size for planning, below the sync ceiling.
    pub target_chunk_bytes: u64,
    /// Hard payload ceiling of the synchronous recognition backend.
    pub sync_ceiling_bytes: u64,
    /// Largest track accepted by the asynchronous path.
    pub async_ceiling_bytes: u64,
    /// Chunk duration clamp in seconds.
    pub min_chunk_seconds: u64,
    pub max_chunk_seconds: u64,
    /// Sub-window length for the subdivision tier, in seconds.
    pub subdivide_seconds: f64,
    /// Minimum window granularity; recursion bottoms out here.
    pub min_window_seconds: f64,
    /// Longest accepted source duration, in seconds.
    pub max_track_seconds: f64,
    /// Interval between status polls of a long-running job.
    pub poll_interval: Duration,
    /// Wall-clock budget for a long-running job.
    pub max_poll_wait: Duration,
    /// Recognition language tag, e.g. "ru-RU".
    pub language: String,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            track_bitrate: TRACK_BITRATE,
            standard_bitrate: STANDARD_BITRATE,
            compressed_bitrate: COMPRESSED_BITRATE,
            target_chunk_bytes: TARGET_CHUNK_BYTES,
            sync_ceiling_bytes: SYNC_CEILING_BYTES,
            async_ceiling_bytes: ASYNC_CEILING_BYTES,
            min_chunk_seconds: MIN_CHUNK_SECONDS,
            max_chunk_seconds: MAX_CHUNK_SECONDS,
            subdivide_seconds: SUBDIVIDE_SECONDS,
            min_window_seconds: MIN_WINDOW_SECONDS,
            max_track_seconds: MAX_TRACK_SECONDS,
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            max_poll_wait: Duration::from_secs(MAX_POLL_WAIT_SECS),
            language: "ru-RU".to_string(),
        }
    }
}
