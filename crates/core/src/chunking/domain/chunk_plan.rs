use crate::chunking::domain::chunk_window::ChunkWindow;

/// Immutable chunking plan for one audio track.
///
/// The chunk duration is derived from a byte budget and an assumed
/// bitrate, then clamped: too-short chunks multiply request overhead and
/// hurt recognition quality, too-long chunks are virtually guaranteed to
/// overflow the request ceiling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkPlan {
    pub target_bytes: u64,
    pub assumed_bitrate: u32,
    pub chunk_duration: f64,
    pub chunk_count: usize,
}

impl ChunkPlan {
    /// Compute a plan from validated inputs (duration > 0, budget > 0).
    pub fn plan(
        total_duration: f64,
        target_bytes: u64,
        assumed_bitrate: u32,
        min_chunk_seconds: u64,
        max_chunk_seconds: u64,
    ) -> Self {
        // Sub-byte-per-second bitrates would otherwise divide by zero.
        let bytes_per_second = (assumed_bitrate as u64 / 8).max(1);
        let raw_duration = target_bytes / bytes_per_second;
        let chunk_duration = raw_duration.clamp(min_chunk_seconds, max_chunk_seconds) as f64;
        let chunk_count = (total_duration / chunk_duration).ceil() as usize;
        Self {
            target_bytes,
            assumed_bitrate,
            chunk_duration,
            chunk_count,
        }
    }

    /// Top-level windows covering `[0, total_duration)` without gaps or
    /// overlap, the last one truncated to the remainder.
    pub fn windows(&self, total_duration: f64) -> Vec<ChunkWindow> {
        ChunkWindow::new(0.0, total_duration).subdivide(self.chunk_duration)
    }
}
