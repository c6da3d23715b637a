use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaEngineError {
    #[error("failed to open media at {path}: {message}")]
    Open { path: String, message: String },
    #[error("no audio stream in {0}")]
    NoAudioStream(String),
    #[error("transcode failed: {0}")]
    Transcode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Container-level metadata returned by [`MediaEngine::probe`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaInfo {
    pub duration_seconds: f64,
}

/// Domain interface for probing and transcoding source media.
///
/// Implementations produce mono 16 kHz Opus/OGG audio, the only format
/// the recognition backends accept.
pub trait MediaEngine: Send {
    /// Return container metadata without decoding.
    fn probe(&self, path: &Path) -> Result<MediaInfo, MediaEngineError>;

    /// Extract the full audio track to `output` at the given bitrate.
    fn extract_audio(
        &self,
        source: &Path,
        output: &Path,
        bitrate: u32,
    ) -> Result<(), MediaEngineError>;

    /// Extract a bounded segment `[start, start + duration)` directly from
    /// the source media to `output` at the given bitrate.
    fn extract_segment(
        &self,
        source: &Path,
        output: &Path,
        start_seconds: f64,
        duration_seconds: f64,
        bitrate: u32,
    ) -> Result<(), MediaEngineError>;
}
