use std::path::Path;

use crate::chunking::domain::audio_chunk::AudioChunk;
use crate::chunking::domain::chunk_extractor::{ChunkError, ChunkExtractor};
use crate::chunking::domain::chunk_window::ChunkWindow;
use crate::shared::config::TranscribeConfig;

/// One step of the size-repair policy, applied in [`ESCALATION_TIERS`]
/// order until a window yields accepted chunks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EscalationTier {
    /// Extract at the baseline bitrate.
    Standard,
    /// Re-extract the same window one bitrate step down.
    Compressed,
    /// Split the window into smaller sub-windows and recurse.
    Subdivide,
}

pub const ESCALATION_TIERS: [EscalationTier; 3] = [
    EscalationTier::Standard,
    EscalationTier::Compressed,
    EscalationTier::Subdivide,
];

/// Guarantees every chunk handed to the sync recognition path fits under
/// its payload ceiling.
///
/// A single global duration estimate is unreliable for sources with
/// variable bitrate, so each window is repaired individually: re-encode
/// lower, and if that is not enough, subdivide and recurse. Subdivision
/// strictly shrinks the window, and at the minimum granularity the guard
/// accepts whatever the encoder produces, which bounds the recursion.
/// Rejected intermediate artifacts are deleted before the next attempt.
pub struct SizeGuard<'a> {
    extractor: &'a ChunkExtractor<'a>,
    config: &'a TranscribeConfig,
}

impl<'a> SizeGuard<'a> {
    pub fn new(extractor: &'a ChunkExtractor<'a>, config: &'a TranscribeConfig) -> Self {
        Self { extractor, config }
    }

    /// Produce chronologically ordered chunks covering `window`, each at
    /// most `sync_ceiling_bytes` (except at the minimum granularity).
    pub fn ensure_within_budget(
        &self,
        source: &Path,
        window: ChunkWindow,
    ) -> Result<Vec<AudioChunk>, ChunkError> {
        let ceiling = self.config.sync_ceiling_bytes;
        let mut last_failure: Option<ChunkError> = None;

        for tier in ESCALATION_TIERS {
            match tier {
                EscalationTier::Standard => {
                    match self.extractor.extract(source, window, self.config.standard_bitrate) {
                        Ok(chunk) if chunk.byte_size <= ceiling => return Ok(vec![chunk]),
                        Ok(chunk) => {
                            log::debug!(
                                "chunk at {:.1}s overflows at standard bitrate ({} bytes)",
                                window.start,
                                chunk.byte_size
                            );
                            chunk.remove();
                        }
                        Err(e @ ChunkError::ExtractionFailed { .. }) => {
                            log::warn!("standard-tier extraction failed, escalating: {e}");
                            last_failure = Some(e);
                        }
                        Err(e) => return Err(e),
                    }
                }
                EscalationTier::Compressed => {
                    match self
                        .extractor
                        .extract(source, window, self.config.compressed_bitrate)
                    {
                        Ok(chunk) if chunk.byte_size <= ceiling => return Ok(vec![chunk]),
                        Ok(chunk) if window.duration <= self.config.min_window_seconds => {
                            // Recursion floor: accept the oversized artifact
                            // rather than subdividing forever.
                            log::warn!(
                                "accepting oversized chunk at {:.1}s ({} bytes) at minimum granularity",
                                window.start,
                                chunk.byte_size
                            );
                            return Ok(vec![chunk]);
                        }
                        Ok(chunk) => {
                            log::debug!(
                                "chunk at {:.1}s still overflows at compressed bitrate ({} bytes)",
                                window.start,
                                chunk.byte_size
                            );
                            chunk.remove();
                        }
                        Err(e @ ChunkError::ExtractionFailed { .. }) => {
                            log::warn!("compressed-tier extraction failed, escalating: {e}");
                            last_failure = Some(e);
                        }
                        Err(e) => return Err(e),
                    }
                }
                EscalationTier::Subdivide => {
                    if window.duration <= self.config.min_window_seconds {
                        // Both extraction tiers failed on a window that
                        // cannot shrink further.
                        return Err(last_failure.unwrap_or(ChunkError::ExtractionFailed {
                            path: source.display().to_string(),
                            reason: "window at minimum granularity produced no artifact"
                                .to_string(),
                        }));
                    }
                    let sub_duration = if window.duration > self.config.subdivide_seconds {
                        self.config.subdivide_seconds
                    } else {
                        self.config.min_window_seconds
                    };
                    log::info!(
                        "subdividing window at {:.1}s ({:.1}s) into {:.1}s sub-windows",
                        window.start,
                        window.duration,
                        sub_duration
                    );
                    let mut chunks = Vec::new();
                    for sub in window.subdivide(sub_duration) {
                        chunks.extend(self.ensure_within_budget(source, sub)?);
                    }
                    return Ok(chunks);
                }
            }
        }

        unreachable!("subdivision tier always returns")
    }
}
