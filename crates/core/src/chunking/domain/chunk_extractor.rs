use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::chunking::domain::audio_chunk::AudioChunk;
use crate::chunking::domain::chunk_window::ChunkWindow;
use crate::media::domain::media_engine::{MediaEngine, MediaEngineError};
use crate::shared::constants::OGG_MAGIC;

#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("extraction produced an invalid artifact at {path}: {reason}")]
    ExtractionFailed { path: String, reason: String },
    #[error(transparent)]
    Media(#[from] MediaEngineError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cuts bounded audio segments from the source media into the scratch
/// directory.
///
/// Every produced artifact is sanity-checked against the OGG magic
/// signature before it is passed downstream: silent encoder failures have
/// produced corrupt output in practice, and the recognition backend
/// rejects such payloads with an opaque error.
pub struct ChunkExtractor<'a> {
    engine: &'a dyn MediaEngine,
    scratch_dir: PathBuf,
    nonce: AtomicU64,
}

impl<'a> ChunkExtractor<'a> {
    pub fn new(engine: &'a dyn MediaEngine, scratch_dir: PathBuf) -> Self {
        Self {
            engine,
            scratch_dir,
            nonce: AtomicU64::new(0),
        }
    }

    pub fn extract(
        &self,
        source: &Path,
        window: ChunkWindow,
        bitrate: u32,
    ) -> Result<AudioChunk, ChunkError> {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let path = self.scratch_dir.join(format!(
            "chunk_{:.0}_{}_{}.ogg",
            window.start * 1000.0,
            bitrate,
            nonce
        ));

        if let Err(e) =
            self.engine
                .extract_segment(source, &path, window.start, window.duration, bitrate)
        {
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        if let Err(reason) = verify_ogg_header(&path) {
            let _ = fs::remove_file(&path);
            return Err(ChunkError::ExtractionFailed {
                path: path.display().to_string(),
                reason,
            });
        }

        let byte_size = fs::metadata(&path)?.len();
        log::debug!(
            "extracted chunk {} ({byte_size} bytes, {}s at {bitrate} bit/s)",
            path.display(),
            window.duration
        );

        Ok(AudioChunk {
            path,
            window,
            bitrate,
            byte_size,
        })
    }
}

fn verify_ogg_header(path: &Path) -> Result<(), String> {
    let mut file = fs::File::open(path).map_err(|e| e.to_string())?;
    let mut header = [0u8; 4];
    file.read_exact(&mut header)
        .map_err(|_| "file shorter than the OGG header".to_string())?;
    if header != OGG_MAGIC {
        return Err(format!("expected OggS magic, found {header:02x?}"));
    }
    Ok(())
}
