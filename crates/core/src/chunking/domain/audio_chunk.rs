use std::path::PathBuf;

use crate::chunking::domain::chunk_window::ChunkWindow;

/// A materialized audio segment awaiting transcription.
///
/// Always deleted after its transcription attempt, success or failure.
#[derive(Clone, Debug)]
pub struct AudioChunk {
    pub path: PathBuf,
    pub window: ChunkWindow,
    pub bitrate: u32,
    pub byte_size: u64,
}

impl AudioChunk {
    /// Best-effort removal of the backing file.
    pub fn remove(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("failed to remove chunk {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunk.ogg");
        std::fs::write(&path, b"OggS data").unwrap();
        let chunk = AudioChunk {
            path: path.clone(),
            window: ChunkWindow::new(0.0, 5.0),
            bitrate: 24_000,
            byte_size: 9,
        };
        chunk.remove();
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_missing_file_does_not_panic() {
        let chunk = AudioChunk {
            path: PathBuf::from("/nonexistent/chunk.ogg"),
            window: ChunkWindow::new(0.0, 5.0),
            bitrate: 24_000,
            byte_size: 0,
        };
        chunk.remove();
    }
}
