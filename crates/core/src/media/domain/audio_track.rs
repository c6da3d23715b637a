use std::path::PathBuf;

/// The extracted audio artifact for one pipeline run.
///
/// Lives in the run's scratch directory and is deleted when the run ends.
#[derive(Clone, Debug)]
pub struct AudioTrack {
    pub source_path: PathBuf,
    pub path: PathBuf,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_seconds: f64,
    pub byte_size: u64,
}

impl AudioTrack {
    pub fn size_mb(&self) -> f64 {
        self.byte_size as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_size_mb() {
        let track = AudioTrack {
            source_path: PathBuf::from("in.mp4"),
            path: PathBuf::from("track.ogg"),
            bitrate: 32_000,
            sample_rate: 16_000,
            channels: 1,
            duration_seconds: 60.0,
            byte_size: 1024 * 1024 * 3 / 2,
        };
        assert_relative_eq!(track.size_mb(), 1.5, epsilon = 0.001);
    }
}
