pub mod audio_track;
pub mod media_engine;
