pub mod audio_chunk;
pub mod chunk_extractor;
pub mod chunk_plan;
pub mod chunk_window;
pub mod size_guard;
