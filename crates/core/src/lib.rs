pub mod chunking;
pub mod media;
pub mod pipeline;
pub mod recognition;
pub mod shared;
