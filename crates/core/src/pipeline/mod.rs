pub mod pipeline_logger;
pub mod transcribe_video_use_case;
