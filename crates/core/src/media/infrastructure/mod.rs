pub mod ffmpeg_engine;
