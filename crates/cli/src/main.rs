use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use videoscribe_core::media::infrastructure::ffmpeg_engine::FfmpegEngine;
use videoscribe_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use videoscribe_core::pipeline::transcribe_video_use_case::{AsyncBackend, TranscribeVideoUseCase};
use videoscribe_core::recognition::infrastructure::http_object_store::HttpObjectStore;
use videoscribe_core::recognition::infrastructure::speechkit_async_recognizer::SpeechkitAsyncRecognizer;
use videoscribe_core::recognition::infrastructure::speechkit_sync_recognizer::SpeechkitSyncRecognizer;
use videoscribe_core::shared::config::TranscribeConfig;

/// Speech transcription for video and audio files.
#[derive(Parser)]
#[command(name = "videoscribe")]
struct Cli {
    /// Input video or audio file.
    input: PathBuf,

    /// Recognition language tag.
    #[arg(long, default_value = "ru-RU")]
    language: String,

    /// SpeechKit API key (falls back to SPEECHKIT_API_KEY).
    #[arg(long)]
    api_key: Option<String>,

    /// Cloud folder id (falls back to SPEECHKIT_FOLDER_ID).
    #[arg(long)]
    folder_id: Option<String>,

    /// Object storage bucket; enables the long-running recognition path.
    #[arg(long)]
    bucket: Option<String>,

    /// Object storage endpoint.
    #[arg(long, default_value = "https://storage.yandexcloud.net")]
    storage_endpoint: String,

    /// Authorization header value for object storage requests
    /// (falls back to STORAGE_TOKEN).
    #[arg(long)]
    storage_token: Option<String>,

    /// Wall-clock budget for a long-running job, in seconds.
    #[arg(long, default_value = "600")]
    max_wait_secs: u64,

    /// Skip the long-running path even when a bucket is configured.
    #[arg(long)]
    sync_only: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let api_key = from_flag_or_env(&cli.api_key, "SPEECHKIT_API_KEY")
        .ok_or("API key is required: pass --api-key or set SPEECHKIT_API_KEY")?;
    let folder_id = from_flag_or_env(&cli.folder_id, "SPEECHKIT_FOLDER_ID")
        .ok_or("Folder id is required: pass --folder-id or set SPEECHKIT_FOLDER_ID")?;

    let config = TranscribeConfig {
        language: cli.language.clone(),
        max_poll_wait: Duration::from_secs(cli.max_wait_secs),
        ..TranscribeConfig::default()
    };

    let async_backend = build_async_backend(&cli, &api_key, &folder_id)?;
    let mut use_case = TranscribeVideoUseCase::new(
        Box::new(FfmpegEngine::new()),
        Box::new(SpeechkitSyncRecognizer::new(api_key, folder_id)),
        async_backend,
        config,
        Box::new(StdoutPipelineLogger::new()),
    );

    let transcript = use_case.execute(&cli.input)?;
    log::info!("Transcription complete ({} chars)", transcript.len());
    println!("{transcript}");
    Ok(())
}

fn build_async_backend(
    cli: &Cli,
    api_key: &str,
    folder_id: &str,
) -> Result<Option<AsyncBackend>, Box<dyn std::error::Error>> {
    if cli.sync_only {
        return Ok(None);
    }
    let Some(bucket) = cli.bucket.clone() else {
        return Ok(None);
    };
    let token = from_flag_or_env(&cli.storage_token, "STORAGE_TOKEN")
        .ok_or("--bucket requires --storage-token or STORAGE_TOKEN")?;

    Ok(Some(AsyncBackend {
        recognizer: Box::new(SpeechkitAsyncRecognizer::new(
            api_key.to_string(),
            folder_id.to_string(),
        )),
        store: Box::new(HttpObjectStore::new(
            cli.storage_endpoint.clone(),
            bucket,
            token,
        )),
    }))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.max_wait_secs == 0 {
        return Err("Max wait must be a positive number of seconds".into());
    }
    if cli.language.is_empty() {
        return Err("Language tag must not be empty".into());
    }
    Ok(())
}

fn from_flag_or_env(flag: &Option<String>, var: &str) -> Option<String> {
    flag.clone()
        .or_else(|| std::env::var(var).ok())
        .filter(|v| !v.is_empty())
}
