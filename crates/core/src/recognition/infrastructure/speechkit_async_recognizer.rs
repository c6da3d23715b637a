use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::recognition::domain::async_recognizer::{AsyncRecognizer, JobStatus};
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::shared::constants::SPEECH_SAMPLE_RATE;

const DEFAULT_SUBMIT_URL: &str =
    "https://transcribe.api.cloud.yandex.net/speech/stt/v2/longRunningRecognize";
const DEFAULT_OPERATION_URL: &str = "https://operation.api.cloud.yandex.net/operations";

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    config: SubmitConfig,
    audio: SubmitAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitConfig {
    specification: Specification,
    folder_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Specification {
    language_code: String,
    model: String,
    audio_encoding: String,
    sample_rate_hertz: u32,
}

#[derive(Serialize)]
struct SubmitAudio {
    uri: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Deserialize, Default)]
struct Operation {
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<OperationResult>,
}

#[derive(Deserialize)]
struct OperationError {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Default)]
struct OperationResult {
    #[serde(default)]
    chunks: Vec<ResultChunk>,
}

#[derive(Deserialize)]
struct ResultChunk {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    #[serde(default)]
    text: String,
}

/// Long-running SpeechKit v2 recognition against audio already uploaded
/// to object storage.
pub struct SpeechkitAsyncRecognizer {
    client: Client,
    api_key: String,
    folder_id: String,
    submit_url: String,
    operation_url: String,
}

impl SpeechkitAsyncRecognizer {
    pub fn new(api_key: String, folder_id: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            folder_id,
            submit_url: DEFAULT_SUBMIT_URL.to_string(),
            operation_url: DEFAULT_OPERATION_URL.to_string(),
        }
    }

    /// Override both endpoints, for gateways and tests.
    pub fn with_urls(mut self, submit_url: String, operation_url: String) -> Self {
        self.submit_url = submit_url;
        self.operation_url = operation_url;
        self
    }

    fn auth_header(&self) -> String {
        format!("Api-Key {}", self.api_key)
    }
}

impl AsyncRecognizer for SpeechkitAsyncRecognizer {
    fn submit(&self, audio_uri: &str, language: &str) -> Result<String, RecognitionError> {
        let request = SubmitRequest {
            config: SubmitConfig {
                specification: Specification {
                    language_code: language.to_string(),
                    model: "general".to_string(),
                    audio_encoding: "OGG_OPUS".to_string(),
                    sample_rate_hertz: SPEECH_SAMPLE_RATE,
                },
                folder_id: self.folder_id.clone(),
            },
            audio: SubmitAudio {
                uri: audio_uri.to_string(),
            },
        };

        log::info!("submitting long-running recognition for {audio_uri}");

        let response = self
            .client
            .post(&self.submit_url)
            .header("Authorization", self.auth_header())
            .timeout(SUBMIT_TIMEOUT)
            .json(&request)
            .send()
            .map_err(|e| RecognitionError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let parsed: SubmitResponse = response
            .json()
            .map_err(|e| RecognitionError::Backend(e.to_string()))?;
        log::info!("recognition job submitted: {}", parsed.id);
        Ok(parsed.id)
    }

    fn status(&self, job_id: &str) -> Result<JobStatus, RecognitionError> {
        let response = self
            .client
            .get(format!("{}/{}", self.operation_url, job_id))
            .header("Authorization", self.auth_header())
            .send()
            .map_err(|e| RecognitionError::Backend(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RecognitionError::JobExpired);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let operation: Operation = response
            .json()
            .map_err(|e| RecognitionError::Backend(e.to_string()))?;
        Ok(operation_status(operation))
    }
}

fn classify_failure(status: StatusCode, body: &str) -> RecognitionError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RecognitionError::Auth(format!(
            "HTTP {status}; check the API key and the ai.speechkit-stt.user role"
        )),
        StatusCode::TOO_MANY_REQUESTS => RecognitionError::RateLimited,
        _ => RecognitionError::Backend(format!("HTTP {status}: {body}")),
    }
}

fn operation_status(operation: Operation) -> JobStatus {
    if !operation.done {
        return JobStatus::Pending;
    }
    if let Some(error) = operation.error {
        return JobStatus::Failed(if error.message.is_empty() {
            "unknown backend error".to_string()
        } else {
            error.message
        });
    }
    let segments = operation
        .response
        .unwrap_or_default()
        .chunks
        .into_iter()
        .filter_map(|chunk| chunk.alternatives.into_iter().next().map(|a| a.text))
        .collect();
    JobStatus::Done(segments)
}
