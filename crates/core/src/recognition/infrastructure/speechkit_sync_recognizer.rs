use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::recognition::domain::recognition_error::RecognitionError;
use crate::recognition::domain::sync_recognizer::SyncRecognizer;

const DEFAULT_BASE_URL: &str = "https://stt.api.cloud.yandex.net/speech/v1/stt:recognize";

/// Generous timeout: the backend processes the whole payload before
/// responding.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Deserialize)]
struct RecognizeResponse {
    result: Option<String>,
}

/// Synchronous SpeechKit v1 recognition over HTTP multipart.
///
/// The payload goes in a `data` part as `audio/ogg; codecs=opus`, with
/// `topic` and `lang` fields alongside. Requests over ~1 MiB are rejected
/// by the backend; that rejection maps to `SizeExceeded` so the caller
/// can escalate instead of retrying a doomed request.
pub struct SpeechkitSyncRecognizer {
    client: Client,
    api_key: String,
    folder_id: String,
    base_url: String,
}

impl SpeechkitSyncRecognizer {
    pub fn new(api_key: String, folder_id: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            folder_id,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the endpoint, for gateways and tests.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

impl SyncRecognizer for SpeechkitSyncRecognizer {
    fn recognize(&self, audio: &[u8], language: &str) -> Result<String, RecognitionError> {
        let part = multipart::Part::bytes(audio.to_vec())
            .file_name("audio.ogg")
            .mime_str("audio/ogg; codecs=opus")
            .map_err(|e| RecognitionError::Backend(e.to_string()))?;
        let form = multipart::Form::new()
            .part("data", part)
            .text("topic", "general")
            .text("lang", language.to_string());

        log::debug!("sync recognize: {} bytes, lang={language}", audio.len());

        let response = self
            .client
            .post(format!("{}?folderId={}", self.base_url, self.folder_id))
            .header("Authorization", format!("Api-Key {}", self.api_key))
            .timeout(REQUEST_TIMEOUT)
            .multipart(form)
            .send()
            .map_err(|e| RecognitionError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_failure(status, &body, audio.len() as u64));
        }

        let parsed: RecognizeResponse = response
            .json()
            .map_err(|e| RecognitionError::Backend(e.to_string()))?;
        match parsed.result {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(RecognitionError::Backend(
                "backend returned an empty result".to_string(),
            )),
        }
    }
}

fn classify_failure(status: StatusCode, body: &str, payload_bytes: u64) -> RecognitionError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RecognitionError::Auth(format!(
            "HTTP {status}; check the API key, folder id and the speechkit.stt.user role"
        )),
        StatusCode::TOO_MANY_REQUESTS => RecognitionError::RateLimited,
        StatusCode::BAD_REQUEST if body.contains("less than 1 mb") => {
            RecognitionError::SizeExceeded {
                bytes: payload_bytes,
            }
        }
        _ => RecognitionError::Backend(format!("HTTP {status}: {body}")),
    }
}
