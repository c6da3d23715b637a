use std::fs;
use std::path::Path;

use reqwest::blocking::Client;

use crate::recognition::domain::object_store::{ObjectStore, StorageError};

/// Path-style HTTP object store client for an S3-compatible endpoint.
///
/// Objects are PUT to `<endpoint>/<bucket>/<key>` with a static
/// authorization header; request signing, presigning and bucket policy
/// are the deployment's concern, not this client's. The returned URI is
/// clean (no query parameters) because the recognition backend rejects
/// them.
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
    bucket: String,
    authorization: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: String, bucket: String, authorization: String) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket,
            authorization,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

impl ObjectStore for HttpObjectStore {
    fn upload(&self, local: &Path, key: &str) -> Result<String, StorageError> {
        let bytes = fs::read(local)?;
        let url = self.object_url(key);
        log::info!("uploading {} bytes to {url}", bytes.len());

        let response = self
            .client
            .put(&url)
            .header("Authorization", &self.authorization)
            .header("Content-Type", "audio/ogg")
            .body(bytes)
            .send()
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: format!(
                    "HTTP {status}: {body}; check the storage credentials and the storage.uploader role"
                ),
            });
        }

        Ok(url)
    }

    fn delete(&self, key: &str) {
        let url = self.object_url(key);
        match self
            .client
            .delete(&url)
            .header("Authorization", &self.authorization)
            .send()
        {
            Ok(response) if response.status().is_success() => {
                log::debug!("deleted {url}");
            }
            Ok(response) => {
                log::warn!("delete of {url} returned HTTP {}", response.status());
            }
            Err(e) => {
                log::warn!("delete of {url} failed: {e}");
            }
        }
    }
}
