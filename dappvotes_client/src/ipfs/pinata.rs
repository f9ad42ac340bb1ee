//! Pinata pinning API client
//!
//! Uploads go to `pinFileToIPFS` as a multipart body with a single `file`
//! field. Every failure is logged and folded into a tagged outcome so callers
//! only ever branch on the result; there is no retry.

use super::{FetchOutcome, FileUpload, ImageUploader, UploadOutcome, FETCH_FAILED, UPLOAD_FAILED};
use crate::config::{ConfigError, PinataConfig};
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const PIN_FILE_PATH: &str = "/pinning/pinFileToIPFS";

/// Response body of `pinFileToIPFS`
#[derive(Debug, Deserialize)]
struct PinFileResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pin_size: Option<u64>,
}

/// Pinata API client
pub struct PinataClient {
    client: Client,
    config: PinataConfig,
}

impl PinataClient {
    pub fn new(config: PinataConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(PinataConfig::from_env()?)
    }

    /// Public URL of pinned content
    pub fn gateway_url(&self, ipfs_hash: &str) -> String {
        format!("{}/ipfs/{}", self.config.gateway_url, ipfs_hash)
    }

    /// Pin a file and return its gateway URL
    pub async fn upload_file(&self, file: FileUpload) -> UploadOutcome {
        match self.pin_file(file).await {
            Ok(response) => {
                info!(
                    "Pinned {} ({} bytes)",
                    response.ipfs_hash,
                    response.pin_size.unwrap_or_default()
                );
                UploadOutcome::Uploaded {
                    pinata_url: self.gateway_url(&response.ipfs_hash),
                    ipfs_hash: response.ipfs_hash,
                }
            }
            Err(e) => {
                error!("Error uploading to IPFS: {}", e);
                UploadOutcome::Failed {
                    error: UPLOAD_FAILED.to_string(),
                }
            }
        }
    }

    async fn pin_file(&self, file: FileUpload) -> Result<PinFileResponse, String> {
        let url = format!("{}{}", self.config.api_url, PIN_FILE_PATH);
        debug!("Uploading {} ({} bytes) to {}", file.file_name, file.len(), url);

        let mut part = multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| format!("Invalid content type {}: {}", content_type, e))?;
        }
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .header("pinata_api_key", &self.config.api_key)
            .header("pinata_secret_api_key", &self.config.secret_api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Pinata returned {}: {}", status, body));
        }

        response
            .json::<PinFileResponse>()
            .await
            .map_err(|e| format!("Failed to parse Pinata response: {}", e))
    }

    /// Download pinned content through the gateway
    pub async fn get_file(&self, ipfs_hash: &str) -> FetchOutcome {
        let url = self.gateway_url(ipfs_hash);

        let result = async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| format!("Request failed: {}", e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(format!("Gateway returned {}", status));
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| format!("Failed to read body: {}", e))
        }
        .await;

        match result {
            Ok(data) => FetchOutcome::Fetched { data },
            Err(e) => {
                error!("Error fetching from IPFS: {}", e);
                FetchOutcome::Failed {
                    error: FETCH_FAILED.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl ImageUploader for PinataClient {
    async fn upload_file(&self, file: FileUpload) -> UploadOutcome {
        PinataClient::upload_file(self, file).await
    }
}
