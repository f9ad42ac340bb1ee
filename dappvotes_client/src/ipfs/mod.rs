//! Image storage on IPFS through a pinning service

pub mod pinata;

pub use pinata::PinataClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Message returned when an upload fails for any reason
pub const UPLOAD_FAILED: &str = "Failed to upload file to IPFS";
/// Message returned when a gateway fetch fails for any reason
pub const FETCH_FAILED: &str = "Failed to fetch file from IPFS";

/// A file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a file from disk, guessing an image content type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let mut upload = Self::new(file_name, bytes);
        upload.content_type = path
            .extension()
            .and_then(|ext| image_content_type(&ext.to_string_lossy()))
            .map(str::to_string);
        Ok(upload)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn image_content_type(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

/// Result of an upload; failures are values, not errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "OutcomeRecord", try_from = "OutcomeRecord")]
pub enum UploadOutcome {
    Uploaded { ipfs_hash: String, pinata_url: String },
    Failed { error: String },
}

/// JSON shape of an outcome, `success` as a real boolean
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeRecord {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ipfs_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pinata_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<UploadOutcome> for OutcomeRecord {
    fn from(outcome: UploadOutcome) -> Self {
        match outcome {
            UploadOutcome::Uploaded {
                ipfs_hash,
                pinata_url,
            } => OutcomeRecord {
                success: true,
                ipfs_hash: Some(ipfs_hash),
                pinata_url: Some(pinata_url),
                error: None,
            },
            UploadOutcome::Failed { error } => OutcomeRecord {
                success: false,
                ipfs_hash: None,
                pinata_url: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<OutcomeRecord> for UploadOutcome {
    type Error = String;

    fn try_from(record: OutcomeRecord) -> Result<Self, Self::Error> {
        match record {
            OutcomeRecord {
                success: true,
                ipfs_hash: Some(ipfs_hash),
                pinata_url: Some(pinata_url),
                ..
            } => Ok(UploadOutcome::Uploaded {
                ipfs_hash,
                pinata_url,
            }),
            OutcomeRecord { success: true, .. } => {
                Err("successful upload needs ipfsHash and pinataUrl".to_string())
            }
            OutcomeRecord {
                success: false,
                error,
                ..
            } => Ok(UploadOutcome::Failed {
                error: error.unwrap_or_default(),
            }),
        }
    }
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }

    pub fn pinata_url(&self) -> Option<&str> {
        match self {
            UploadOutcome::Uploaded { pinata_url, .. } => Some(pinata_url),
            UploadOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UploadOutcome::Uploaded { .. } => None,
            UploadOutcome::Failed { error } => Some(error),
        }
    }
}

/// Result of a gateway fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched { data: Vec<u8> },
    Failed { error: String },
}

/// Anything that can turn a file into a public URL
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload_file(&self, file: FileUpload) -> UploadOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_outcome_serializes_with_success_tag() {
        let ok = UploadOutcome::Uploaded {
            ipfs_hash: "QmHash".to_string(),
            pinata_url: "https://gw.example/ipfs/QmHash".to_string(),
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], serde_json::Value::Bool(true));
        assert_eq!(json["ipfsHash"], "QmHash");
        assert_eq!(json["pinataUrl"], "https://gw.example/ipfs/QmHash");
        assert!(json.get("error").is_none());

        let failed = UploadOutcome::Failed {
            error: UPLOAD_FAILED.to_string(),
        };
        assert_eq!(failed.error(), Some(UPLOAD_FAILED));
        assert_eq!(failed.pinata_url(), None);
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({ "success": false, "error": UPLOAD_FAILED })
        );
    }

    #[test]
    fn test_upload_outcome_reads_boolean_success() {
        let parsed: UploadOutcome = serde_json::from_value(serde_json::json!({
            "success": true,
            "ipfsHash": "QmHash",
            "pinataUrl": "https://gw.example/ipfs/QmHash",
        }))
        .unwrap();
        assert_eq!(parsed.pinata_url(), Some("https://gw.example/ipfs/QmHash"));

        let failed: UploadOutcome =
            serde_json::from_str(r#"{"success": false, "error": "nope"}"#).unwrap();
        assert_eq!(failed.error(), Some("nope"));

        assert!(serde_json::from_str::<UploadOutcome>(r#"{"success": "true"}"#).is_err());
        assert!(serde_json::from_str::<UploadOutcome>(r#"{"success": true}"#).is_err());
    }

    #[tokio::test]
    async fn test_file_upload_from_path_guesses_image_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.PNG");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let upload = FileUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.file_name, "banner.PNG");
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(upload.len(), 4);
    }
}
