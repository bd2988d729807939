//! Receipt persistence
//!
//! Decodes classified base64 payloads and writes them once under the
//! configured upload root. URLs and unrecognized values pass through
//! verbatim so re-submitting an already-stored receipt is idempotent.

use crate::receipts::classifier::{self, Classification};
use base64::{engine::general_purpose, Engine as _};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// Receipt storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The payload looked like base64 but did not decode
    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Directory creation or file write failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What `store` did with a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Input was already a URL, or an opaque value this system does not
    /// interpret; returned unchanged
    PassThrough(String),
    /// Payload was decoded and written to disk
    Saved(SavedReceipt),
}

/// A receipt written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReceipt {
    /// Relative URL of the stored file (`/uploads/<subfolder>/<id><ext>`)
    pub url: String,
    /// MIME type, declared or sniffed
    pub mime: String,
    /// Decoded size in bytes
    pub size: usize,
}

impl StoreOutcome {
    /// The value to record for the order, however the payload was handled
    pub fn stored_value(&self) -> &str {
        match self {
            StoreOutcome::PassThrough(value) => value,
            StoreOutcome::Saved(receipt) => &receipt.url,
        }
    }
}

/// Writes classified receipt payloads under a configured upload root
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    upload_root: PathBuf,
}

impl ReceiptStore {
    /// Create a store rooted at `upload_root`; the directory itself is
    /// created lazily on first write
    pub fn new(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
        }
    }

    /// Root directory receipts are written under
    pub fn upload_root(&self) -> &std::path::Path {
        &self.upload_root
    }

    /// Classify, decode, and persist a receipt payload.
    ///
    /// URLs (including paths under `/uploads/`) and unrecognized values are
    /// passed through unchanged. Base64 payloads are decoded in full and
    /// written with a single full-buffer write; a crash mid-write can leave
    /// a truncated file behind, an accepted limitation of this subsystem.
    pub async fn store(
        &self,
        payload: &str,
        subfolder: &str,
    ) -> Result<StoreOutcome, StorageError> {
        let (mime, data) = match classifier::classify(payload) {
            Classification::PassThroughUrl | Classification::Unrecognized => {
                return Ok(StoreOutcome::PassThrough(payload.to_string()));
            }
            Classification::DataUri { mime, data } => {
                // Data URI payloads may still carry soft wrapping
                (mime, classifier::strip_wrapping(&data))
            }
            Classification::RawBase64 { mime, data } => (mime, data),
        };

        let bytes = general_purpose::STANDARD.decode(data.as_bytes())?;

        let file_id = Uuid::new_v4();
        let extension = extension_for_mime(&mime);
        let filename = format!("{}{}", file_id, extension);

        let dir = self.upload_root.join(subfolder);
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&filename), &bytes).await?;

        info!(
            filename = %filename,
            size = bytes.len(),
            mime = %mime,
            "Stored receipt file"
        );

        Ok(StoreOutcome::Saved(SavedReceipt {
            url: format!("/uploads/{}/{}", subfolder, filename),
            mime,
            size: bytes.len(),
        }))
    }
}

/// File extension for a MIME type; unknown types get a generic binary
/// extension rather than failing
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => ".png",
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/gif" => ".gif",
        "application/pdf" => ".pdf",
        _ => ".bin",
    }
}
