//! Payment receipt ingestion
//!
//! Receipts arrive from the order panel as an opaque string: an URL to an
//! already-hosted image, a `data:` URI, or raw base64. `classifier` decides
//! which, `store` decodes and persists the base64 cases under the uploads
//! directory.

pub mod classifier;
pub mod store;

/// Subfolder under the upload root where payment receipts land
pub const RECEIPTS_SUBFOLDER: &str = "comprovantes";

pub use classifier::{classify, Classification};
pub use store::{ReceiptStore, SavedReceipt, StorageError, StoreOutcome};
