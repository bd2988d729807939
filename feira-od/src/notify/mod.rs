//! Customer notifications over WhatsApp
//!
//! A thin client for the external WhatsApp gateway plus the phone-number
//! normalization it requires and an append-only log of every attempt's
//! outcome. Single best-effort delivery: no retry, no backoff.

pub mod outcome_log;
pub mod phone;
pub mod whatsapp;

pub use outcome_log::OutcomeLog;
pub use phone::normalize_phone;
pub use whatsapp::{NotificationError, NotifyOutcome, WhatsAppClient};
