//! # Feira Common Library
//!
//! Shared code for the feira backend:
//! - Error type used by configuration and database code
//! - Bootstrap configuration loading
//! - Database initialization and schema migrations

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
