//! Common library for the school access workspace
//!
//! This crate provides shared functionality used by the access library and
//! the API service: backend errors, configuration, retry with backoff and
//! logging initialisation.

pub mod config;
pub mod error;
pub mod retry;
pub mod telemetry;

pub use config::AccessConfig;
pub use error::{BackendError, BackendResult};
pub use retry::{RetryPolicy, with_retry};
