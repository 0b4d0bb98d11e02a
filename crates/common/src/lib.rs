//! Shared error plumbing and secret-handling helpers used across switchyard crates.

pub mod error;
pub mod redact;

pub use {error::FromMessage, redact::redact_secret};
