//! Shared error type.
//!
//! Sub-crates define their own error enums; `CoreError` covers the
//! configuration layer that every run passes through first.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `obs-core`.
pub type CoreResult<T> = Result<T, CoreError>;
