/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors surfaced to callers of the proxy subsystem
///
/// Only `NotFound` and `Io` come out of the streaming path in normal
/// operation; the remaining variants cover misuse and startup.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProxyError {
    #[error("Not found: {0}")]
    #[diagnostic(
        code(proxy::not_found),
        help("The proxy reference is unknown or its token has expired. Register the source again.")
    )]
    NotFound(String),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(proxy::io_error),
        help("Both the random-access and the sequential read paths failed for this source.")
    )]
    Io(String),

    #[error("Invalid reference: {0}")]
    #[diagnostic(
        code(proxy::invalid_reference),
        help("References must look like scheme://authority/path or scheme:opaque.")
    )]
    InvalidReference(String),

    #[error("Stream released")]
    #[diagnostic(
        code(proxy::released),
        help("The stream was released. Open the proxy reference again.")
    )]
    Released,

    #[error("Worker unavailable: {0}")]
    #[diagnostic(
        code(proxy::worker_unavailable),
        help("The streaming worker has stopped. Restart the server.")
    )]
    WorkerUnavailable(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(proxy::configuration_error),
        help("Invalid configuration. Review FILE_PROXY_* environment variables.")
    )]
    Configuration(String),
}

impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        ProxyError::Io(err.to_string())
    }
}

/// Conditions that are absorbed locally and only ever logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovered {
    /// A resolver query failed; the field falls back to a degraded value
    MetadataUnavailable,
    /// A single substitution failed; the field is left unmodified
    RewriteSkipped,
}

impl fmt::Display for Recovered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recovered::MetadataUnavailable => f.write_str("metadata_unavailable"),
            Recovered::RewriteSkipped => f.write_str("rewrite_skipped"),
        }
    }
}

/// Serializable error representation for status output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SerializableError {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SerializableError {
    /// Create a new serializable error
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create a new serializable error with details
    pub fn with_details(
        error_type: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

impl From<ProxyError> for SerializableError {
    fn from(err: ProxyError) -> Self {
        let error_type = match &err {
            ProxyError::NotFound(_) => "not_found",
            ProxyError::Io(_) => "io_error",
            ProxyError::InvalidReference(_) => "invalid_reference",
            ProxyError::Released => "released",
            ProxyError::WorkerUnavailable(_) => "worker_unavailable",
            ProxyError::Configuration(_) => "configuration_error",
        };
        SerializableError::new(error_type, err.to_string())
    }
}

/// Result type for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;
