//! services/client/src/error.rs
//!
//! Defines the primary error type for the client service.

use crate::config::ConfigError;
use knowledge_hub_core::ControllerError;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the session controller.
    #[error("Session error: {0}")]
    Controller(#[from] ControllerError),

    /// Represents an error from the underlying HTTP library (e.g., building the client).
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., reading stdin or a file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
