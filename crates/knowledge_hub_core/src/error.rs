//! crates/knowledge_hub_core/src/error.rs
//!
//! Error types surfaced by the session controller.

use crate::domain::PendingOperation;
use crate::ports::PortError;

/// Input the controller refuses before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your API key first")]
    NotAuthenticated,
    #[error("API key must not be empty")]
    EmptyCredential,
    #[error("Only PDF files are supported (got {content_type} for {filename})")]
    NotPdf {
        filename: String,
        content_type: String,
    },
    #[error("The selected file is empty")]
    EmptyFile,
    #[error("File is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("Another {0} is already in progress")]
    OperationInProgress(PendingOperation),
    #[error("No flashcard at position {0}")]
    NoSuchFlashcard(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The backend rejected the credential; the message is shown verbatim.
    #[error("{0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Backend error ({status}){}", detail_suffix(.detail))]
    Backend { status: u16, detail: Option<String> },
    #[error("Unexpected response from backend: {0}")]
    InvalidResponse(String),
    #[error("Could not build request: {0}")]
    InvalidRequest(String),
    /// The response arrived after a logout or dismiss and was dropped.
    #[error("Response discarded because the session changed while it was in flight")]
    Discarded,
}

impl From<PortError> for ControllerError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Network(msg) => ControllerError::Network(msg),
            PortError::Status { status, detail } => ControllerError::Backend { status, detail },
            PortError::Decode(msg) => ControllerError::InvalidResponse(msg),
            PortError::Request(msg) => ControllerError::InvalidRequest(msg),
        }
    }
}

/// A convenience type alias for `Result<T, ControllerError>`.
pub type ControllerResult<T> = Result<T, ControllerError>;

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}
