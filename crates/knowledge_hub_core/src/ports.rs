//! crates/knowledge_hub_core/src/ports.rs
//!
//! Defines the service contracts (traits) at the edges of the core.
//! The backend port lets the controller stay independent of any HTTP client,
//! and the observer port lets any presentation layer follow the controller.

use async_trait::async_trait;

use crate::domain::{Credential, NewDocument, SearchReply, UploadFile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// What a backend adapter can report. This abstracts away the errors of the
/// concrete HTTP library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Request failed: {0}")]
    Network(String),
    #[error("Backend returned status {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },
    #[error("Could not decode backend response: {0}")]
    Decode(String),
    /// The request could not be built locally, so nothing was sent.
    #[error("Could not build request: {0}")]
    Request(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The remote document-processing service.
#[async_trait]
pub trait BackendService: Send + Sync {
    /// Asks the backend whether the key is valid. Any 2xx means yes.
    async fn validate_key(&self, credential: &Credential) -> PortResult<()>;

    /// Uploads a file for ingestion, summarization and flashcard generation.
    async fn upload(
        &self,
        file: &UploadFile,
        model: Option<&str>,
        credential: Option<&Credential>,
    ) -> PortResult<NewDocument>;

    /// Runs a semantic query against everything ingested so far.
    async fn search(&self, query: &str, credential: Option<&Credential>)
        -> PortResult<SearchReply>;
}

/// Something the controller tells its presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Authenticated,
    LoggedOut,
    ProgressStage { label: String },
    DocumentLoaded { filename: String },
    DocumentDismissed,
    SearchResult { text: String },
    FlashcardExiting { id: u64 },
    FlashcardRemoved { id: u64 },
    /// A user-visible, non-fatal message (failures, rejected input).
    Notice { message: String },
}

/// A presentation layer. Called synchronously from controller tasks, so
/// implementations should hand work off rather than block.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: SessionEvent);
}

/// An observer that ignores everything.
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn on_event(&self, _event: SessionEvent) {}
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}
