//! crates/knowledge_hub_core/src/controller.rs
//!
//! The session controller: the single owner of the credential, the loaded
//! document, the in-flight operation flags and the synthetic upload progress.
//!
//! Every operation is an `async fn(&self)` on a cheaply cloneable handle. The
//! state lock is never held across a backend call; instead each call captures
//! the session and document epochs before it goes out and compares them when
//! the response comes back, so a response that outlived a logout or dismiss is
//! dropped instead of applied.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    Credential, Document, Flashcard, NewDocument, PendingOperation, PendingOperations,
    ReviewOutcome, ReviewState, SessionPhase, UploadFile, SEARCH_FAILED_TEXT,
};
use crate::error::{ControllerError, ControllerResult, ValidationError};
use crate::ports::{BackendService, NullObserver, PortError, SessionEvent, SessionObserver};
use crate::progress::{self, ProgressStage};

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_REVIEW_EXIT_DELAY: Duration = Duration::from_millis(300);
const UPLOAD_FAILED_NOTICE: &str = "Upload failed. Check that the backend is running.";
const INVALID_KEY_NOTICE: &str = "Invalid API key";

//=========================================================================================
// Options and Snapshot
//=========================================================================================

/// Explicit context for one controller instance.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// When false, uploads and searches are allowed without a credential.
    pub require_auth: bool,
    pub max_upload_bytes: u64,
    /// Sent with uploads when the caller does not choose a model.
    pub default_model: Option<String>,
    /// How long a reviewed flashcard stays visible before it is removed.
    pub review_exit_delay: Duration,
    pub progress_schedule: Vec<ProgressStage>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            require_auth: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_model: None,
            review_exit_delay: DEFAULT_REVIEW_EXIT_DELAY,
            progress_schedule: progress::default_schedule(),
        }
    }
}

/// A read-only copy of the controller state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub authenticated: bool,
    pub session_id: Option<Uuid>,
    pub document: Option<Document>,
    pub pending: PendingOperations,
    pub progress_label: Option<String>,
    pub progress_history: Vec<String>,
    pub search_text: Option<String>,
    pub flipped_card: Option<u64>,
}

//=========================================================================================
// Internal State
//=========================================================================================

/// The synthetic progress of the one upload allowed at a time.
struct ActiveProgress {
    upload_id: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct ControllerState {
    authenticated: bool,
    credential: Option<Credential>,
    session_id: Option<Uuid>,
    document: Option<Document>,
    pending: PendingOperations,
    progress: Option<ActiveProgress>,
    progress_label: Option<String>,
    progress_history: Vec<String>,
    search_text: Option<String>,
    flipped_card: Option<u64>,
    /// Bumped on logout.
    session_epoch: u64,
    /// Bumped on logout and dismiss.
    document_epoch: u64,
    next_upload_id: u64,
    next_card_id: u64,
}

impl ControllerState {
    fn epochs(&self) -> (u64, u64) {
        (self.session_epoch, self.document_epoch)
    }

    fn phase(&self, require_auth: bool) -> SessionPhase {
        if require_auth && !self.authenticated {
            SessionPhase::Unauthenticated
        } else if self.document.is_some() {
            SessionPhase::DocumentLoaded
        } else {
            SessionPhase::NoDocument
        }
    }

    /// Stops the ticker of `upload_id` (if it is still the active one) and
    /// forgets every stage it produced.
    fn end_progress(&mut self, upload_id: u64) {
        if matches!(&self.progress, Some(active) if active.upload_id == upload_id) {
            self.clear_progress();
        }
    }

    /// Forgets the credential and everything loaded under it, and retires
    /// every response still in flight. Returns the id of the ended session.
    fn reset_session(&mut self) -> Option<Uuid> {
        let ended = self.session_id.take();
        self.authenticated = false;
        self.credential = None;
        self.document = None;
        self.search_text = None;
        self.flipped_card = None;
        self.clear_progress();
        self.session_epoch += 1;
        self.document_epoch += 1;
        ended
    }

    fn clear_progress(&mut self) {
        if let Some(active) = self.progress.take() {
            active.token.cancel();
        }
        self.progress_label = None;
        self.progress_history.clear();
    }

    fn adopt_document(&mut self, new_doc: NewDocument) -> Document {
        let flashcards = new_doc
            .flashcards
            .into_iter()
            .map(|card| {
                self.next_card_id += 1;
                Flashcard {
                    id: self.next_card_id,
                    question: card.question,
                    answer: card.answer,
                    review_state: ReviewState::Unset,
                }
            })
            .collect();

        let document = Document {
            filename: new_doc.filename,
            summary: new_doc.summary,
            chunk_count: new_doc.chunk_count,
            flashcards,
            model_used: new_doc.model_used,
            loaded_at: Utc::now(),
        };
        self.flipped_card = None;
        self.document = Some(document.clone());
        document
    }
}

struct Inner {
    backend: Arc<dyn BackendService>,
    observer: Arc<dyn SessionObserver>,
    options: ControllerOptions,
    state: Mutex<ControllerState>,
}

//=========================================================================================
// The Controller
//=========================================================================================

/// Drives one client session. Clones share the same state.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn BackendService>,
        observer: Arc<dyn SessionObserver>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                observer,
                options,
                state: Mutex::new(ControllerState::default()),
            }),
        }
    }

    /// A controller with default options that reports to nobody.
    pub fn headless(backend: Arc<dyn BackendService>) -> Self {
        Self::new(backend, Arc::new(NullObserver), ControllerOptions::default())
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.inner.options
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock().await;
        SessionSnapshot {
            phase: state.phase(self.inner.options.require_auth),
            authenticated: state.authenticated,
            session_id: state.session_id,
            document: state.document.clone(),
            pending: state.pending,
            progress_label: state.progress_label.clone(),
            progress_history: state.progress_history.clone(),
            search_text: state.search_text.clone(),
            flipped_card: state.flipped_card,
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        let state = self.inner.state.lock().await;
        state.phase(self.inner.options.require_auth)
    }

    fn notify(&self, event: SessionEvent) {
        self.inner.observer.on_event(event);
    }

    /// Logs a failure, shows it to the user and hands it back to the caller.
    fn reject(&self, err: ControllerError) -> ControllerError {
        warn!("Operation rejected: {}", err);
        self.notify(SessionEvent::Notice {
            message: err.to_string(),
        });
        err
    }

    //=====================================================================================
    // Authentication
    //=====================================================================================

    /// Validates `credential` with the backend and, if accepted, keeps it for
    /// every later protected call.
    pub async fn authenticate(&self, credential: Credential) -> ControllerResult<()> {
        if credential.is_blank() {
            return Err(self.reject(ValidationError::EmptyCredential.into()));
        }

        let epochs = {
            let mut state = self.inner.state.lock().await;
            if !state.pending.begin(PendingOperation::Authenticating) {
                drop(state);
                return Err(self.reject(
                    ValidationError::OperationInProgress(PendingOperation::Authenticating).into(),
                ));
            }
            state.epochs()
        };

        info!("Validating API key with backend.");
        let result = self.inner.backend.validate_key(&credential).await;

        let mut state = self.inner.state.lock().await;
        state.pending.finish(PendingOperation::Authenticating);
        if state.epochs() != epochs {
            info!("Discarding key validation response: session ended while it was in flight.");
            return Err(ControllerError::Discarded);
        }

        match result {
            Ok(()) => {
                let session_id = Uuid::new_v4();
                state.authenticated = true;
                state.credential = Some(credential);
                state.session_id = Some(session_id);
                drop(state);
                info!("Session {} authenticated.", session_id);
                self.notify(SessionEvent::Authenticated);
                Ok(())
            }
            Err(err) => {
                // A failed login never leaves an earlier session active.
                if state.authenticated {
                    if let Some(session_id) = state.reset_session() {
                        info!("Session {} ended by a failed login.", session_id);
                    }
                }
                drop(state);
                let err = match err {
                    PortError::Status { detail, .. } => ControllerError::Auth(
                        detail.unwrap_or_else(|| INVALID_KEY_NOTICE.to_string()),
                    ),
                    other => other.into(),
                };
                Err(self.reject(err))
            }
        }
    }

    /// Forgets the credential and the document. Purely local.
    pub async fn logout(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(session_id) = state.reset_session() {
            info!("Session {} logged out.", session_id);
        }
        drop(state);
        self.notify(SessionEvent::LoggedOut);
    }

    //=====================================================================================
    // Documents
    //=====================================================================================

    fn validate_file(&self, file: &UploadFile) -> Result<(), ValidationError> {
        if !file.is_pdf() {
            return Err(ValidationError::NotPdf {
                filename: file.filename.clone(),
                content_type: file.content_type.clone(),
            });
        }
        if file.bytes.is_empty() {
            return Err(ValidationError::EmptyFile);
        }
        let limit = self.inner.options.max_upload_bytes;
        if file.size() > limit {
            return Err(ValidationError::FileTooLarge {
                size: file.size(),
                limit,
            });
        }
        Ok(())
    }

    /// Uploads `file` for processing and, on success, makes the result the
    /// current document.
    pub async fn upload_document(
        &self,
        file: UploadFile,
        model_choice: Option<String>,
    ) -> ControllerResult<Document> {
        if let Err(err) = self.validate_file(&file) {
            return Err(self.reject(err.into()));
        }

        let (credential, epochs, upload_id, token) = {
            let mut state = self.inner.state.lock().await;
            if self.inner.options.require_auth && !state.authenticated {
                drop(state);
                return Err(self.reject(ValidationError::NotAuthenticated.into()));
            }
            if !state.pending.begin(PendingOperation::Uploading) {
                drop(state);
                return Err(self.reject(
                    ValidationError::OperationInProgress(PendingOperation::Uploading).into(),
                ));
            }
            state.next_upload_id += 1;
            let upload_id = state.next_upload_id;
            let token = CancellationToken::new();
            state.clear_progress();
            state.progress = Some(ActiveProgress {
                upload_id,
                token: token.clone(),
            });
            (state.credential.clone(), state.epochs(), upload_id, token)
        };

        // Stops the ticker on every exit path, including this future being dropped.
        let _ticker_guard = token.clone().drop_guard();
        let controller = self.clone();
        progress::spawn_ticker(
            self.inner.options.progress_schedule.clone(),
            token,
            move |label| {
                let controller = controller.clone();
                async move { controller.apply_stage(upload_id, label).await }
            },
        );

        let model = model_choice.or_else(|| self.inner.options.default_model.clone());
        info!(
            "Uploading '{}' ({} bytes, model: {}).",
            file.filename,
            file.size(),
            model.as_deref().unwrap_or("backend default")
        );
        let result = self
            .inner
            .backend
            .upload(&file, model.as_deref(), credential.as_ref())
            .await;

        let mut state = self.inner.state.lock().await;
        state.pending.finish(PendingOperation::Uploading);
        state.end_progress(upload_id);
        if state.epochs() != epochs {
            info!("Discarding upload response for '{}': context changed.", file.filename);
            return Err(ControllerError::Discarded);
        }

        match result {
            Ok(new_doc) => {
                let document = state.adopt_document(new_doc);
                drop(state);
                info!(
                    "Loaded '{}': {} chunks, {} flashcards.",
                    document.filename,
                    document.chunk_count,
                    document.flashcards.len()
                );
                self.notify(SessionEvent::DocumentLoaded {
                    filename: document.filename.clone(),
                });
                Ok(document)
            }
            Err(err) => {
                drop(state);
                error!("Upload of '{}' failed: {}", file.filename, err);
                self.notify(SessionEvent::Notice {
                    message: UPLOAD_FAILED_NOTICE.to_string(),
                });
                Err(err.into())
            }
        }
    }

    async fn apply_stage(&self, upload_id: u64, label: String) {
        let mut state = self.inner.state.lock().await;
        let current = matches!(
            &state.progress,
            Some(active) if active.upload_id == upload_id && !active.token.is_cancelled()
        );
        if !current {
            return;
        }
        debug!("Upload {} progress: {}", upload_id, label);
        state.progress_label = Some(label.clone());
        state.progress_history.push(label.clone());
        drop(state);
        self.notify(SessionEvent::ProgressStage { label });
    }

    /// Drops the current document and returns to the pre-upload state.
    pub async fn dismiss_document(&self) {
        let mut state = self.inner.state.lock().await;
        state.document_epoch += 1;
        state.flipped_card = None;
        let dismissed = state.document.take();
        drop(state);
        if let Some(document) = dismissed {
            info!("Dismissed '{}'.", document.filename);
            self.notify(SessionEvent::DocumentDismissed);
        }
    }

    //=====================================================================================
    // Search
    //=====================================================================================

    /// Queries the backend. An empty query does nothing and yields `None`.
    ///
    /// A failed request publishes [`SEARCH_FAILED_TEXT`] as the result, so the
    /// returned text alone does not tell a failure from an empty answer.
    pub async fn search(&self, query_text: &str) -> ControllerResult<Option<String>> {
        let query = query_text.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let (credential, epochs) = {
            let mut state = self.inner.state.lock().await;
            if self.inner.options.require_auth && !state.authenticated {
                drop(state);
                return Err(self.reject(ValidationError::NotAuthenticated.into()));
            }
            if !state.pending.begin(PendingOperation::Searching) {
                drop(state);
                return Err(self.reject(
                    ValidationError::OperationInProgress(PendingOperation::Searching).into(),
                ));
            }
            (state.credential.clone(), state.epochs())
        };

        info!("Searching for '{}'.", query);
        let result = self.inner.backend.search(query, credential.as_ref()).await;

        let mut state = self.inner.state.lock().await;
        state.pending.finish(PendingOperation::Searching);
        if state.epochs() != epochs {
            info!("Discarding search response: context changed.");
            return Err(ControllerError::Discarded);
        }

        let text = match result {
            Ok(reply) => reply.into_display_text(),
            Err(err) => {
                error!("Search failed: {}", err);
                SEARCH_FAILED_TEXT.to_string()
            }
        };
        state.search_text = Some(text.clone());
        drop(state);
        self.notify(SessionEvent::SearchResult { text: text.clone() });
        Ok(Some(text))
    }

    //=====================================================================================
    // Flashcards
    //=====================================================================================

    /// Records the user's judgement on the card at `index` and removes the card
    /// once its exit delay has passed. Nothing is sent to the backend.
    pub async fn review_flashcard(
        &self,
        index: usize,
        outcome: ReviewOutcome,
    ) -> ControllerResult<()> {
        let card_id = {
            let mut state = self.inner.state.lock().await;
            let marked = state
                .document
                .as_mut()
                .and_then(|doc| doc.flashcards.get_mut(index))
                .map(|card| {
                    card.review_state = outcome.into();
                    card.id
                });
            let Some(card_id) = marked else {
                drop(state);
                return Err(self.reject(ValidationError::NoSuchFlashcard(index).into()));
            };
            card_id
        };

        debug!("Flashcard {} marked {:?}.", card_id, outcome);
        self.notify(SessionEvent::FlashcardExiting { id: card_id });

        let controller = self.clone();
        let delay = self.inner.options.review_exit_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.remove_flashcard(card_id).await;
        });
        Ok(())
    }

    async fn remove_flashcard(&self, card_id: u64) {
        let mut state = self.inner.state.lock().await;
        let Some(document) = state.document.as_mut() else {
            return;
        };
        let before = document.flashcards.len();
        document.flashcards.retain(|card| card.id != card_id);
        if document.flashcards.len() == before {
            return;
        }
        if state.flipped_card == Some(card_id) {
            state.flipped_card = None;
        }
        drop(state);
        self.notify(SessionEvent::FlashcardRemoved { id: card_id });
    }

    /// Shows the answer of the card at `index`, or hides it if it was showing.
    /// Returns whether the card is now flipped.
    pub async fn flip_flashcard(&self, index: usize) -> ControllerResult<bool> {
        let mut state = self.inner.state.lock().await;
        let card_id = state
            .document
            .as_ref()
            .and_then(|doc| doc.flashcards.get(index))
            .map(|card| card.id);
        let Some(card_id) = card_id else {
            drop(state);
            return Err(self.reject(ValidationError::NoSuchFlashcard(index).into()));
        };

        if state.flipped_card == Some(card_id) {
            state.flipped_card = None;
            Ok(false)
        } else {
            state.flipped_card = Some(card_id);
            Ok(true)
        }
    }
}

//=========================================================================================
// Tests
//=========================================================================================
