//! crates/knowledge_hub_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs are independent of any HTTP library or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;

/// The only MIME type the backend knows how to ingest.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Shown when a search response carries none of the known result fields.
pub const NO_RESULTS_TEXT: &str = "No relevant information found.";

/// Published as the search result when the search request itself fails.
pub const SEARCH_FAILED_TEXT: &str = "Error searching documents. Please try again.";

//=========================================================================================
// Session
//=========================================================================================

/// The API key used to authenticate against the backend.
///
/// Never printed: both `Debug` and `Display` redact the value so a credential
/// cannot leak into logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// The top-level state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    NoDocument,
    DocumentLoaded,
}

//=========================================================================================
// Documents and Flashcards
//=========================================================================================

/// A file picked by the user for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type.eq_ignore_ascii_case(PDF_MIME_TYPE)
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A question/answer pair exactly as the backend produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFlashcard {
    pub question: String,
    pub answer: String,
}

/// The processed document as returned by the backend, before the controller
/// assigns flashcard ids and takes ownership of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub filename: String,
    pub summary: String,
    pub chunk_count: u32,
    pub flashcards: Vec<NewFlashcard>,
    pub model_used: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Unset,
    Mastered,
    Skipped,
}

/// The user's judgement on a flashcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Mastered,
    Skipped,
}

impl From<ReviewOutcome> for ReviewState {
    fn from(outcome: ReviewOutcome) -> Self {
        match outcome {
            ReviewOutcome::Mastered => ReviewState::Mastered,
            ReviewOutcome::Skipped => ReviewState::Skipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    /// Controller-assigned; stable while indices shift under removals.
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub review_state: ReviewState,
}

/// The single document the client currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub summary: String,
    pub chunk_count: u32,
    pub flashcards: Vec<Flashcard>,
    pub model_used: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

impl Document {
    /// Cards the user has not judged yet.
    pub fn unreviewed(&self) -> impl Iterator<Item = &Flashcard> {
        self.flashcards
            .iter()
            .filter(|card| card.review_state == ReviewState::Unset)
    }
}

//=========================================================================================
// Pending Operations
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingOperation {
    Uploading,
    Searching,
    Authenticating,
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PendingOperation::Uploading => "upload",
            PendingOperation::Searching => "search",
            PendingOperation::Authenticating => "authentication",
        };
        f.write_str(name)
    }
}

/// The set of in-flight operations. At most one of each class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingOperations {
    uploading: bool,
    searching: bool,
    authenticating: bool,
}

impl PendingOperations {
    fn flag_mut(&mut self, op: PendingOperation) -> &mut bool {
        match op {
            PendingOperation::Uploading => &mut self.uploading,
            PendingOperation::Searching => &mut self.searching,
            PendingOperation::Authenticating => &mut self.authenticating,
        }
    }

    pub fn contains(&self, op: PendingOperation) -> bool {
        match op {
            PendingOperation::Uploading => self.uploading,
            PendingOperation::Searching => self.searching,
            PendingOperation::Authenticating => self.authenticating,
        }
    }

    /// Marks `op` as in flight. Returns `false` if it already was.
    pub fn begin(&mut self, op: PendingOperation) -> bool {
        let flag = self.flag_mut(op);
        if *flag {
            return false;
        }
        *flag = true;
        true
    }

    pub fn finish(&mut self, op: PendingOperation) {
        *self.flag_mut(op) = false;
    }

    pub fn is_idle(&self) -> bool {
        !(self.uploading || self.searching || self.authenticating)
    }

    pub fn active(&self) -> Vec<PendingOperation> {
        [
            PendingOperation::Uploading,
            PendingOperation::Searching,
            PendingOperation::Authenticating,
        ]
        .into_iter()
        .filter(|op| self.contains(*op))
        .collect()
    }
}

//=========================================================================================
// Search
//=========================================================================================

/// Every result field a `/search` response may carry. The backend's shape
/// depends on its version, so all three are kept and resolved here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchReply {
    /// `results` when it is an array of strings.
    pub passages: Option<Vec<String>>,
    /// `results` when it is a single string.
    pub text: Option<String>,
    /// The dedicated `answer` field.
    pub answer: Option<String>,
}

impl SearchReply {
    /// Resolves the reply to display text: passages joined by a blank line,
    /// else the single string, else the answer, else [`NO_RESULTS_TEXT`].
    /// Blank values count as absent.
    pub fn into_display_text(self) -> String {
        let passages = self
            .passages
            .filter(|p| p.iter().any(|s| !s.trim().is_empty()))
            .map(|p| p.join("\n\n"));

        passages
            .or(self.text.filter(|s| !s.trim().is_empty()))
            .or(self.answer.filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| NO_RESULTS_TEXT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_is_redacted() {
        let key = Credential::new("sk-secret");
        assert_eq!(format!("{:?}", key), "Credential(***)");
        assert_eq!(key.to_string(), "***");
        assert_eq!(key.expose(), "sk-secret");
    }

    #[test]
    fn pending_operations_allow_one_per_class() {
        let mut pending = PendingOperations::default();
        assert!(pending.is_idle());
        assert!(pending.begin(PendingOperation::Uploading));
        assert!(!pending.begin(PendingOperation::Uploading));
        assert!(pending.begin(PendingOperation::Searching));
        assert_eq!(
            pending.active(),
            vec![PendingOperation::Uploading, PendingOperation::Searching]
        );
        pending.finish(PendingOperation::Uploading);
        pending.finish(PendingOperation::Searching);
        assert!(pending.is_idle());
    }

    #[test]
    fn search_shapes_resolve_to_the_same_text() {
        let from_passages = SearchReply {
            passages: Some(vec!["a".into(), "b".into()]),
            ..Default::default()
        };
        let from_text = SearchReply {
            text: Some("a\n\nb".into()),
            ..Default::default()
        };
        let from_answer = SearchReply {
            answer: Some("a\n\nb".into()),
            ..Default::default()
        };
        assert_eq!(from_passages.into_display_text(), "a\n\nb");
        assert_eq!(from_text.into_display_text(), "a\n\nb");
        assert_eq!(from_answer.into_display_text(), "a\n\nb");
    }

    #[test]
    fn passages_win_over_answer() {
        let reply = SearchReply {
            passages: Some(vec!["passage".into()]),
            text: None,
            answer: Some("answer".into()),
        };
        assert_eq!(reply.into_display_text(), "passage");
    }

    #[test]
    fn missing_or_blank_fields_fall_back() {
        assert_eq!(SearchReply::default().into_display_text(), NO_RESULTS_TEXT);

        let blank = SearchReply {
            passages: Some(vec![]),
            text: Some("  ".into()),
            answer: None,
        };
        assert_eq!(blank.into_display_text(), NO_RESULTS_TEXT);
    }

    #[test]
    fn upload_file_mime_check_ignores_case() {
        let file = UploadFile::new("a.pdf", "Application/PDF", vec![1]);
        assert!(file.is_pdf());
        let file = UploadFile::new("a.txt", "text/plain", vec![1]);
        assert!(!file.is_pdf());
    }
}
