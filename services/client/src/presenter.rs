//! services/client/src/presenter.rs
//!
//! A plain-text presentation layer for the session controller. Markdown is
//! printed as-is.

use knowledge_hub_core::{
    Document, ReviewState, SessionEvent, SessionObserver, SessionPhase, SessionSnapshot,
};
use std::io::Write;
use std::sync::Mutex;
use tracing::warn;

/// Writes controller events and views as lines of text.
pub struct TerminalPresenter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalPresenter {
    pub fn stdout() -> Self {
        Self::with_writer(std::io::stdout())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn line(&self, text: &str) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{}", text).and_then(|_| out.flush()) {
            warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl SessionObserver for TerminalPresenter {
    fn on_event(&self, event: SessionEvent) {
        if let Some(text) = render_event(&event) {
            self.line(&text);
        }
    }
}

pub fn render_event(event: &SessionEvent) -> Option<String> {
    let text = match event {
        SessionEvent::Authenticated => "Logged in.".to_string(),
        SessionEvent::LoggedOut => "Logged out.".to_string(),
        SessionEvent::ProgressStage { label } => format!("  ... {}", label),
        SessionEvent::DocumentLoaded { filename } => {
            format!("'{}' is ready. Type 'summary' or 'cards'.", filename)
        }
        SessionEvent::DocumentDismissed => "Document closed.".to_string(),
        SessionEvent::SearchResult { text } => format!("\n{}\n", text),
        SessionEvent::FlashcardExiting { .. } => return None,
        SessionEvent::FlashcardRemoved { .. } => "Card removed.".to_string(),
        SessionEvent::Notice { message } => format!("! {}", message),
    };
    Some(text)
}

pub fn render_document(document: &Document) -> String {
    let mut text = format!(
        "{} ({} chunks{})\n\n{}",
        document.filename,
        document.chunk_count,
        document
            .model_used
            .as_deref()
            .map(|model| format!(", {}", model))
            .unwrap_or_default(),
        document.summary.trim_end()
    );
    let remaining = document.unreviewed().count();
    if remaining > 0 {
        text.push_str(&format!("\n\n{} flashcards to review.", remaining));
    }
    text
}

pub fn render_flashcards(document: &Document, flipped: Option<u64>) -> String {
    if document.flashcards.is_empty() {
        return "No flashcards left.".to_string();
    }
    document
        .flashcards
        .iter()
        .enumerate()
        .map(|(i, card)| {
            let mut entry = format!("{}. {}", i + 1, card.question);
            match card.review_state {
                ReviewState::Mastered => entry.push_str("  [mastered]"),
                ReviewState::Skipped => entry.push_str("  [skipped]"),
                ReviewState::Unset => {}
            }
            if flipped == Some(card.id) {
                entry.push_str(&format!("\n   -> {}", card.answer));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_status(snapshot: &SessionSnapshot) -> String {
    let phase = match snapshot.phase {
        SessionPhase::Unauthenticated => "not logged in",
        SessionPhase::NoDocument => "no document",
        SessionPhase::DocumentLoaded => "document loaded",
    };
    let mut lines = vec![format!("Session: {}", phase)];
    if let Some(document) = &snapshot.document {
        lines.push(format!(
            "Document: {} ({} flashcards left)",
            document.filename,
            document.flashcards.len()
        ));
    }
    let pending = snapshot.pending.active();
    if !pending.is_empty() {
        let names: Vec<String> = pending.iter().map(ToString::to_string).collect();
        lines.push(format!("In progress: {}", names.join(", ")));
    }
    if let Some(label) = &snapshot.progress_label {
        lines.push(format!("Upload stage: {}", label));
    }
    lines.join("\n")
}
