//! services/client/src/shell.rs
//!
//! The interactive loop of the `hub` binary: reads commands, hands them to the
//! session controller and prints views through the presenter.
//!
//! Uploads and searches run as background tasks so the prompt keeps accepting
//! commands (for example `status`) while they are in flight.

use crate::adapters::load_upload_file;
use crate::commands::{Command, CommandError, HELP_TEXT};
use crate::error::ClientError;
use crate::presenter::{render_document, render_flashcards, render_status, TerminalPresenter};
use knowledge_hub_core::{Credential, SessionController};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, error};

const NO_DOCUMENT_TEXT: &str = "No document loaded. Use 'upload <path>' first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    controller: SessionController,
    presenter: Arc<TerminalPresenter>,
    background: Vec<JoinHandle<()>>,
}

impl Shell {
    pub fn new(controller: SessionController, presenter: Arc<TerminalPresenter>) -> Self {
        Self {
            controller,
            presenter,
            background: Vec::new(),
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Reads commands until `quit` or end of input, then waits for any upload
    /// or search still in flight.
    pub async fn run<R>(&mut self, input: R) -> Result<(), ClientError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match line.parse::<Command>() {
                Ok(command) => {
                    if self.execute(command).await == Flow::Quit {
                        break;
                    }
                }
                Err(CommandError::Empty) => {}
                Err(e) => self.presenter.line(&e.to_string()),
            }
        }
        self.wait_for_background().await;
        Ok(())
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.background.retain(|handle| !handle.is_finished());
        self.background.push(tokio::spawn(task));
    }

    pub async fn wait_for_background(&mut self) {
        for handle in self.background.drain(..) {
            if let Err(e) = handle.await {
                error!("Background task failed: {}", e);
            }
        }
    }

    /// Runs one command. Controller failures have already been shown to the
    /// user through the presenter, so they are only logged here.
    pub async fn execute(&mut self, command: Command) -> Flow {
        match command {
            Command::Login(key) => {
                if let Err(e) = self.controller.authenticate(Credential::new(key)).await {
                    debug!("Login failed: {}", e);
                }
            }
            Command::Logout => self.controller.logout().await,
            Command::Upload { path, model } => match load_upload_file(&path).await {
                Ok(file) => {
                    let controller = self.controller.clone();
                    self.spawn(async move {
                        if let Err(e) = controller.upload_document(file, model).await {
                            debug!("Upload did not complete: {}", e);
                        }
                    });
                }
                Err(e) => self
                    .presenter
                    .line(&format!("! Cannot read {}: {}", path.display(), e)),
            },
            Command::Search(query) => {
                let controller = self.controller.clone();
                self.spawn(async move {
                    if let Err(e) = controller.search(&query).await {
                        debug!("Search did not complete: {}", e);
                    }
                });
            }
            Command::Summary => {
                let snapshot = self.controller.snapshot().await;
                match &snapshot.document {
                    Some(document) => self.presenter.line(&render_document(document)),
                    None => self.presenter.line(NO_DOCUMENT_TEXT),
                }
            }
            Command::Cards => self.show_cards().await,
            Command::Flip(index) => {
                if self.controller.flip_flashcard(index).await.is_ok() {
                    self.show_cards().await;
                }
            }
            Command::Review { index, outcome } => {
                if let Err(e) = self.controller.review_flashcard(index, outcome).await {
                    debug!("Review failed: {}", e);
                }
            }
            Command::Dismiss => self.controller.dismiss_document().await,
            Command::Status => {
                let snapshot = self.controller.snapshot().await;
                self.presenter.line(&render_status(&snapshot));
            }
            Command::Help => self.presenter.line(HELP_TEXT),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    async fn show_cards(&self) {
        let snapshot = self.controller.snapshot().await;
        match &snapshot.document {
            Some(document) => self
                .presenter
                .line(&render_flashcards(document, snapshot.flipped_card)),
            None => self.presenter.line(NO_DOCUMENT_TEXT),
        }
    }
}
