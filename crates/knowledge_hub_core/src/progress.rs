//! crates/knowledge_hub_core/src/progress.rs
//!
//! The synthetic progress indicator shown while an upload is in flight.
//!
//! The backend reports no real progress, so the stages below are emitted on a
//! fixed wall-clock schedule. All stages of one upload run inside a single task
//! tied to a `CancellationToken`; cancelling the token stops the remaining
//! stages.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One label and the delay after the upload starts at which it is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStage {
    pub offset: Duration,
    pub label: String,
}

impl ProgressStage {
    pub fn new(offset_ms: u64, label: impl Into<String>) -> Self {
        Self {
            offset: Duration::from_millis(offset_ms),
            label: label.into(),
        }
    }
}

pub fn default_schedule() -> Vec<ProgressStage> {
    vec![
        ProgressStage::new(0, "Uploading document..."),
        ProgressStage::new(800, "Extracting text..."),
        ProgressStage::new(1800, "Analyzing content..."),
        ProgressStage::new(3000, "Generating summary and flashcards..."),
    ]
}

/// Spawns the task that walks `schedule`, calling `on_stage` for every stage
/// whose time comes before `token` is cancelled.
///
/// `on_stage` must itself re-check the token under whatever lock guards the
/// state it writes, since cancellation can race with a stage becoming due.
pub fn spawn_ticker<F, Fut>(
    schedule: Vec<ProgressStage>,
    token: CancellationToken,
    mut on_stage: F,
) -> JoinHandle<()>
where
    F: FnMut(String) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let started = Instant::now();
    tokio::spawn(async move {
        for stage in schedule {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Progress ticker cancelled before '{}'.", stage.label);
                    return;
                }
                _ = tokio::time::sleep_until(started + stage.offset) => {}
            }
            if token.is_cancelled() {
                return;
            }
            on_stage(stage.label).await;
        }
    })
}
