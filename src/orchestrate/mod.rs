//! Explain-run orchestration.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub mod error;
pub mod explainer;
pub mod progress;

pub use error::ExplainError;
pub use explainer::Explainer;
pub use progress::{Progress, ProgressSink};

/// Handle to an explain run executing on a background task.
pub struct ExplainTask {
    events: mpsc::UnboundedReceiver<Progress>,
    cancel: CancellationToken,
    handle: JoinHandle<Result<String, ExplainError>>,
}

impl ExplainTask {
    pub(crate) fn new(
        events: mpsc::UnboundedReceiver<Progress>,
        cancel: CancellationToken,
        handle: JoinHandle<Result<String, ExplainError>>,
    ) -> Self {
        Self { events, cancel, handle }
    }

    /// Next progress event; `None` once the run has finished.
    pub async fn next_event(&mut self) -> Option<Progress> {
        self.events.recv().await
    }

    /// Interrupt a pending quota wait or in-flight call.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the terminal result.
    pub async fn join(self) -> Result<String, ExplainError> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(ExplainError::Interrupted { stage: None }),
        }
    }
}
