//! Progress events emitted while an explain run is in flight.

use tokio::sync::mpsc;

use crate::domain::Stage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The input was estimated and split; `calls` completion calls will follow.
    Planned { estimated_tokens: usize, calls: usize },
    /// The budget is exhausted; the run sleeps before calling.
    Waiting { stage: Stage, seconds: u64 },
    /// Quota is available and the call is being sent.
    Admitted { stage: Stage, estimated_tokens: usize },
    /// The call returned successfully.
    Completed { stage: Stage },
}

/// Sending half of the progress channel. Events are dropped once the receiver
/// is gone, so reporting never fails a run.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<Progress>>,
}

impl ProgressSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Progress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: Progress) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
