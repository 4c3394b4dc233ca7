use thiserror::Error;

use crate::domain::Stage;
use crate::gateway::GatewayError;

/// Terminal failure of an explain run. Partial results are never returned.
#[derive(Error, Debug)]
pub enum ExplainError {
    #[error(
        "token quota exceeded during {stage}: waiting {wait_secs}s exceeds the {max_wait_secs}s limit"
    )]
    QuotaExceeded { stage: Stage, wait_secs: u64, max_wait_secs: u64 },

    #[error("completion gateway failed during {stage}: {source}")]
    Gateway {
        stage: Stage,
        #[source]
        source: GatewayError,
    },

    #[error("explain run interrupted{}", during(.stage))]
    Interrupted { stage: Option<Stage> },
}

fn during(stage: &Option<Stage>) -> String {
    stage.map(|s| format!(" during {s}")).unwrap_or_default()
}

impl ExplainError {
    /// The call that failed, when known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ExplainError::QuotaExceeded { stage, .. } | ExplainError::Gateway { stage, .. } => {
                Some(*stage)
            }
            ExplainError::Interrupted { stage } => *stage,
        }
    }
}
