//! Quota-aware single-shot or chunk-and-summarize driver.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::ExplainError;
use super::progress::{Progress, ProgressSink};
use super::ExplainTask;
use crate::chunk::{self, Plan};
use crate::domain::{Config, Stage};
use crate::gateway::CompletionGateway;
use crate::quota::{Admission, QuotaTracker};
use crate::utils::estimate_tokens;

pub type Result<T> = std::result::Result<T, ExplainError>;

/// Drives explain runs against one gateway and one shared quota tracker.
///
/// Cloning is cheap; clones share the gateway and the tracker.
#[derive(Clone)]
pub struct Explainer {
    gateway: Arc<dyn CompletionGateway>,
    quota: Arc<QuotaTracker>,
    config: Arc<Config>,
}

impl Explainer {
    pub fn new(gateway: Arc<dyn CompletionGateway>, quota: Arc<QuotaTracker>, config: Config) -> Self {
        Self { gateway, quota, config: Arc::new(config) }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    /// Explain `text` on the current task without progress reporting.
    pub async fn explain(&self, text: &str) -> Result<String> {
        self.explain_with(text, &ProgressSink::disabled(), &CancellationToken::new()).await
    }

    /// Run the explanation on a background task.
    ///
    /// The returned handle yields progress events, can cancel the run, and
    /// resolves to the final result exactly once.
    pub fn spawn(&self, text: String) -> ExplainTask {
        let (progress, events) = ProgressSink::channel();
        let cancel = CancellationToken::new();
        let explainer = self.clone();
        let token = cancel.clone();
        let handle =
            tokio::spawn(async move { explainer.explain_with(&text, &progress, &token).await });
        ExplainTask::new(events, cancel, handle)
    }

    /// Explain `text`, reporting milestones to `progress`.
    ///
    /// Any quota abort, gateway failure, or cancellation ends the whole run;
    /// digests of chunks already processed are discarded.
    pub async fn explain_with(
        &self,
        text: &str,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let plan = chunk::plan(text, &self.config);
        info!(tokens = plan.token_estimate(), calls = plan.call_count(), "starting explain run");
        progress.emit(Progress::Planned {
            estimated_tokens: plan.token_estimate(),
            calls: plan.call_count(),
        });

        match plan {
            Plan::Single { prompt, .. } => {
                self.admitted_call(Stage::Single, &prompt, progress, cancel).await
            }
            Plan::Chunked { batches, .. } => {
                let total = batches.len();
                let mut digests = Vec::with_capacity(total);
                for batch in &batches {
                    debug!(
                        batch = %batch.id,
                        index = batch.index,
                        lines = batch.line_count(),
                        tokens = batch.token_estimate,
                        "sending batch"
                    );
                    let stage = Stage::Chunk { index: batch.index, total };
                    digests.push(self.admitted_call(stage, &batch.prompt, progress, cancel).await?);
                }

                let summary_prompt = self.summary_prompt(&digests);
                let tokens = estimate_tokens(&summary_prompt);
                if tokens > self.config.per_request_cap {
                    warn!(
                        tokens,
                        cap = self.config.per_request_cap,
                        "summary prompt exceeds the per-request cap; sending it as one request"
                    );
                }
                self.admitted_call(Stage::Final, &summary_prompt, progress, cancel).await
            }
        }
    }

    fn summary_prompt(&self, digests: &[String]) -> String {
        let len = self.config.summary_prompt.len() + digests.iter().map(String::len).sum::<usize>();
        let mut prompt = String::with_capacity(len);
        prompt.push_str(&self.config.summary_prompt);
        for digest in digests {
            prompt.push_str(digest);
        }
        prompt
    }

    /// Wait for quota if allowed, call the gateway, and account for the usage.
    async fn admitted_call(
        &self,
        stage: Stage,
        prompt: &str,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let estimated = estimate_tokens(prompt);
        let budget = self.config.per_minute_budget;

        if let Admission::Wait { seconds } = self.quota.check(estimated, budget, Instant::now()) {
            let max_wait_secs = self.config.max_wait_secs;
            if seconds > max_wait_secs {
                warn!(%stage, wait_secs = seconds, max_wait_secs, "token quota exhausted; aborting");
                return Err(ExplainError::QuotaExceeded { stage, wait_secs: seconds, max_wait_secs });
            }

            debug!(%stage, wait_secs = seconds, estimated, budget, "waiting for token quota");
            progress.emit(Progress::Waiting { stage, seconds });
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ExplainError::Interrupted { stage: Some(stage) });
                }
                _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
            }
        }

        progress.emit(Progress::Admitted { stage, estimated_tokens: estimated });
        let completion = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(ExplainError::Interrupted { stage: Some(stage) });
            }
            result = self.gateway.complete(prompt) => {
                result.map_err(|source| ExplainError::Gateway { stage, source })?
            }
        };

        let used = completion.used_tokens.unwrap_or(estimated);
        self.quota.record_usage(used, Instant::now());
        debug!(%stage, used, "call completed");
        progress.emit(Progress::Completed { stage });
        Ok(completion.text)
    }
}
