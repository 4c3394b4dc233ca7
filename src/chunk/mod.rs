//! Request planning: reduce, estimate, and split oversized input into batches.

use std::borrow::Cow;

use crate::domain::{Batch, Config};
use crate::utils::{estimate_tokens, reduce_for_cap};

use line_chunker::LineChunker;

pub mod line_chunker;

/// Split `text` into batches of at most `max_tokens` (estimated), each
/// starting with `prefix`.
pub fn split(text: &str, max_tokens: usize, prefix: &str) -> Vec<Batch> {
    LineChunker::new(prefix, max_tokens).chunk(text)
}

/// How an input will be sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan<'a> {
    /// The (possibly reduced) text fits in a single request.
    Single { prompt: Cow<'a, str>, token_estimate: usize },
    /// The text is sent as ordered batches followed by one summary request.
    Chunked { batches: Vec<Batch>, token_estimate: usize },
}

impl Plan<'_> {
    /// Number of completion calls the plan will make.
    pub fn call_count(&self) -> usize {
        match self {
            Plan::Single { .. } => 1,
            Plan::Chunked { batches, .. } => batches.len() + 1,
        }
    }

    /// Estimate of the input after reduction, before any prefix is added.
    pub fn token_estimate(&self) -> usize {
        match self {
            Plan::Single { token_estimate, .. } | Plan::Chunked { token_estimate, .. } => {
                *token_estimate
            }
        }
    }
}

/// Apply the lossy reduction, then decide between one request and batches.
pub fn plan<'a>(text: &'a str, config: &Config) -> Plan<'a> {
    let reduced = reduce_for_cap(text, config.per_request_cap, &config.comment_prefixes);
    let token_estimate = estimate_tokens(&reduced);

    if token_estimate <= config.per_request_cap {
        return Plan::Single { prompt: reduced, token_estimate };
    }

    let batches = split(&reduced, config.per_request_cap, &config.chunk_prompt);
    tracing::debug!(
        tokens = token_estimate,
        cap = config.per_request_cap,
        batches = batches.len(),
        "input exceeds the per-request cap; chunking"
    );
    Plan::Chunked { batches, token_estimate }
}
