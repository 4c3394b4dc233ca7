//! Core data types shared across modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Instruction prefix for every chunk of an oversized input.
pub const DEFAULT_CHUNK_PROMPT: &str = "compress the following text in a way that fits in a tweet (ideally) and such that you (GPT-4) can reconstruct the intention of the human who wrote text as close as possible to the original intention. This is for yourself. It does not need to be human readable or understandable. Abuse of language mixing, abbreviations, symbols (unicode and emoji), or any other encodings or internal representations is all permissible, as long as it, if pasted in a new inference cycle, will yield near-identical results as the original text: ";

/// Instruction prefix for the final pass over the per-chunk digests.
pub const DEFAULT_SUMMARY_PROMPT: &str =
    "decode the following summaries that you encoded and create an overall summary of them: ";

pub const DEFAULT_PER_REQUEST_CAP: usize = 7000;
pub const DEFAULT_PER_MINUTE_BUDGET: usize = 9500;
pub const DEFAULT_WINDOW_SECS: u64 = 60;
pub const DEFAULT_MAX_WAIT_SECS: u64 = 10;

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Largest estimated prompt sent as a single request.
    pub per_request_cap: usize,
    /// Tokens allowed within one quota window.
    pub per_minute_budget: usize,
    /// Width of the sliding quota window.
    pub window_secs: u64,
    /// Longest admission wait tolerated before giving up.
    pub max_wait_secs: u64,
    pub chunk_prompt: String,
    pub summary_prompt: String,
    /// Line prefixes treated as full-line comments by the lossy reduction.
    pub comment_prefixes: Vec<String>,
    pub gateway: GatewayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            per_request_cap: DEFAULT_PER_REQUEST_CAP,
            per_minute_budget: DEFAULT_PER_MINUTE_BUDGET,
            window_secs: DEFAULT_WINDOW_SECS,
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
            chunk_prompt: DEFAULT_CHUNK_PROMPT.to_string(),
            summary_prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
            comment_prefixes: vec!["#".to_string()],
            gateway: GatewayConfig::default(),
        }
    }
}

impl Config {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Reject settings that would make every request inadmissible or loop forever.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.per_request_cap == 0 {
            anyhow::bail!("per_request_cap must be greater than zero");
        }
        if self.per_minute_budget == 0 {
            anyhow::bail!("per_minute_budget must be greater than zero");
        }
        if self.window_secs == 0 {
            anyhow::bail!("window_secs must be greater than zero");
        }
        if self.gateway.base_url.trim().is_empty() {
            anyhow::bail!("gateway.base_url must not be empty");
        }
        Ok(())
    }
}

/// Settings for the OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            max_tokens: 1000,
            temperature: 1.0,
            top_p: 1.0,
            timeout_secs: 120,
        }
    }
}

/// One token-bounded request payload produced by the chunker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position in the sequence.
    pub index: usize,
    pub id: String,
    /// First input line in this batch (1-indexed).
    pub start_line: usize,
    /// Last input line in this batch (1-indexed, inclusive).
    pub end_line: usize,
    /// Instruction prefix followed by the batch's lines, each ending in `\n`.
    pub prompt: String,
    pub token_estimate: usize,
}

impl Batch {
    pub fn line_count(&self) -> usize {
        self.end_line + 1 - self.start_line
    }
}

/// Which call of an explain run an event or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The only call for an input that fits in one request.
    Single,
    /// One chunk of an oversized input; `index` is zero-based.
    Chunk { index: usize, total: usize },
    /// The summary over all chunk digests.
    Final,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Single => write!(f, "single request"),
            Stage::Chunk { index, total } => write!(f, "chunk {}/{}", index + 1, total),
            Stage::Final => write!(f, "final summary"),
        }
    }
}
