//! Shared CLI utilities.

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::Config;
use crate::utils::{read_text, read_text_file};

/// Limits and endpoint settings shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Path to config file (chunked-explain.toml or chunked-explain.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Largest estimated prompt sent as a single request
    #[arg(long, value_name = "TOKENS")]
    pub per_request_cap: Option<usize>,

    /// Tokens allowed per quota window
    #[arg(long, value_name = "TOKENS")]
    pub per_minute_budget: Option<usize>,

    /// Width of the quota window in seconds
    #[arg(long, value_name = "SECS")]
    pub window_secs: Option<u64>,

    /// Give up instead of waiting longer than this for quota
    #[arg(long, value_name = "SECS")]
    pub max_wait_secs: Option<u64>,

    /// Full-line comment prefixes stripped from oversized input (comma-separated)
    #[arg(long, value_name = "PREFIXES")]
    pub comment_prefixes: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Model name sent with every request
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Maximum tokens the model may generate per request
    #[arg(long, value_name = "TOKENS")]
    pub max_output_tokens: Option<u32>,
}

impl SettingsArgs {
    /// Resolve defaults, config file, environment and flags into one config.
    pub fn resolve(&self) -> Result<Config> {
        let cwd = std::env::current_dir()?;
        let file_config = load_config(&cwd, self.config.as_deref())?;
        let overrides = CliOverrides {
            per_request_cap: self.per_request_cap,
            per_minute_budget: self.per_minute_budget,
            window_secs: self.window_secs,
            max_wait_secs: self.max_wait_secs,
            comment_prefixes: parse_csv(&self.comment_prefixes),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            max_output_tokens: self.max_output_tokens,
        };
        let merged = merge_cli_with_config(file_config, overrides);
        merged.validate()?;
        Ok(merged)
    }
}

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// True when the input should come from stdin (no path, or `-`).
pub fn reads_stdin(input: Option<&Path>) -> bool {
    input.map_or(true, |p| p.as_os_str() == "-")
}

/// Read the input text and a display name for it.
pub fn read_input(input: Option<&Path>) -> Result<(String, String)> {
    match input {
        Some(path) if !reads_stdin(Some(path)) => {
            let (text, encoding) = read_text_file(path)?;
            tracing::debug!("Read {} as {}", path.display(), encoding);
            Ok((text, path.display().to_string()))
        }
        _ => {
            let (text, encoding) = read_text(std::io::stdin().lock())?;
            tracing::debug!("Read stdin as {}", encoding);
            Ok((text, "<stdin>".to_string()))
        }
    }
}
