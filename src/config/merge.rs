//! CLI overrides applied on top of file and environment configuration.

use crate::domain::Config;

/// Values given explicitly on the command line; `None` keeps the loaded value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub per_request_cap: Option<usize>,
    pub per_minute_budget: Option<usize>,
    pub window_secs: Option<u64>,
    pub max_wait_secs: Option<u64>,
    pub comment_prefixes: Option<Vec<String>>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_output_tokens: Option<u32>,
}

pub fn merge_cli_with_config(mut config: Config, cli: CliOverrides) -> Config {
    if let Some(v) = cli.per_request_cap {
        config.per_request_cap = v;
    }
    if let Some(v) = cli.per_minute_budget {
        config.per_minute_budget = v;
    }
    if let Some(v) = cli.window_secs {
        config.window_secs = v;
    }
    if let Some(v) = cli.max_wait_secs {
        config.max_wait_secs = v;
    }
    if let Some(v) = cli.comment_prefixes {
        config.comment_prefixes = v;
    }
    if let Some(v) = cli.base_url {
        config.gateway.base_url = v;
    }
    if let Some(v) = cli.model {
        config.gateway.model = v;
    }
    if let Some(v) = cli.max_output_tokens {
        config.gateway.max_tokens = v;
    }
    config
}
