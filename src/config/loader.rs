//! Config file loading

use crate::domain::Config;
use anyhow::{Context, Result};
use figment::providers::{Env, Serialized};
use figment::Figment;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `CHUNKED_EXPLAIN_MAX_WAIT_SECS=30` or
/// `CHUNKED_EXPLAIN_GATEWAY__MODEL=gpt-4o`.
pub const ENV_PREFIX: &str = "CHUNKED_EXPLAIN_";

const NESTED_SECTIONS: [&str; 2] = ["chunked-explain", "explain"];

/// Load file config (explicit or discovered under `search_root`), then apply
/// environment overrides.
pub fn load_config(search_root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let file_config = load_file_config(search_root, config_path)?;
    apply_env_overrides(file_config)
}

fn load_file_config(search_root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(search_root),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => Err(anyhow::anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    };

    match parsed {
        Ok(cfg) => {
            tracing::debug!("Loaded config from {}", config_file.display());
            Ok(cfg)
        }
        Err(e) if config_path_provided => Err(e),
        Err(e) => {
            // A stray file picked up by discovery should not block a run.
            tracing::warn!(
                "Failed to parse auto-discovered config {}: {:#}",
                config_file.display(),
                e
            );
            Ok(Config::default())
        }
    }
}

/// Parse TOML config, supporting a nested `[chunked-explain]` or `[explain]` table.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = NESTED_SECTIONS
        .iter()
        .find_map(|section| raw.get(*section).cloned())
        .unwrap_or(raw);

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, supporting a nested `chunked-explain` or `explain` mapping.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = NESTED_SECTIONS
        .iter()
        .find_map(|section| raw.get(*section).cloned())
        .unwrap_or(raw);

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn apply_env_overrides(base: Config) -> Result<Config> {
    Figment::from(Serialized::defaults(base))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Invalid CHUNKED_EXPLAIN_* environment override")
}

fn discover_config(search_root: &Path) -> Option<PathBuf> {
    let candidates = [
        "chunked-explain.toml",
        ".chunked-explain.toml",
        "chunked-explain.yml",
        ".chunked-explain.yml",
        "chunked-explain.yaml",
        ".chunked-explain.yaml",
    ];

    candidates.iter().map(|candidate| search_root.join(candidate)).find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_defaults_when_missing() {
        let tmp = TempDir::new().expect("tmp");
        let cfg = load_file_config(tmp.path(), None).expect("config");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_load_toml_config() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("chunked-explain.toml");
        fs::write(
            &path,
            "per_request_cap = 3000\nmax_wait_secs = 30\n\n[gateway]\nmodel = 'gpt-4o'\n",
        )
        .expect("write");

        let cfg = load_file_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.per_request_cap, 3000);
        assert_eq!(cfg.max_wait_secs, 30);
        assert_eq!(cfg.gateway.model, "gpt-4o");
        // untouched fields keep their defaults
        assert_eq!(cfg.per_minute_budget, 9500);
        assert_eq!(cfg.gateway.max_tokens, 1000);
    }

    #[test]
    fn test_nested_toml_section() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join(".chunked-explain.toml");
        fs::write(&path, "[chunked-explain]\nper_minute_budget = 40000\n").expect("write");

        let cfg = load_file_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.per_minute_budget, 40000);
    }

    #[test]
    fn test_load_yaml_config() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("chunked-explain.yml");
        fs::write(&path, "explain:\n  window_secs: 30\n  comment_prefixes: ['//', '#']\n")
            .expect("write");

        let cfg = load_file_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.window_secs, 30);
        assert_eq!(cfg.comment_prefixes, vec!["//".to_string(), "#".to_string()]);
    }

    #[test]
    fn test_explicit_config_invalid_type_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "per_request_cap = 'lots'\n").expect("write");

        let result = load_file_config(tmp.path(), Some(&path));
        assert!(result.is_err(), "explicit config with invalid type should return Err");
    }

    #[test]
    fn test_explicit_config_unsupported_extension_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("settings.ini");
        fs::write(&path, "per_request_cap=1\n").expect("write");

        assert!(load_file_config(tmp.path(), Some(&path)).is_err());
    }

    #[test]
    fn test_auto_discovered_invalid_type_returns_default() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("chunked-explain.toml"), "per_request_cap = 'lots'\n")
            .expect("write");

        let cfg = load_file_config(tmp.path(), None).expect("should not error on auto-discovery");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CHUNKED_EXPLAIN_MAX_WAIT_SECS", "45");
            jail.set_env("CHUNKED_EXPLAIN_GATEWAY__MODEL", "local-model");
            let base = Config { max_wait_secs: 5, ..Config::default() };
            let cfg = apply_env_overrides(base).expect("env overrides");
            assert_eq!(cfg.max_wait_secs, 45);
            assert_eq!(cfg.gateway.model, "local-model");
            assert_eq!(cfg.per_request_cap, 7000);
            Ok(())
        });
    }
}
