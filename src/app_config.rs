//! Optional config file supplying defaults for CLI flags.
//!
//! Lives at `$XDG_CONFIG_HOME/finsight/config.toml` (or
//! `~/.config/finsight/config.toml`). Every key is optional:
//!
//! ```toml
//! output_dir = "/srv/filings"
//! concurrency = 4
//! max_retries = 5
//! initial_delay_ms = 250
//! rate_limit = 2000
//! attempt_timeout_secs = 45
//! content_policy = "reject"
//! verbosity = "verbose"
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use finsight_core::ingest::ContentPolicy;
use serde::Deserialize;

const CONFIG_DIR: &str = "finsight";
const CONFIG_FILE: &str = "config.toml";

/// Defaults read from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Directory receiving downloaded filings and the manifest.
    pub output_dir: Option<PathBuf>,
    pub concurrency: Option<u8>,
    /// Total fetch attempts per request.
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    /// Per-domain request spacing in milliseconds (0 disables).
    pub rate_limit: Option<u64>,
    pub attempt_timeout_secs: Option<u64>,
    pub content_policy: Option<ContentPolicy>,
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Checks values against the ranges the CLI enforces.
    pub fn validate(&self) -> Result<()> {
        check_range("concurrency", self.concurrency.map(u64::from), 1..=100)?;
        check_range("max_retries", self.max_retries.map(u64::from), 1..=10)?;
        check_range("initial_delay_ms", self.initial_delay_ms, 0..=60_000)?;
        check_range("rate_limit", self.rate_limit, 0..=60_000)?;
        check_range("attempt_timeout_secs", self.attempt_timeout_secs, 1..=3600)?;
        Ok(())
    }
}

fn check_range(field: &str, value: Option<u64>, range: RangeInclusive<u64>) -> Result<()> {
    match value {
        Some(value) if !range.contains(&value) => bail!(
            "Invalid config value for `{field}`: {value}. Expected range: {}..={}",
            range.start(),
            range.end()
        ),
        _ => Ok(()),
    }
}

/// Config-file spelling of `-v`/`-q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Where the config was looked for, and what was found there.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: Option<PathBuf>,
    pub config: Option<FileConfig>,
}

/// `$XDG_CONFIG_HOME/finsight/config.toml`, else
/// `$HOME/.config/finsight/config.toml`. `None` if neither variable is set.
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    let base = non_empty_env("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| non_empty_env("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join(CONFIG_DIR).join(CONFIG_FILE))
}

fn non_empty_env(name: &str) -> Option<OsString> {
    env::var_os(name).filter(|value| !value.is_empty())
}

/// Loads the config file from the default path; a missing file is not an error.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = path
        .as_deref()
        .filter(|path| path.exists())
        .map(load_file_config)
        .transpose()?;
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}
