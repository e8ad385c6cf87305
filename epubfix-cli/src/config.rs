//! Configuration file loading for epubfix.
//!
//! Discovers and loads `epubfix.toml` from the package directory and merges
//! it with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "epubfix.toml";

/// Top-level configuration from epubfix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EpubfixConfig {
    pub policy: PolicyConfig,
}

/// Policy section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Allowlist patterns for strategy names.
    /// If non-empty, only allowlisted strategies are eligible.
    pub allow: Vec<String>,

    /// Denylist patterns for strategy names.
    pub deny: Vec<String>,

    /// Maximum number of repairs dispatched per run.
    pub max_fixes: Option<u64>,
}

pub fn discover_config(package_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = package_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<EpubfixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<EpubfixConfig> {
    let config: EpubfixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the package directory, or return default if not found.
pub fn load_or_default(package_dir: &Utf8Path) -> anyhow::Result<EpubfixConfig> {
    match discover_config(package_dir) {
        Some(path) => load_config(&path),
        None => Ok(EpubfixConfig::default()),
    }
}

/// Merged policy combining config file and CLI arguments.
///
/// CLI `allow`/`deny` lists extend the config file lists; a CLI `max_fixes`
/// overrides the file value.
#[derive(Debug, Clone, Default)]
pub struct MergedPolicy {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub max_fixes: Option<u64>,
}

pub fn merge_policy(
    config: EpubfixConfig,
    cli_allow: &[String],
    cli_deny: &[String],
    cli_max_fixes: Option<u64>,
) -> MergedPolicy {
    let mut allow = config.policy.allow;
    let mut deny = config.policy.deny;

    for pattern in cli_allow {
        if !allow.contains(pattern) {
            allow.push(pattern.clone());
        }
    }
    for pattern in cli_deny {
        if !deny.contains(pattern) {
            deny.push(pattern.clone());
        }
    }

    MergedPolicy {
        allow,
        deny,
        max_fixes: cli_max_fixes.or(config.policy.max_fixes),
    }
}
