//! irtcat configuration file loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::CatConfig;
use crate::selection::SelectionPolicy;

/// Top-level irtcat configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrtcatConfig {
    /// Default item bank (file or directory).
    #[serde(default)]
    pub item_bank: Option<PathBuf>,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Adaptive test settings.
    #[serde(default)]
    pub test: CatConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./irtcat-results")
}

impl Default for IrtcatConfig {
    fn default() -> Self {
        Self {
            item_bank: None,
            output_dir: default_output_dir(),
            test: CatConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    expand_vars(s, |name| std::env::var(name).ok())
}

/// Substitute `${NAME}` references. Substituted text is not expanded again;
/// unknown variables become empty and an unclosed `${` is kept verbatim.
fn expand_vars(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        result.push_str(&lookup(&rest[start + 2..start + end]).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `irtcat.toml` in the current directory
/// 2. `~/.config/irtcat/config.toml`
///
/// Environment variable overrides: `IRTCAT_SEED`, `IRTCAT_POLICY`,
/// `IRTCAT_ITEM_BANK`.
pub fn load_config() -> Result<IrtcatConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<IrtcatConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("irtcat.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config_file(&path)?
        }
        None => IrtcatConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    config.item_bank = config.item_bank.as_deref().map(resolve_path);
    config.output_dir = resolve_path(&config.output_dir);

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<IrtcatConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<IrtcatConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

/// Apply `IRTCAT_*` overrides, reading variables through `lookup`.
fn apply_env_overrides<F>(config: &mut IrtcatConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(seed) = lookup("IRTCAT_SEED") {
        let seed = seed
            .trim()
            .parse::<u64>()
            .with_context(|| format!("IRTCAT_SEED is not a valid seed: {seed}"))?;
        config.test.seed = Some(seed);
    }

    if let Some(policy) = lookup("IRTCAT_POLICY") {
        config.test.policy = policy
            .parse::<SelectionPolicy>()
            .context("invalid IRTCAT_POLICY")?;
    }

    if let Some(bank) = lookup("IRTCAT_ITEM_BANK") {
        config.item_bank = Some(PathBuf::from(bank));
    }

    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("irtcat"))
}
