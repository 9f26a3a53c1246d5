//! Subcommand implementations and the settings they share.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use irtcat_core::config::{load_config_from, IrtcatConfig};
use irtcat_core::parser::load_item_bank_path;
use irtcat_core::{CatConfig, ItemBank, SelectionPolicy};

pub mod administer;
pub mod estimate;
pub mod init;
pub mod inspect;
pub mod simulate;
pub mod validate;

/// Test settings that override the config file.
#[derive(Args, Debug, Default)]
pub struct TestOverrides {
    /// Selection policy: max_info, difficulty_match, random
    #[arg(long)]
    pub policy: Option<SelectionPolicy>,

    /// Minimum items before the SE rule may stop the test
    #[arg(long)]
    pub min_items: Option<usize>,

    /// Maximum test length
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Stop once the standard error falls below this
    #[arg(long)]
    pub se_threshold: Option<f64>,

    /// Ability assumed before the first response
    #[arg(long, allow_hyphen_values = true)]
    pub starting_theta: Option<f64>,

    /// RNG seed
    #[arg(long)]
    pub seed: Option<u64>,
}

impl TestOverrides {
    /// Apply flags on top of `config`, then validate the result.
    pub fn apply(&self, mut config: CatConfig) -> Result<CatConfig> {
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(min_items) = self.min_items {
            config.min_items = min_items;
        }
        if let Some(max_items) = self.max_items {
            config.max_items = max_items;
        }
        if let Some(se_threshold) = self.se_threshold {
            config.se_threshold = se_threshold;
        }
        if let Some(starting_theta) = self.starting_theta {
            config.starting_theta = starting_theta;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Config file, item bank and test settings resolved from flags and config.
pub struct Settings {
    pub config: IrtcatConfig,
    pub bank: ItemBank,
    pub test: CatConfig,
}

/// Resolve settings in precedence order: flags, environment, config file.
pub fn resolve_settings(
    item_bank: Option<PathBuf>,
    overrides: &TestOverrides,
    config_path: Option<&Path>,
) -> Result<Settings> {
    let config = load_config_from(config_path)?;

    let bank_path = item_bank
        .or_else(|| config.item_bank.clone())
        .context("no item bank given; pass --item-bank or set item_bank in irtcat.toml")?;
    let bank = load_item_bank_path(&bank_path)?;
    anyhow::ensure!(!bank.is_empty(), "item bank is empty: {}", bank_path.display());
    tracing::debug!(path = %bank_path.display(), items = bank.len(), "item bank loaded");

    let test = overrides.apply(config.test.clone())?;
    Ok(Settings { config, bank, test })
}

/// Parse a comma-separated list, naming the offending entry on failure.
pub fn parse_list<T>(input: &str, what: &str) -> Result<Vec<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid {what} '{s}': {e}"))
        })
        .collect()
}
