//! Item bank loading, export and validation.
//!
//! Banks are stored as a JSON array of item records, or as TOML files with
//! one `[[items]]` table per item. Directories of bank files can be loaded
//! recursively and merged.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::estimation::MLE_ADVISORY_BOUNDS;
use crate::model::{IrtModel, ItemBank, ItemParameters};

/// Intermediate TOML structure for bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    #[serde(default)]
    items: Vec<ItemParameters>,
}

/// Load a bank file, choosing the format from the extension.
pub fn load_item_bank(path: &Path) -> Result<ItemBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item bank file: {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => parse_item_bank_toml(&content, path),
        Some("json") => parse_item_bank_json(&content)
            .with_context(|| format!("failed to load item bank: {}", path.display())),
        _ => anyhow::bail!(
            "unsupported item bank format (expected .json or .toml): {}",
            path.display()
        ),
    }
}

/// Parse a JSON array of item records.
pub fn parse_item_bank_json(content: &str) -> Result<ItemBank> {
    let items: Vec<ItemParameters> =
        serde_json::from_str(content).context("failed to parse item bank JSON")?;
    Ok(ItemBank::new(items)?)
}

/// Parse a TOML bank (useful for testing).
pub fn parse_item_bank_toml(content: &str, source_path: &Path) -> Result<ItemBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
    ItemBank::new(parsed.items)
        .with_context(|| format!("invalid item bank: {}", source_path.display()))
}

/// Serialize a bank as a pretty-printed JSON array, preserving item order,
/// field order and exact parameter values.
pub fn export_item_bank_json(bank: &ItemBank) -> Result<String> {
    serde_json::to_string_pretty(bank.items()).context("failed to serialize item bank")
}

/// Write a bank as JSON, creating parent directories.
pub fn save_item_bank(bank: &ItemBank, path: &Path) -> Result<()> {
    let json = export_item_bank_json(bank)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write item bank to {}", path.display()))?;
    Ok(())
}

/// Files are visited in path order so merged banks have a stable item order.
fn collect_bank_files(dir: &Path, items: &mut Vec<ItemParameters>) -> Result<()> {
    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            collect_bank_files(&path, items)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext == "json" || ext == "toml")
        {
            match load_item_bank(&path) {
                Ok(bank) => items.extend(bank.iter().cloned()),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }
    Ok(())
}

/// Recursively load every `.json` and `.toml` bank under a directory and
/// merge them into one bank. Unreadable files are skipped with a warning;
/// ids must be unique across all files.
pub fn load_item_bank_directory(dir: &Path) -> Result<ItemBank> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut items = Vec::new();
    collect_bank_files(dir, &mut items)?;
    ItemBank::new(items).with_context(|| format!("failed to merge banks under {}", dir.display()))
}

/// Load a bank from a file or a directory of bank files.
pub fn load_item_bank_path(path: &Path) -> Result<ItemBank> {
    if path.is_dir() {
        load_item_bank_directory(path)
    } else {
        load_item_bank(path)
    }
}

/// A warning from item bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a structurally valid bank for calibration oddities.
pub fn validate_item_bank(bank: &ItemBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let (lo, hi) = MLE_ADVISORY_BOUNDS;

    if bank.is_empty() {
        warnings.push(ValidationWarning {
            item_id: None,
            message: "item bank is empty".into(),
        });
    }

    for item in bank {
        let mut warn = |message: String| {
            warnings.push(ValidationWarning {
                item_id: Some(item.item_id.clone()),
                message,
            })
        };

        match item.model {
            IrtModel::Rasch => {
                if item.discrimination != 1.0 {
                    warn(format!(
                        "1PL item carries discrimination {}, which is ignored",
                        item.discrimination
                    ));
                }
                if item.guessing != 0.0 {
                    warn(format!(
                        "1PL item carries guessing {}, which is ignored",
                        item.guessing
                    ));
                }
            }
            IrtModel::TwoPl => {
                if item.guessing != 0.0 {
                    warn(format!(
                        "2PL item carries guessing {}, which is ignored",
                        item.guessing
                    ));
                }
            }
            IrtModel::ThreePl => {}
        }

        if item.model != IrtModel::Rasch && item.discrimination <= 0.0 {
            warn(format!(
                "non-positive discrimination {}, probability will not increase with ability",
                item.discrimination
            ));
        }

        if item.difficulty < lo || item.difficulty > hi {
            warn(format!(
                "difficulty {} lies outside [{lo}, {hi}]",
                item.difficulty
            ));
        }
    }

    warnings
}
