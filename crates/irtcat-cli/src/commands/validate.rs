//! The `irtcat validate` command.

use std::path::PathBuf;

use anyhow::Result;

use irtcat_core::parser::{load_item_bank_path, validate_item_bank};

pub fn execute(item_bank_path: PathBuf) -> Result<()> {
    let bank = load_item_bank_path(&item_bank_path)?;

    println!(
        "Item bank: {} ({} items)",
        item_bank_path.display(),
        bank.len()
    );

    let warnings = validate_item_bank(&bank);
    for w in &warnings {
        let prefix = w
            .item_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Item bank valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
