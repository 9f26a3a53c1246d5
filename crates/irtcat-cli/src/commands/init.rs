//! The `irtcat init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create irtcat.toml
    if std::path::Path::new("irtcat.toml").exists() {
        println!("irtcat.toml already exists, skipping.");
    } else {
        std::fs::write("irtcat.toml", SAMPLE_CONFIG)?;
        println!("Created irtcat.toml");
    }

    // Create example item bank
    std::fs::create_dir_all("item-banks")?;
    let example_path = std::path::Path::new("item-banks/example.json");
    if example_path.exists() {
        println!("item-banks/example.json already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_ITEM_BANK)?;
        println!("Created item-banks/example.json");
    }

    println!("\nNext steps:");
    println!("  1. Replace item-banks/example.json with your calibrated items");
    println!("  2. Run: irtcat validate --item-bank item-banks/example.json");
    println!("  3. Run: irtcat simulate --true-theta -1,0,1 --replications 100");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# irtcat configuration

item_bank = "item-banks/example.json"
output_dir = "./irtcat-results"

[test]
min_items = 5
max_items = 20
se_threshold = 0.3
starting_theta = 0.0
policy = "max_info"
prior_mean = 0.0
prior_sd = 1.0
seed = 42
"#;

const EXAMPLE_ITEM_BANK: &str = include_str!("../../../../item-banks/example.json");

#[cfg(test)]
mod tests {
    use super::*;
    use irtcat_core::config::IrtcatConfig;
    use irtcat_core::parser::{parse_item_bank_json, validate_item_bank};

    #[test]
    fn sample_config_parses() {
        let config: IrtcatConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.test.seed, Some(42));
        assert!(config.test.validate().is_ok());
    }

    #[test]
    fn example_bank_is_clean() {
        let bank = parse_item_bank_json(EXAMPLE_ITEM_BANK).unwrap();
        assert_eq!(bank.len(), 16);
        assert!(validate_item_bank(&bank).is_empty());
    }
}
