//! Simulation report types with JSON persistence.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::CatConfig;
use crate::model::ItemBank;
use crate::simulation::SimulationRun;
use crate::statistics::{conditional_stats, summarize, ConditionalStats, SimulationSummary};

/// A complete simulation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the item bank that was used.
    pub bank: BankSummary,
    /// Test configuration shared by every run.
    pub config: CatConfig,
    /// Seed the batch was derived from.
    pub seed: u64,
    /// Individual runs, ordered by true theta then replication.
    pub runs: Vec<SimulationRun>,
    /// Per-ability recovery statistics.
    pub conditional: Vec<ConditionalStats>,
    /// Pooled statistics.
    pub summary: SimulationSummary,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of an item bank (without the item parameters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSummary {
    pub item_count: usize,
    /// Item count per model tag.
    pub models: BTreeMap<String, usize>,
    pub min_difficulty: f64,
    pub max_difficulty: f64,
    pub mean_discrimination: f64,
}

impl BankSummary {
    pub fn from_bank(bank: &ItemBank) -> Self {
        let mut models = BTreeMap::new();
        for item in bank {
            *models.entry(item.model.to_string()).or_insert(0) += 1;
        }

        let (min_difficulty, max_difficulty) = if bank.is_empty() {
            (0.0, 0.0)
        } else {
            bank.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), item| {
                (lo.min(item.difficulty), hi.max(item.difficulty))
            })
        };
        let mean_discrimination = if bank.is_empty() {
            0.0
        } else {
            bank.iter()
                .map(|item| item.effective_discrimination())
                .sum::<f64>()
                / bank.len() as f64
        };

        Self {
            item_count: bank.len(),
            models,
            min_difficulty,
            max_difficulty,
            mean_discrimination,
        }
    }
}

impl SimulationReport {
    /// Build a report from finished runs, computing the statistics.
    pub fn new(
        bank: &ItemBank,
        config: CatConfig,
        seed: u64,
        runs: Vec<SimulationRun>,
        duration_ms: u64,
    ) -> Self {
        let conditional = conditional_stats(&runs);
        let summary = summarize(&runs);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            bank: BankSummary::from_bank(bank),
            config,
            seed,
            runs,
            conditional,
            summary,
            duration_ms,
        }
    }

    /// Default file name inside an output directory.
    pub fn file_name(&self) -> String {
        format!(
            "simulation-{}-{}.json",
            self.created_at.format("%Y%m%dT%H%M%SZ"),
            &self.id.simple().to_string()[..8]
        )
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SimulationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemParameters;
    use crate::simulation::simulate_batch;

    fn bank() -> ItemBank {
        ItemBank::new(vec![
            ItemParameters::rasch("r1", -1.5).unwrap(),
            ItemParameters::two_pl("t1", 0.0, 1.4).unwrap(),
            ItemParameters::two_pl("t2", 0.8, 0.6).unwrap(),
            ItemParameters::three_pl("g1", 2.0, 1.0, 0.2).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn bank_summary() {
        let summary = BankSummary::from_bank(&bank());
        assert_eq!(summary.item_count, 4);
        assert_eq!(summary.models["2PL"], 2);
        assert_eq!(summary.models["1PL"], 1);
        assert_eq!(summary.min_difficulty, -1.5);
        assert_eq!(summary.max_difficulty, 2.0);
        assert!((summary.mean_discrimination - 1.0).abs() < 1e-12);
    }

    #[test]
    fn report_roundtrip() {
        let bank = bank();
        let config = CatConfig {
            min_items: 2,
            max_items: 4,
            ..Default::default()
        };
        let runs = simulate_batch(&bank, &config, &[0.0, 1.0], 2, 9).unwrap();
        let report = SimulationReport::new(&bank, config, 9, runs, 12);
        assert_eq!(report.conditional.len(), 2);
        assert_eq!(report.summary.runs, 4);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(report.file_name());
        report.save_json(&path).unwrap();

        let loaded = SimulationReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.runs, report.runs);
        assert_eq!(loaded.conditional, report.conditional);
        assert_eq!(loaded.config, report.config);
        assert_eq!(loaded.bank, report.bank);
    }

    #[test]
    fn load_missing_report() {
        let err = SimulationReport::load_json(Path::new("/nonexistent/report.json")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read report"));
    }
}
