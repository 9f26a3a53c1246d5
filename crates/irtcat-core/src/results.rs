//! Assessment result types with JSON persistence.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::Response;

/// Why an administration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppingReason {
    /// Every item in the bank has been administered.
    ItemBankExhausted,
    /// Minimum length reached and the standard error fell below threshold.
    SeThresholdReached,
    /// The configured maximum number of items was administered.
    MaxItemsReached,
}

impl StoppingReason {
    pub const ALL: [StoppingReason; 3] = [
        StoppingReason::ItemBankExhausted,
        StoppingReason::SeThresholdReached,
        StoppingReason::MaxItemsReached,
    ];
}

impl fmt::Display for StoppingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoppingReason::ItemBankExhausted => write!(f, "item_bank_exhausted"),
            StoppingReason::SeThresholdReached => write!(f, "se_threshold_reached"),
            StoppingReason::MaxItemsReached => write!(f, "max_items_reached"),
        }
    }
}

/// The outcome of one adaptive administration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// Final ability estimate.
    pub estimated_theta: f64,
    /// Standard error of the final estimate. Infinite when no item was
    /// administered; written to JSON as `null`.
    #[serde(deserialize_with = "null_as_infinity")]
    pub standard_error: f64,
    /// Item ids in administration order.
    pub administered_items: Vec<String>,
    /// Responses, parallel to `administered_items`.
    pub responses: Vec<Response>,
    /// Starting theta followed by the estimate after each response.
    pub theta_trajectory: Vec<f64>,
    /// Why the administration ended.
    pub stopping_reason: StoppingReason,
    /// Number of items administered.
    pub total_items: usize,
    /// `1 - SE²`. Negative whenever the SE exceeds 1, and `-inf` (JSON
    /// `null`) when no item was administered.
    #[serde(deserialize_with = "null_as_neg_infinity")]
    pub reliability: f64,
}

// serde_json writes non-finite floats as `null`; read them back as the
// infinities an empty session produces.
fn null_as_infinity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

fn null_as_neg_infinity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
}

impl AssessmentResult {
    /// Proportion of correct responses.
    pub fn proportion_correct(&self) -> f64 {
        if self.responses.is_empty() {
            return 0.0;
        }
        let correct = self.responses.iter().filter(|r| r.is_correct()).count();
        correct as f64 / self.responses.len() as f64
    }

    /// Save the result as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize result")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write result to {}", path.display()))?;
        Ok(())
    }

    /// Load a result from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read result from {}", path.display()))?;
        let result: AssessmentResult =
            serde_json::from_str(&content).context("failed to parse result JSON")?;
        Ok(result)
    }
}
