//! Recovery statistics for simulation batches.
//!
//! Conditional statistics group runs by true ability (as in the usual
//! conditional bias / MSE plots for CAT designs); the summary pools every run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::results::StoppingReason;
use crate::simulation::SimulationRun;

/// Estimator recovery at one true ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalStats {
    pub true_theta: f64,
    /// Number of runs at this ability.
    pub replications: usize,
    pub mean_estimate: f64,
    /// Mean of `estimate - truth`.
    pub bias: f64,
    /// Mean squared error against the truth.
    pub mse: f64,
    pub rmse: f64,
    /// Mean reported standard error.
    pub mean_se: f64,
    /// Mean test length.
    pub avg_items: f64,
    pub stopping_reasons: BTreeMap<StoppingReason, usize>,
}

/// Pooled statistics over a whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub runs: usize,
    pub bias: f64,
    pub rmse: f64,
    pub mean_se: f64,
    pub avg_items: f64,
    pub mean_reliability: f64,
    /// Pearson correlation of true and estimated ability, when both vary.
    pub correlation: Option<f64>,
    pub stopping_reasons: BTreeMap<StoppingReason, usize>,
}

fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn reason_counts(runs: &[&SimulationRun]) -> BTreeMap<StoppingReason, usize> {
    let mut counts = BTreeMap::new();
    for run in runs {
        *counts.entry(run.result.stopping_reason).or_insert(0) += 1;
    }
    counts
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let mx = mean(xs.iter().copied());
    let my = mean(ys.iter().copied());
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// Group runs by true theta, in order of first appearance.
pub fn conditional_stats(runs: &[SimulationRun]) -> Vec<ConditionalStats> {
    let mut groups: Vec<(f64, Vec<&SimulationRun>)> = Vec::new();
    for run in runs {
        match groups
            .iter_mut()
            .find(|(theta, _)| theta.to_bits() == run.true_theta.to_bits())
        {
            Some((_, group)) => group.push(run),
            None => groups.push((run.true_theta, vec![run])),
        }
    }

    groups
        .into_iter()
        .map(|(true_theta, group)| {
            let mse = mean(group.iter().map(|r| r.error().powi(2)));
            ConditionalStats {
                true_theta,
                replications: group.len(),
                mean_estimate: mean(group.iter().map(|r| r.result.estimated_theta)),
                bias: mean(group.iter().map(|r| r.error())),
                mse,
                rmse: mse.sqrt(),
                mean_se: mean(group.iter().map(|r| r.result.standard_error)),
                avg_items: mean(group.iter().map(|r| r.result.total_items as f64)),
                stopping_reasons: reason_counts(&group),
            }
        })
        .collect()
}

/// Pool every run into overall figures.
pub fn summarize(runs: &[SimulationRun]) -> SimulationSummary {
    let all: Vec<&SimulationRun> = runs.iter().collect();
    let truths: Vec<f64> = runs.iter().map(|r| r.true_theta).collect();
    let estimates: Vec<f64> = runs.iter().map(|r| r.result.estimated_theta).collect();

    SimulationSummary {
        runs: runs.len(),
        bias: mean(runs.iter().map(SimulationRun::error)),
        rmse: mean(runs.iter().map(|r| r.error().powi(2))).sqrt(),
        mean_se: mean(runs.iter().map(|r| r.result.standard_error)),
        avg_items: mean(runs.iter().map(|r| r.result.total_items as f64)),
        mean_reliability: mean(runs.iter().map(|r| r.result.reliability)),
        correlation: pearson(&truths, &estimates),
        stopping_reasons: reason_counts(&all),
    }
}
