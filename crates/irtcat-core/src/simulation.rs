//! Monte Carlo simulation of adaptive administrations.
//!
//! A [`SimulatedExaminee`] answers items by drawing from the response model
//! at a known true ability, which lets the estimator and stopping rules be
//! evaluated against ground truth.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::{AdaptiveTest, CatConfig};
use crate::error::CatError;
use crate::irt::probability;
use crate::model::{ItemBank, ItemParameters, Response};
use crate::results::AssessmentResult;
use crate::traits::{NoopObserver, ResponseSource};

/// An examinee with a known ability who answers by Bernoulli draw.
#[derive(Debug, Clone)]
pub struct SimulatedExaminee {
    true_theta: f64,
    rng: ChaCha8Rng,
}

impl SimulatedExaminee {
    pub fn new(true_theta: f64, seed: u64) -> Self {
        Self::with_rng(true_theta, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(true_theta: f64, rng: ChaCha8Rng) -> Self {
        Self { true_theta, rng }
    }

    pub fn true_theta(&self) -> f64 {
        self.true_theta
    }
}

impl ResponseSource for SimulatedExaminee {
    fn respond(&mut self, item: &ItemParameters) -> anyhow::Result<Response> {
        let p = probability(self.true_theta, item);
        Ok(Response::from(self.rng.gen::<f64>() < p))
    }
}

/// One simulated administration within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub true_theta: f64,
    pub replication: usize,
    pub result: AssessmentResult,
}

impl SimulationRun {
    /// Signed estimation error, `estimate - truth`.
    pub fn error(&self) -> f64 {
        self.result.estimated_theta - self.true_theta
    }
}

/// Run one simulated administration.
///
/// The examinee and selector RNGs are separate ChaCha8 streams keyed by
/// `seed`, so the same arguments always reproduce the same session.
/// `config.seed` is ignored here.
pub fn simulate_test(
    bank: &ItemBank,
    config: &CatConfig,
    true_theta: f64,
    seed: u64,
) -> Result<AssessmentResult, CatError> {
    simulate_task(bank, config, true_theta, seed, 0)
}

/// Examinee and selector streams for task `task` are `2 * task` and
/// `2 * task + 1` of the ChaCha8 generator keyed by `seed`.
fn simulate_task(
    bank: &ItemBank,
    config: &CatConfig,
    true_theta: f64,
    seed: u64,
    task: u64,
) -> Result<AssessmentResult, CatError> {
    let mut examinee_rng = ChaCha8Rng::seed_from_u64(seed);
    examinee_rng.set_stream(task.wrapping_mul(2));
    let mut selector_rng = ChaCha8Rng::seed_from_u64(seed);
    selector_rng.set_stream(task.wrapping_mul(2).wrapping_add(1));

    let mut examinee = SimulatedExaminee::with_rng(true_theta, examinee_rng);
    AdaptiveTest::with_rng(bank.clone(), config.clone(), selector_rng)?
        .run(&mut examinee, &NoopObserver)
}

/// Simulate `replications` administrations at each true ability, in parallel.
///
/// Runs come back ordered by true theta, then replication. Every run draws
/// from its own RNG streams, so results do not depend on thread scheduling.
pub fn simulate_batch(
    bank: &ItemBank,
    config: &CatConfig,
    true_thetas: &[f64],
    replications: usize,
    seed: u64,
) -> Result<Vec<SimulationRun>, CatError> {
    config.validate()?;
    if let Some(bad) = true_thetas.iter().find(|t| !t.is_finite()) {
        return Err(CatError::InvalidConfig(format!(
            "true theta must be finite, got {bad}"
        )));
    }

    let tasks: Vec<(f64, usize)> = true_thetas
        .iter()
        .flat_map(|&theta| (0..replications).map(move |rep| (theta, rep)))
        .collect();

    tracing::info!(
        items = bank.len(),
        conditions = true_thetas.len(),
        replications,
        policy = %config.policy,
        "starting simulation batch"
    );

    let runs = tasks
        .par_iter()
        .enumerate()
        .map(|(task, &(true_theta, replication))| {
            simulate_task(bank, config, true_theta, seed, task as u64).map(|result| SimulationRun {
                true_theta,
                replication,
                result,
            })
        })
        .collect::<Result<Vec<_>, CatError>>()?;

    tracing::debug!(runs = runs.len(), "simulation batch complete");
    Ok(runs)
}
