//! Ability estimation: maximum likelihood (MLE) and expected a posteriori (EAP).
//!
//! Both estimators take parallel slices of responses and items. Items may be
//! owned or borrowed (`&[ItemParameters]` or `&[&ItemParameters]`).

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

use crate::error::CatError;
use crate::irt::{probability, standard_error};
use crate::model::{ItemParameters, Response};

/// Probabilities are clipped into `[PROB_FLOOR, 1 - PROB_FLOOR]` before logs.
const PROB_FLOOR: f64 = 1e-10;

/// Offset from the extreme difficulty used when every response agrees.
const PERFECT_SCORE_OFFSET: f64 = 2.0;

/// Standard error reported for all-correct / all-incorrect patterns.
const PERFECT_SCORE_SE: f64 = 1.0;

/// Quasi-Newton stopping tolerance on the gradient norm.
const GRADIENT_TOLERANCE: f64 = 1e-5;

const MAX_ITERATIONS: usize = 200;

/// Armijo sufficient-decrease constant for the line search.
const ARMIJO_C1: f64 = 1e-4;

const MIN_STEP: f64 = 1e-12;

/// Range the MLE search is nominally started in. The search itself is
/// unconstrained; only the starting point is expected to lie here.
pub const MLE_ADVISORY_BOUNDS: (f64, f64) = (-4.0, 4.0);

/// An ability estimate with its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    pub theta: f64,
    pub standard_error: f64,
}

impl AbilityEstimate {
    pub fn new(theta: f64, standard_error: f64) -> Self {
        Self {
            theta,
            standard_error,
        }
    }
}

impl From<AbilityEstimate> for (f64, f64) {
    fn from(estimate: AbilityEstimate) -> Self {
        (estimate.theta, estimate.standard_error)
    }
}

fn check_lengths<T>(responses: &[Response], items: &[T]) -> Result<(), CatError> {
    if responses.len() != items.len() {
        return Err(CatError::LengthMismatch {
            responses: responses.len(),
            items: items.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Maximum likelihood
// ---------------------------------------------------------------------------

/// Negative log-likelihood and its derivative with respect to theta.
fn nll_with_gradient<T: Borrow<ItemParameters>>(
    theta: f64,
    responses: &[Response],
    items: &[T],
) -> (f64, f64) {
    let mut nll = 0.0;
    let mut grad = 0.0;

    for (response, item) in responses.iter().zip(items) {
        let item = item.borrow();
        let raw = probability(theta, item);
        let p = raw.clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
        let r = response.as_f64();

        nll -= r * p.ln() + (1.0 - r) * (1.0 - p).ln();

        // The clipped probability is flat outside the clip range.
        if raw > PROB_FLOOR && raw < 1.0 - PROB_FLOOR {
            let a = item.effective_discrimination();
            let c = item.effective_guessing();
            let dp = a * (raw - c) * (1.0 - raw) / (1.0 - c);
            grad -= (r / p - (1.0 - r) / (1.0 - p)) * dp;
        }
    }

    (nll, grad)
}

/// Outcome of the one-dimensional quasi-Newton search.
#[derive(Debug, Clone, Copy)]
struct Minimum {
    theta: f64,
    iterations: usize,
    converged: bool,
}

/// One-dimensional BFGS with a backtracking line search.
///
/// In one dimension the BFGS inverse-Hessian update reduces to the secant
/// ratio `s / y`.
fn minimize_nll<T: Borrow<ItemParameters>>(
    responses: &[Response],
    items: &[T],
    start: f64,
) -> Minimum {
    let mut theta = start;
    let (mut f, mut g) = nll_with_gradient(theta, responses, items);
    let mut inv_hessian = 1.0;

    for iteration in 0..MAX_ITERATIONS {
        if g.abs() < GRADIENT_TOLERANCE {
            return Minimum {
                theta,
                iterations: iteration,
                converged: true,
            };
        }

        let mut direction = -inv_hessian * g;
        if direction * g >= 0.0 {
            inv_hessian = 1.0;
            direction = -g;
        }

        let mut step = 1.0;
        let (next_theta, next_f, next_g) = loop {
            let candidate = theta + step * direction;
            let (cf, cg) = nll_with_gradient(candidate, responses, items);
            if cf.is_finite() && cf <= f + ARMIJO_C1 * step * direction * g {
                break (candidate, cf, cg);
            }
            step *= 0.5;
            if step < MIN_STEP {
                return Minimum {
                    theta,
                    iterations: iteration,
                    converged: false,
                };
            }
        };

        let s = next_theta - theta;
        let y = next_g - g;
        if s * y > f64::EPSILON {
            inv_hessian = s / y;
        }

        theta = next_theta;
        f = next_f;
        g = next_g;
    }

    Minimum {
        theta,
        iterations: MAX_ITERATIONS,
        converged: g.abs() < GRADIENT_TOLERANCE,
    }
}

/// Maximum likelihood ability estimate.
///
/// All-correct and all-incorrect patterns have no finite maximum; they get a
/// fixed estimate two logits beyond the hardest (easiest) item with a
/// standard error of 1. Otherwise the negative log-likelihood is minimised
/// from `initial_theta` and the standard error is taken from test
/// information at the estimate.
pub fn estimate_ability_mle<T: Borrow<ItemParameters>>(
    responses: &[Response],
    items: &[T],
    initial_theta: f64,
) -> Result<AbilityEstimate, CatError> {
    check_lengths(responses, items)?;
    if responses.is_empty() {
        return Err(CatError::EmptyResponses);
    }

    let difficulties = items.iter().map(|item| item.borrow().difficulty);

    if responses.iter().all(|r| r.is_correct()) {
        let hardest = difficulties.fold(f64::NEG_INFINITY, f64::max);
        return Ok(AbilityEstimate::new(
            hardest + PERFECT_SCORE_OFFSET,
            PERFECT_SCORE_SE,
        ));
    }
    if responses.iter().all(|r| !r.is_correct()) {
        let easiest = difficulties.fold(f64::INFINITY, f64::min);
        return Ok(AbilityEstimate::new(
            easiest - PERFECT_SCORE_OFFSET,
            PERFECT_SCORE_SE,
        ));
    }

    let (lo, hi) = MLE_ADVISORY_BOUNDS;
    if !(lo..=hi).contains(&initial_theta) {
        tracing::debug!(initial_theta, "MLE started outside the advisory range");
    }

    let minimum = minimize_nll(responses, items, initial_theta);
    if !minimum.converged {
        tracing::warn!(
            theta = minimum.theta,
            iterations = minimum.iterations,
            "MLE did not converge, returning last iterate"
        );
    }

    let se = standard_error(minimum.theta, items.iter().map(Borrow::borrow));
    Ok(AbilityEstimate::new(minimum.theta, se))
}

// ---------------------------------------------------------------------------
// Expected a posteriori
// ---------------------------------------------------------------------------

/// Number of points in the standard quadrature grid.
pub const QUADRATURE_POINTS: usize = 41;

/// Inclusive range of the standard quadrature grid.
pub const QUADRATURE_RANGE: (f64, f64) = (-4.0, 4.0);

/// Evenly spaced quadrature points for EAP.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureGrid {
    points: Vec<f64>,
}

impl QuadratureGrid {
    /// 41 points over `[-4, 4]`, step 0.2.
    pub fn standard() -> Self {
        let (lo, hi) = QUADRATURE_RANGE;
        Self::evenly_spaced(lo, hi, QUADRATURE_POINTS)
    }

    /// `n` points from `lo` to `hi` inclusive.
    pub fn new(lo: f64, hi: f64, n: usize) -> Result<Self, CatError> {
        if n < 2 || !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(CatError::InvalidConfig(format!(
                "quadrature grid needs at least 2 points over a finite, non-empty range (got {n} over [{lo}, {hi}])"
            )));
        }
        Ok(Self::evenly_spaced(lo, hi, n))
    }

    fn evenly_spaced(lo: f64, hi: f64, n: usize) -> Self {
        let step = (hi - lo) / (n - 1) as f64;
        let points = (0..n).map(|i| lo + step * i as f64).collect();
        Self { points }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Normalised posterior weights at each grid point.
    ///
    /// Likelihood and Gaussian prior are combined in log space and shifted by
    /// their maximum before exponentiating, so long response strings cannot
    /// underflow the whole grid to zero.
    pub fn posterior<T: Borrow<ItemParameters>>(
        &self,
        responses: &[Response],
        items: &[T],
        prior: &EapPrior,
    ) -> Vec<f64> {
        let log_posterior: Vec<f64> = self
            .points
            .iter()
            .map(|&theta| {
                let z = (theta - prior.mean) / prior.sd;
                let log_prior = -0.5 * z * z;
                let log_like: f64 = responses
                    .iter()
                    .zip(items)
                    .map(|(response, item)| {
                        let p = probability(theta, item.borrow())
                            .clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
                        if response.is_correct() {
                            p.ln()
                        } else {
                            (1.0 - p).ln()
                        }
                    })
                    .sum();
                log_like + log_prior
            })
            .collect();

        let max = log_posterior
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = log_posterior.iter().map(|lp| (lp - max).exp()).collect();
        let total: f64 = weights.iter().sum();
        weights.into_iter().map(|w| w / total).collect()
    }

    /// Posterior mean and standard deviation over this grid.
    pub fn estimate<T: Borrow<ItemParameters>>(
        &self,
        responses: &[Response],
        items: &[T],
        prior: &EapPrior,
    ) -> Result<AbilityEstimate, CatError> {
        check_lengths(responses, items)?;
        prior.validate()?;

        let posterior = self.posterior(responses, items, prior);
        let theta: f64 = posterior
            .iter()
            .zip(&self.points)
            .map(|(w, x)| w * x)
            .sum();
        let variance: f64 = posterior
            .iter()
            .zip(&self.points)
            .map(|(w, x)| w * (x - theta).powi(2))
            .sum();

        Ok(AbilityEstimate::new(theta, variance.sqrt()))
    }
}

impl Default for QuadratureGrid {
    fn default() -> Self {
        Self::standard()
    }
}

/// Gaussian prior for EAP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EapPrior {
    pub mean: f64,
    pub sd: f64,
}

impl EapPrior {
    pub fn new(mean: f64, sd: f64) -> Result<Self, CatError> {
        let prior = Self { mean, sd };
        prior.validate()?;
        Ok(prior)
    }

    pub fn validate(&self) -> Result<(), CatError> {
        if !self.mean.is_finite() {
            return Err(CatError::InvalidConfig(format!(
                "prior mean must be finite, got {}",
                self.mean
            )));
        }
        if !(self.sd.is_finite() && self.sd > 0.0) {
            return Err(CatError::InvalidConfig(format!(
                "prior sd must be positive and finite, got {}",
                self.sd
            )));
        }
        Ok(())
    }
}

impl Default for EapPrior {
    fn default() -> Self {
        Self { mean: 0.0, sd: 1.0 }
    }
}

/// EAP ability estimate on the standard 41-point grid.
///
/// Deterministic and defined for any number of responses, including none,
/// in which case it summarises the prior.
///
/// Fails only on bad input: `LengthMismatch` when `responses` and `items`
/// differ in length, `InvalidConfig` for a non-finite mean or `prior_sd <= 0`.
pub fn estimate_ability_eap<T: Borrow<ItemParameters>>(
    responses: &[Response],
    items: &[T],
    prior_mean: f64,
    prior_sd: f64,
) -> Result<AbilityEstimate, CatError> {
    QuadratureGrid::standard().estimate(
        responses,
        items,
        &EapPrior {
            mean: prior_mean,
            sd: prior_sd,
        },
    )
}
