//! Adaptive test controller.
//!
//! Drives one administration through an explicit state machine:
//!
//! ```text
//! Init -> SelectItem -> AwaitResponse -> UpdateEstimate -> CheckStop
//!              ^                                              |
//!              +----------------------------------------------+
//! ```
//!
//! until a stopping rule fires and the session moves to `Terminal`. Each
//! [`AdaptiveTest`] owns its session state and RNG; only the item bank is
//! shared between sessions.

use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::CatError;
use crate::estimation::{EapPrior, QuadratureGrid};
use crate::model::{ItemBank, ItemParameters, Response};
use crate::results::{AssessmentResult, StoppingReason};
use crate::selection::{select_next_item, SelectionPolicy};
use crate::traits::{NoopObserver, ResponseSource, SessionObserver};

/// Configuration for one adaptive administration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatConfig {
    /// Items to administer before the SE rule may stop the test. At least 1,
    /// so the SE rule never fires on the prior alone.
    pub min_items: usize,
    /// Hard upper bound on test length.
    pub max_items: usize,
    /// Stop once the SE drops below this value (after `min_items`).
    pub se_threshold: f64,
    /// Ability assumed before any response.
    pub starting_theta: f64,
    /// Item selection policy.
    pub policy: SelectionPolicy,
    /// Mean of the EAP prior.
    pub prior_mean: f64,
    /// Standard deviation of the EAP prior.
    pub prior_sd: f64,
    /// Seed for the selector RNG. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for CatConfig {
    fn default() -> Self {
        Self {
            min_items: 5,
            max_items: 20,
            se_threshold: 0.3,
            starting_theta: 0.0,
            policy: SelectionPolicy::MaxInfo,
            prior_mean: 0.0,
            prior_sd: 1.0,
            seed: None,
        }
    }
}

impl CatConfig {
    /// Check ranges and cross-field constraints.
    pub fn validate(&self) -> Result<(), CatError> {
        if self.min_items == 0 {
            return Err(CatError::InvalidConfig(
                "min_items must be at least 1".into(),
            ));
        }
        if self.min_items > self.max_items {
            return Err(CatError::InvalidConfig(format!(
                "min_items ({}) exceeds max_items ({})",
                self.min_items, self.max_items
            )));
        }
        if !(self.se_threshold.is_finite() && self.se_threshold > 0.0) {
            return Err(CatError::InvalidConfig(format!(
                "se_threshold must be positive and finite, got {}",
                self.se_threshold
            )));
        }
        if !self.starting_theta.is_finite() {
            return Err(CatError::InvalidConfig(format!(
                "starting_theta must be finite, got {}",
                self.starting_theta
            )));
        }
        self.prior().validate()
    }

    /// The EAP prior described by this configuration.
    pub fn prior(&self) -> EapPrior {
        EapPrior {
            mean: self.prior_mean,
            sd: self.prior_sd,
        }
    }
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatState {
    Init,
    SelectItem,
    /// Waiting for the answer to the item at this bank position.
    AwaitResponse { position: usize },
    UpdateEstimate,
    CheckStop,
    Terminal(StoppingReason),
}

/// Mutable state of one administration.
///
/// Invariant: `administered.len() == responses.len() == theta_trajectory.len() - 1`
/// whenever the controller is not in the middle of an update.
#[derive(Debug, Clone)]
pub struct Session {
    administered: Vec<String>,
    administered_set: HashSet<String>,
    positions: Vec<usize>,
    responses: Vec<Response>,
    theta_trajectory: Vec<f64>,
    theta: f64,
    standard_error: f64,
}

impl Session {
    fn start(starting_theta: f64) -> Self {
        Self {
            administered: Vec::new(),
            administered_set: HashSet::new(),
            positions: Vec::new(),
            responses: Vec::new(),
            theta_trajectory: vec![starting_theta],
            theta: starting_theta,
            standard_error: f64::INFINITY,
        }
    }

    fn record(&mut self, item: &ItemParameters, position: usize, response: Response) {
        self.administered.push(item.item_id.clone());
        self.administered_set.insert(item.item_id.clone());
        self.positions.push(position);
        self.responses.push(response);
    }

    pub fn administered(&self) -> &[String] {
        &self.administered
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn theta_trajectory(&self) -> &[f64] {
        &self.theta_trajectory
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn standard_error(&self) -> f64 {
        self.standard_error
    }

    pub fn len(&self) -> usize {
        self.administered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.administered.is_empty()
    }
}

/// One adaptive administration over a shared item bank.
pub struct AdaptiveTest {
    bank: ItemBank,
    config: CatConfig,
    prior: EapPrior,
    grid: QuadratureGrid,
    rng: ChaCha8Rng,
    state: CatState,
    session: Session,
    result: Option<AssessmentResult>,
}

impl AdaptiveTest {
    /// Create a controller, seeding the selector RNG from `config.seed`.
    pub fn new(bank: ItemBank, config: CatConfig) -> Result<Self, CatError> {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(bank, config, rng)
    }

    /// Create a controller with an explicit selector RNG.
    pub fn with_rng(bank: ItemBank, config: CatConfig, rng: ChaCha8Rng) -> Result<Self, CatError> {
        config.validate()?;

        let prior = config.prior();
        let starting_theta = config.starting_theta;
        Ok(Self {
            bank,
            config,
            prior,
            grid: QuadratureGrid::standard(),
            rng,
            state: CatState::Init,
            session: Session::start(starting_theta),
            result: None,
        })
    }

    pub fn state(&self) -> CatState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &CatConfig {
        &self.config
    }

    pub fn bank(&self) -> &ItemBank {
        &self.bank
    }

    /// The final result, once the session is terminal.
    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, CatState::Terminal(_))
    }

    /// The item currently awaiting a response, if any.
    pub fn pending_item(&self) -> Option<&ItemParameters> {
        match self.state {
            CatState::AwaitResponse { position } => self.bank.items().get(position),
            _ => None,
        }
    }

    /// Advance the state machine by exactly one transition.
    ///
    /// A failing response source leaves the controller in `AwaitResponse`,
    /// so the caller may retry the same item. Stepping a terminal session is
    /// a no-op.
    pub fn step(
        &mut self,
        source: &mut dyn ResponseSource,
        observer: &dyn SessionObserver,
    ) -> Result<CatState, CatError> {
        let current = self.state;
        self.state = match current {
            CatState::Init => {
                self.session = Session::start(self.config.starting_theta);
                CatState::SelectItem
            }
            CatState::SelectItem => self.select_item(observer),
            CatState::AwaitResponse { position } => self.await_response(position, source, observer)?,
            CatState::UpdateEstimate => self.update_estimate(observer)?,
            CatState::CheckStop => self.check_stop(observer),
            terminal @ CatState::Terminal(_) => terminal,
        };
        Ok(self.state)
    }

    /// Run the session to completion.
    pub fn run(
        &mut self,
        source: &mut dyn ResponseSource,
        observer: &dyn SessionObserver,
    ) -> Result<AssessmentResult, CatError> {
        while !self.is_finished() {
            self.step(source, observer)?;
        }
        self.result
            .clone()
            .ok_or_else(|| CatError::InvalidConfig("session ended without a result".into()))
    }

    fn select_item(&mut self, observer: &dyn SessionObserver) -> CatState {
        let chosen = select_next_item(
            self.bank.items(),
            self.session.theta,
            &self.session.administered_set,
            self.config.policy,
            &mut self.rng,
        )
        .and_then(|item| self.bank.position(&item.item_id));

        match chosen {
            Some(position) => CatState::AwaitResponse { position },
            None => self.finish(StoppingReason::ItemBankExhausted, observer),
        }
    }

    fn await_response(
        &mut self,
        position: usize,
        source: &mut dyn ResponseSource,
        observer: &dyn SessionObserver,
    ) -> Result<CatState, CatError> {
        let item = &self.bank.items()[position];
        let response = source
            .respond(item)
            .map_err(|e| CatError::ResponseSource {
                item_id: item.item_id.clone(),
                message: format!("{e:#}"),
            })?;

        self.session.record(item, position, response);
        let count = self.session.len();
        tracing::debug!(
            item_id = %item.item_id,
            position = count,
            response = %response,
            "item administered"
        );
        observer.on_item_administered(count, item, response);
        Ok(CatState::UpdateEstimate)
    }

    fn update_estimate(&mut self, observer: &dyn SessionObserver) -> Result<CatState, CatError> {
        let items: Vec<&ItemParameters> = self
            .session
            .positions
            .iter()
            .map(|&pos| &self.bank.items()[pos])
            .collect();
        let estimate = self
            .grid
            .estimate(&self.session.responses, &items, &self.prior)?;

        self.session.theta = estimate.theta;
        self.session.standard_error = estimate.standard_error;
        self.session.theta_trajectory.push(estimate.theta);
        observer.on_estimate_updated(estimate.theta, estimate.standard_error);
        Ok(CatState::CheckStop)
    }

    fn check_stop(&mut self, observer: &dyn SessionObserver) -> CatState {
        let count = self.session.len();
        if count >= self.config.min_items && self.session.standard_error < self.config.se_threshold
        {
            self.finish(StoppingReason::SeThresholdReached, observer)
        } else if count >= self.config.max_items {
            self.finish(StoppingReason::MaxItemsReached, observer)
        } else {
            CatState::SelectItem
        }
    }

    fn finish(&mut self, reason: StoppingReason, observer: &dyn SessionObserver) -> CatState {
        let se = self.session.standard_error;
        let reliability = 1.0 - se * se;
        if reliability < 0.0 {
            tracing::warn!(
                standard_error = se,
                reliability,
                "standard error above 1, reliability is negative"
            );
        }

        let result = AssessmentResult {
            estimated_theta: self.session.theta,
            standard_error: se,
            administered_items: self.session.administered.clone(),
            responses: self.session.responses.clone(),
            theta_trajectory: self.session.theta_trajectory.clone(),
            stopping_reason: reason,
            total_items: self.session.len(),
            reliability,
        };

        tracing::info!(
            theta = result.estimated_theta,
            se = result.standard_error,
            items = result.total_items,
            reason = %reason,
            "assessment complete"
        );
        observer.on_complete(&result);
        self.result = Some(result);
        CatState::Terminal(reason)
    }
}

/// Administer a complete adaptive test, collecting answers from `source`.
pub fn administer_test(
    bank: &ItemBank,
    config: &CatConfig,
    source: &mut dyn ResponseSource,
) -> Result<AssessmentResult, CatError> {
    AdaptiveTest::new(bank.clone(), config.clone())?.run(source, &NoopObserver)
}
