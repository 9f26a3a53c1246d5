//! irtcat-core: item response theory models and computerized adaptive testing.
//!
//! This crate defines the item data model, the 1PL/2PL/3PL response models,
//! ability estimation (MLE and EAP), next-item selection, and the adaptive
//! test controller that ties them together. The simulation harness and
//! report types sit on top of the controller.

pub mod config;
pub mod engine;
pub mod error;
pub mod estimation;
pub mod irt;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod selection;
pub mod simulation;
pub mod statistics;
pub mod traits;

pub use engine::{administer_test, AdaptiveTest, CatConfig, CatState};
pub use error::CatError;
pub use estimation::{estimate_ability_eap, estimate_ability_mle, AbilityEstimate};
pub use irt::{information, probability, standard_error, test_information};
pub use model::{IrtModel, ItemBank, ItemParameters, Response};
pub use results::{AssessmentResult, StoppingReason};
pub use selection::{select_next_item, SelectionPolicy};
pub use simulation::{simulate_batch, simulate_test, SimulatedExaminee, SimulationRun};
pub use traits::{ResponseSource, SessionObserver};
