//! Engine error types.
//!
//! Configuration errors (bad tags, mismatched inputs, invalid settings) fail
//! fast. Degenerate numeric states such as an empty item set are not errors;
//! they are reported through sentinel values like an infinite standard error.

use thiserror::Error;

/// Errors raised by the IRT/CAT engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatError {
    /// An item's model tag is not one of the supported variants.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The selection policy tag is not recognised.
    #[error("unknown selection policy: {0}")]
    UnknownPolicy(String),

    /// Responses and items must be parallel sequences.
    #[error("responses and items differ in length ({responses} responses, {items} items)")]
    LengthMismatch { responses: usize, items: usize },

    /// MLE needs at least one response.
    #[error("no responses to estimate from")]
    EmptyResponses,

    /// A response outside {0, 1}.
    #[error("invalid response {0}, expected 0 or 1")]
    InvalidResponse(i64),

    /// Item parameters failed validation.
    #[error("invalid item '{item_id}': {reason}")]
    InvalidItem { item_id: String, reason: String },

    /// Two items in one bank share an id.
    #[error("duplicate item id: {0}")]
    DuplicateItem(String),

    /// An item id that is not in the bank.
    #[error("unknown item id: {0}")]
    UnknownItem(String),

    /// Controller or estimator settings are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The response source could not produce an answer.
    #[error("response source failed for item '{item_id}': {message}")]
    ResponseSource { item_id: String, message: String },
}

impl CatError {
    /// Returns `true` for errors caused by bad caller input rather than by a
    /// collaborator failing at run time.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, CatError::ResponseSource { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            CatError::UnknownModel("4PL".into()).to_string(),
            "unknown model: 4PL"
        );
        assert_eq!(
            CatError::LengthMismatch {
                responses: 3,
                items: 2
            }
            .to_string(),
            "responses and items differ in length (3 responses, 2 items)"
        );
    }

    #[test]
    fn classification() {
        assert!(CatError::UnknownPolicy("greedy".into()).is_configuration());
        assert!(!CatError::ResponseSource {
            item_id: "q1".into(),
            message: "closed".into()
        }
        .is_configuration());
    }
}
