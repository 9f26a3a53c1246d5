//! Trait seams between the adaptive test controller and its collaborators.
//!
//! A [`ResponseSource`] answers items (a live examinee, a replayed record,
//! or the simulation harness). A [`SessionObserver`] is told about progress.

use std::collections::HashMap;

use crate::model::{ItemParameters, Response};
use crate::results::AssessmentResult;

// ---------------------------------------------------------------------------
// Response source
// ---------------------------------------------------------------------------

/// Supplies the examinee's answer to one item.
///
/// The engine places no constraint on how the answer is obtained; it only
/// requires a dichotomous result or an error.
pub trait ResponseSource {
    /// Answer `item`.
    fn respond(&mut self, item: &ItemParameters) -> anyhow::Result<Response>;
}

impl<F> ResponseSource for F
where
    F: FnMut(&ItemParameters) -> anyhow::Result<Response>,
{
    fn respond(&mut self, item: &ItemParameters) -> anyhow::Result<Response> {
        self(item)
    }
}

/// Fixed answers keyed by item id, for replaying a recorded session or
/// driving the controller in tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResponses {
    answers: HashMap<String, Response>,
    fallback: Option<Response>,
    asked: Vec<String>,
}

impl ScriptedResponses {
    pub fn new(answers: HashMap<String, Response>) -> Self {
        Self {
            answers,
            fallback: None,
            asked: Vec::new(),
        }
    }

    /// A script that gives the same answer to every item.
    pub fn always(response: Response) -> Self {
        Self {
            answers: HashMap::new(),
            fallback: Some(response),
            asked: Vec::new(),
        }
    }

    /// Answer used for items without a scripted response.
    pub fn with_fallback(mut self, response: Response) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Item ids in the order they were asked.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl ResponseSource for ScriptedResponses {
    fn respond(&mut self, item: &ItemParameters) -> anyhow::Result<Response> {
        self.asked.push(item.item_id.clone());
        self.answers
            .get(&item.item_id)
            .copied()
            .or(self.fallback)
            .ok_or_else(|| anyhow::anyhow!("no scripted response for item '{}'", item.item_id))
    }
}

// ---------------------------------------------------------------------------
// Session observer
// ---------------------------------------------------------------------------

/// Progress hooks for an administration.
pub trait SessionObserver {
    fn on_item_administered(&self, position: usize, item: &ItemParameters, response: Response);
    fn on_estimate_updated(&self, theta: f64, standard_error: f64);
    fn on_complete(&self, result: &AssessmentResult);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_item_administered(&self, _: usize, _: &ItemParameters, _: Response) {}
    fn on_estimate_updated(&self, _: f64, _: f64) {}
    fn on_complete(&self, _: &AssessmentResult) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_answers_and_fallback() {
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), Response::Correct);
        let mut script = ScriptedResponses::new(answers);

        let q1 = ItemParameters::rasch("q1", 0.0).unwrap();
        let q2 = ItemParameters::rasch("q2", 0.0).unwrap();

        assert_eq!(script.respond(&q1).unwrap(), Response::Correct);
        assert!(script.respond(&q2).is_err());

        let mut script = script.with_fallback(Response::Incorrect);
        assert_eq!(script.respond(&q2).unwrap(), Response::Incorrect);
        assert_eq!(script.asked(), &["q1", "q2", "q2"]);
    }

    #[test]
    fn closures_are_response_sources() {
        let mut calls = 0;
        let mut source = |item: &ItemParameters| {
            calls += 1;
            Ok::<_, anyhow::Error>(Response::from(item.difficulty < 0.0))
        };
        let easy = ItemParameters::rasch("e", -1.0).unwrap();
        assert_eq!(source.respond(&easy).unwrap(), Response::Correct);
        drop(source);
        assert_eq!(calls, 1);
    }
}
