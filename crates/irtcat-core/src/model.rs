//! Core data model types for irtcat.
//!
//! Calibrated item parameters, the read-only item bank that sessions share,
//! and the dichotomous response type.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CatError;

/// IRT model variant of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IrtModel {
    /// One-parameter logistic (Rasch). Discrimination is fixed at 1 and
    /// guessing at 0 regardless of the stored values.
    Rasch,
    /// Two-parameter logistic.
    TwoPl,
    /// Three-parameter logistic with a lower asymptote.
    ThreePl,
}

impl fmt::Display for IrtModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrtModel::Rasch => write!(f, "1PL"),
            IrtModel::TwoPl => write!(f, "2PL"),
            IrtModel::ThreePl => write!(f, "3PL"),
        }
    }
}

impl FromStr for IrtModel {
    type Err = CatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1pl" | "rasch" => Ok(IrtModel::Rasch),
            "2pl" => Ok(IrtModel::TwoPl),
            "3pl" => Ok(IrtModel::ThreePl),
            _ => Err(CatError::UnknownModel(s.to_string())),
        }
    }
}

impl TryFrom<String> for IrtModel {
    type Error = CatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IrtModel> for String {
    fn from(model: IrtModel) -> Self {
        model.to_string()
    }
}

/// Calibrated parameters for one test item.
///
/// Items are produced by an external calibration step and never change while
/// a session references them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemParameters {
    /// Unique key within a bank.
    pub item_id: String,
    /// Location `b` on the ability scale.
    pub difficulty: f64,
    /// Slope `a`.
    #[serde(default = "default_discrimination")]
    pub discrimination: f64,
    /// Lower asymptote `c`, in `[0, 1)`.
    #[serde(default)]
    pub guessing: f64,
    /// Model variant.
    pub model: IrtModel,
}

fn default_discrimination() -> f64 {
    1.0
}

impl ItemParameters {
    /// Build and validate an item.
    pub fn new(
        item_id: impl Into<String>,
        difficulty: f64,
        discrimination: f64,
        guessing: f64,
        model: IrtModel,
    ) -> Result<Self, CatError> {
        let item = Self {
            item_id: item_id.into(),
            difficulty,
            discrimination,
            guessing,
            model,
        };
        item.validate()?;
        Ok(item)
    }

    /// A Rasch item with the given difficulty.
    pub fn rasch(item_id: impl Into<String>, difficulty: f64) -> Result<Self, CatError> {
        Self::new(item_id, difficulty, 1.0, 0.0, IrtModel::Rasch)
    }

    /// A 2PL item.
    pub fn two_pl(
        item_id: impl Into<String>,
        difficulty: f64,
        discrimination: f64,
    ) -> Result<Self, CatError> {
        Self::new(item_id, difficulty, discrimination, 0.0, IrtModel::TwoPl)
    }

    /// A 3PL item.
    pub fn three_pl(
        item_id: impl Into<String>,
        difficulty: f64,
        discrimination: f64,
        guessing: f64,
    ) -> Result<Self, CatError> {
        Self::new(item_id, difficulty, discrimination, guessing, IrtModel::ThreePl)
    }

    /// Check the structural invariants of the parameters.
    pub fn validate(&self) -> Result<(), CatError> {
        let invalid = |reason: &str| CatError::InvalidItem {
            item_id: self.item_id.clone(),
            reason: reason.to_string(),
        };

        if self.item_id.trim().is_empty() {
            return Err(invalid("item id is empty"));
        }
        if !self.difficulty.is_finite() {
            return Err(invalid("difficulty must be finite"));
        }
        if !self.discrimination.is_finite() {
            return Err(invalid("discrimination must be finite"));
        }
        if !(0.0..1.0).contains(&self.guessing) {
            return Err(invalid("guessing must lie in [0, 1)"));
        }
        Ok(())
    }

    /// Slope actually used by the response model.
    pub fn effective_discrimination(&self) -> f64 {
        match self.model {
            IrtModel::Rasch => 1.0,
            IrtModel::TwoPl | IrtModel::ThreePl => self.discrimination,
        }
    }

    /// Lower asymptote actually used by the response model.
    pub fn effective_guessing(&self) -> f64 {
        match self.model {
            IrtModel::Rasch | IrtModel::TwoPl => 0.0,
            IrtModel::ThreePl => self.guessing,
        }
    }
}

/// An ordered, read-only collection of items with unique ids.
///
/// Cloning is cheap: clones share the same underlying storage, so any number
/// of concurrent sessions can hold the same bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<ItemParameters>", into = "Vec<ItemParameters>")]
pub struct ItemBank {
    items: Arc<[ItemParameters]>,
    index: Arc<HashMap<String, usize>>,
}

impl ItemBank {
    /// Build a bank, validating every item and rejecting duplicate ids.
    pub fn new(items: Vec<ItemParameters>) -> Result<Self, CatError> {
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            item.validate()?;
            if index.insert(item.item_id.clone(), pos).is_some() {
                return Err(CatError::DuplicateItem(item.item_id.clone()));
            }
        }
        Ok(Self {
            items: items.into(),
            index: Arc::new(index),
        })
    }

    /// Items in bank order.
    pub fn items(&self) -> &[ItemParameters] {
        &self.items
    }

    /// Look up an item by id.
    pub fn get(&self, item_id: &str) -> Option<&ItemParameters> {
        self.index.get(item_id).map(|&pos| &self.items[pos])
    }

    /// Position of an item in bank order.
    pub fn position(&self, item_id: &str) -> Option<usize> {
        self.index.get(item_id).copied()
    }

    /// Resolve a list of ids to their items, failing on the first unknown id.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<ItemParameters>, CatError> {
        ids.iter()
            .map(|id| {
                self.get(id.as_ref())
                    .cloned()
                    .ok_or_else(|| CatError::UnknownItem(id.as_ref().to_string()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemParameters> {
        self.items.iter()
    }
}

impl TryFrom<Vec<ItemParameters>> for ItemBank {
    type Error = CatError;

    fn try_from(items: Vec<ItemParameters>) -> Result<Self, Self::Error> {
        ItemBank::new(items)
    }
}

impl From<ItemBank> for Vec<ItemParameters> {
    fn from(bank: ItemBank) -> Self {
        bank.items.to_vec()
    }
}

impl<'a> IntoIterator for &'a ItemBank {
    type Item = &'a ItemParameters;
    type IntoIter = std::slice::Iter<'a, ItemParameters>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A scored dichotomous response, serialised as `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Response {
    Incorrect = 0,
    Correct = 1,
}

impl Response {
    pub fn is_correct(self) -> bool {
        self == Response::Correct
    }

    /// The response as `0.0` / `1.0`.
    pub fn as_f64(self) -> f64 {
        match self {
            Response::Incorrect => 0.0,
            Response::Correct => 1.0,
        }
    }
}

impl From<bool> for Response {
    fn from(correct: bool) -> Self {
        if correct {
            Response::Correct
        } else {
            Response::Incorrect
        }
    }
}

impl TryFrom<i64> for Response {
    type Error = CatError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Response::Incorrect),
            1 => Ok(Response::Correct),
            other => Err(CatError::InvalidResponse(other)),
        }
    }
}

impl TryFrom<u8> for Response {
    type Error = CatError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Response::try_from(i64::from(value))
    }
}

impl From<Response> for u8 {
    fn from(response: Response) -> Self {
        response as u8
    }
}

impl FromStr for Response {
    type Err = CatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| CatError::InvalidConfig(format!("not a response: '{trimmed}'")))?;
        Response::try_from(value)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}
