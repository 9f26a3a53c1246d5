//! Next-item selection policies.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CatError;
use crate::irt::information;
use crate::model::ItemParameters;

/// How the next item is chosen from the remaining bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectionPolicy {
    /// Maximum Fisher information at the current estimate.
    #[default]
    MaxInfo,
    /// Difficulty closest to the current estimate.
    DifficultyMatch,
    /// Uniformly random; only for comparison runs.
    Random,
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::MaxInfo => write!(f, "max_info"),
            SelectionPolicy::DifficultyMatch => write!(f, "difficulty_match"),
            SelectionPolicy::Random => write!(f, "random"),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = CatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "max_info" => Ok(SelectionPolicy::MaxInfo),
            "difficulty_match" => Ok(SelectionPolicy::DifficultyMatch),
            "random" => Ok(SelectionPolicy::Random),
            _ => Err(CatError::UnknownPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for SelectionPolicy {
    type Error = CatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SelectionPolicy> for String {
    fn from(policy: SelectionPolicy) -> Self {
        policy.to_string()
    }
}

/// First eligible item attaining the maximum of `score`.
fn first_max_by<'a, F>(eligible: &[&'a ItemParameters], score: F) -> Option<&'a ItemParameters>
where
    F: Fn(&ItemParameters) -> f64,
{
    let mut best: Option<(&ItemParameters, f64)> = None;
    for &item in eligible {
        let value = score(item);
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((item, value)),
        }
    }
    best.map(|(item, _)| item)
}

/// Choose the next item to administer.
///
/// Items whose id is in `administered` are never returned. Returns `None`
/// exactly when every item has been administered. Deterministic policies
/// break ties by bank order; `rng` is only consulted by
/// [`SelectionPolicy::Random`].
pub fn select_next_item<'a, R>(
    items: &'a [ItemParameters],
    theta: f64,
    administered: &HashSet<String>,
    policy: SelectionPolicy,
    rng: &mut R,
) -> Option<&'a ItemParameters>
where
    R: Rng + ?Sized,
{
    let eligible: Vec<&ItemParameters> = items
        .iter()
        .filter(|item| !administered.contains(&item.item_id))
        .collect();

    if eligible.is_empty() {
        return None;
    }

    match policy {
        SelectionPolicy::MaxInfo => first_max_by(&eligible, |item| information(theta, item)),
        SelectionPolicy::DifficultyMatch => {
            first_max_by(&eligible, |item| -(item.difficulty - theta).abs())
        }
        SelectionPolicy::Random => eligible.choose(rng).copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn bank() -> Vec<ItemParameters> {
        vec![
            ItemParameters::two_pl("easy", -2.0, 1.0).unwrap(),
            ItemParameters::two_pl("mid", 0.0, 1.0).unwrap(),
            ItemParameters::two_pl("mid_sharp", 0.1, 2.0).unwrap(),
            ItemParameters::two_pl("hard", 2.0, 1.0).unwrap(),
        ]
    }

    fn ids(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn policy_display_and_parse() {
        assert_eq!(SelectionPolicy::MaxInfo.to_string(), "max_info");
        assert_eq!(
            "difficulty-match".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::DifficultyMatch
        );
        assert_eq!(
            "RANDOM".parse::<SelectionPolicy>().unwrap(),
            SelectionPolicy::Random
        );
        assert_eq!(
            "greedy".parse::<SelectionPolicy>(),
            Err(CatError::UnknownPolicy("greedy".into()))
        );
    }

    #[test]
    fn max_info_picks_most_informative() {
        let items = bank();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let chosen =
            select_next_item(&items, 0.0, &HashSet::new(), SelectionPolicy::MaxInfo, &mut rng);
        assert_eq!(chosen.unwrap().item_id, "mid_sharp");
    }

    #[test]
    fn max_info_skips_administered() {
        let items = bank();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let chosen = select_next_item(
            &items,
            0.0,
            &ids(&["mid_sharp"]),
            SelectionPolicy::MaxInfo,
            &mut rng,
        );
        assert_eq!(chosen.unwrap().item_id, "mid");
    }

    #[test]
    fn ties_break_by_bank_order() {
        let items = vec![
            ItemParameters::rasch("first", 1.0).unwrap(),
            ItemParameters::rasch("second", -1.0).unwrap(),
            ItemParameters::rasch("third", 1.0).unwrap(),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for policy in [SelectionPolicy::MaxInfo, SelectionPolicy::DifficultyMatch] {
            let chosen = select_next_item(&items, 0.0, &HashSet::new(), policy, &mut rng);
            assert_eq!(chosen.unwrap().item_id, "first", "{policy}");
        }
    }

    #[test]
    fn difficulty_match_picks_nearest() {
        let items = bank();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let chosen = select_next_item(
            &items,
            1.6,
            &HashSet::new(),
            SelectionPolicy::DifficultyMatch,
            &mut rng,
        );
        assert_eq!(chosen.unwrap().item_id, "hard");
    }

    #[test]
    fn random_is_reproducible_with_seed() {
        let items = bank();
        let pick = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..8)
                .map(|_| {
                    select_next_item(
                        &items,
                        0.0,
                        &HashSet::new(),
                        SelectionPolicy::Random,
                        &mut rng,
                    )
                    .unwrap()
                    .item_id
                    .clone()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(pick(7), pick(7));
    }

    #[test]
    fn random_never_repeats_administered() {
        let items = bank();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let administered = ids(&["easy", "mid", "hard"]);
        for _ in 0..20 {
            let chosen = select_next_item(
                &items,
                0.0,
                &administered,
                SelectionPolicy::Random,
                &mut rng,
            );
            assert_eq!(chosen.unwrap().item_id, "mid_sharp");
        }
    }

    #[test]
    fn exhausted_bank_returns_none() {
        let items = bank();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let all = ids(&["easy", "mid", "mid_sharp", "hard"]);
        for policy in [
            SelectionPolicy::MaxInfo,
            SelectionPolicy::DifficultyMatch,
            SelectionPolicy::Random,
        ] {
            assert!(select_next_item(&items, 0.0, &all, policy, &mut rng).is_none());
        }
    }
}
