//! End-to-end scenarios through the public API.

use std::collections::HashSet;

use irtcat_core::parser::{export_item_bank_json, parse_item_bank_json};
use irtcat_core::traits::ScriptedResponses;
use irtcat_core::{
    administer_test, estimate_ability_mle, simulate_test, standard_error, CatConfig, ItemBank,
    ItemParameters, Response, SelectionPolicy, StoppingReason,
};

fn scenario_a_bank() -> ItemBank {
    let items = (0..10)
        .map(|i| {
            let difficulty = -2.0 + 4.5 * i as f64 / 9.0;
            let discrimination = 1.1 + 0.7 * i as f64 / 9.0;
            ItemParameters::two_pl(format!("item_{i}"), difficulty, discrimination).unwrap()
        })
        .collect();
    ItemBank::new(items).unwrap()
}

fn scenario_a_config() -> CatConfig {
    CatConfig {
        min_items: 5,
        max_items: 10,
        se_threshold: 0.4,
        policy: SelectionPolicy::MaxInfo,
        ..Default::default()
    }
}

#[test]
fn scenario_a_simulated_session_terminates_in_range() {
    let bank = scenario_a_bank();
    let config = scenario_a_config();

    for seed in 0..25 {
        let result = simulate_test(&bank, &config, 1.0, seed).unwrap();
        assert!(
            (5..=10).contains(&result.total_items),
            "seed {seed}: {} items",
            result.total_items
        );
        assert!(StoppingReason::ALL.contains(&result.stopping_reason));
        assert_eq!(result.administered_items.len(), result.total_items);
        assert_eq!(result.responses.len(), result.total_items);
        assert_eq!(result.theta_trajectory.len(), result.total_items + 1);
        assert!(result.standard_error.is_finite());
    }
}

#[test]
fn scenario_a_bank_is_never_over_administered() {
    let bank = scenario_a_bank();
    let config = CatConfig {
        se_threshold: 1e-6,
        ..scenario_a_config()
    };
    let result = simulate_test(&bank, &config, 1.0, 3).unwrap();
    assert_eq!(result.total_items, 10);
    // The tenth item is the last one in the bank, max_items fires first.
    assert_eq!(result.stopping_reason, StoppingReason::MaxItemsReached);

    let unique: HashSet<&String> = result.administered_items.iter().collect();
    assert_eq!(unique.len(), 10);
}

fn three_items() -> Vec<ItemParameters> {
    vec![
        ItemParameters::two_pl("b-1", -1.0, 1.0).unwrap(),
        ItemParameters::two_pl("b0", 0.0, 1.0).unwrap(),
        ItemParameters::two_pl("b1", 1.0, 1.0).unwrap(),
    ]
}

#[test]
fn scenario_b_mle_all_correct() {
    let responses = [Response::Correct; 3];
    let estimate = estimate_ability_mle(&responses, &three_items(), 0.0).unwrap();
    assert_eq!((estimate.theta, estimate.standard_error), (3.0, 1.0));
}

#[test]
fn scenario_c_mle_all_incorrect() {
    let responses = [Response::Incorrect; 3];
    let estimate = estimate_ability_mle(&responses, &three_items(), 0.0).unwrap();
    assert_eq!((estimate.theta, estimate.standard_error), (-3.0, 1.0));
}

#[test]
fn scenario_d_empty_standard_error_is_infinite() {
    let items: Vec<ItemParameters> = Vec::new();
    assert_eq!(standard_error(0.0, &items), f64::INFINITY);
}

#[test]
fn scripted_session_replays_exactly() {
    let bank = scenario_a_bank();
    let config = CatConfig {
        seed: Some(1),
        ..scenario_a_config()
    };

    let mut first = ScriptedResponses::always(Response::Correct);
    let a = administer_test(&bank, &config, &mut first).unwrap();
    let mut second = ScriptedResponses::always(Response::Correct);
    let b = administer_test(&bank, &config, &mut second).unwrap();

    assert_eq!(a, b);
    assert_eq!(first.asked(), a.administered_items.as_slice());
}

#[test]
fn all_correct_session_climbs() {
    let bank = scenario_a_bank();
    let mut source = ScriptedResponses::always(Response::Correct);
    let result = administer_test(&bank, &scenario_a_config(), &mut source).unwrap();

    let trajectory = &result.theta_trajectory;
    assert_eq!(trajectory[0], 0.0);
    assert!(trajectory.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn bank_roundtrip_through_json() {
    let bank = scenario_a_bank();
    let json = export_item_bank_json(&bank).unwrap();
    let back = parse_item_bank_json(&json).unwrap();
    assert_eq!(back.items(), bank.items());
}
