//! IRT response model: response probability and Fisher information.
//!
//! Dispatch is a `match` on [`IrtModel`], so every item reaching these
//! functions has a supported model and none of them can fail.

use crate::model::{IrtModel, ItemParameters};

/// Numerically stable logistic function.
#[inline]
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let exp_x = x.exp();
        exp_x / (1.0 + exp_x)
    }
}

/// Probability of a correct response at ability `theta`.
///
/// Lies in `[0, 1]` for 1PL/2PL items and in `[c, 1]` for 3PL items.
pub fn probability(theta: f64, item: &ItemParameters) -> f64 {
    match item.model {
        IrtModel::Rasch => sigmoid(theta - item.difficulty),
        IrtModel::TwoPl => sigmoid(item.discrimination * (theta - item.difficulty)),
        IrtModel::ThreePl => {
            let c = item.guessing;
            c + (1.0 - c) * sigmoid(item.discrimination * (theta - item.difficulty))
        }
    }
}

/// Fisher information of an item at ability `theta`. Never negative.
pub fn information(theta: f64, item: &ItemParameters) -> f64 {
    let p = probability(theta, item);
    let q = 1.0 - p;
    let pq = p * q;

    let info = match item.model {
        IrtModel::Rasch => pq,
        IrtModel::TwoPl => item.discrimination * item.discrimination * pq,
        IrtModel::ThreePl => {
            // p*q underflows to zero far from b; the limit there is zero too.
            if pq <= 0.0 {
                return 0.0;
            }
            let a = item.discrimination;
            let c = item.guessing;
            a * a * (p - c).powi(2) / ((1.0 - c).powi(2) * pq)
        }
    };

    info.max(0.0)
}

/// Sum of item information over `items`.
pub fn test_information<'a, I>(theta: f64, items: I) -> f64
where
    I: IntoIterator<Item = &'a ItemParameters>,
{
    items.into_iter().map(|item| information(theta, item)).sum()
}

/// Standard error of measurement at `theta`.
///
/// Returns `f64::INFINITY` when the items carry no information, which is
/// the expected state before any item has been administered.
pub fn standard_error<'a, I>(theta: f64, items: I) -> f64
where
    I: IntoIterator<Item = &'a ItemParameters>,
{
    let info = test_information(theta, items);
    if info <= 0.0 {
        f64::INFINITY
    } else {
        1.0 / info.sqrt()
    }
}

/// Item characteristic curve: `probability` evaluated at each theta.
pub fn item_characteristic_curve(item: &ItemParameters, thetas: &[f64]) -> Vec<f64> {
    thetas.iter().map(|&theta| probability(theta, item)).collect()
}

/// Test information evaluated at each theta.
pub fn test_information_curve(items: &[ItemParameters], thetas: &[f64]) -> Vec<f64> {
    thetas
        .iter()
        .map(|&theta| test_information(theta, items))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn probability_at_difficulty() {
        let rasch = ItemParameters::rasch("r", 0.7).unwrap();
        let two = ItemParameters::two_pl("t", -0.3, 1.8).unwrap();
        let three = ItemParameters::three_pl("h", 1.0, 1.2, 0.2).unwrap();

        assert!(close(probability(0.7, &rasch), 0.5));
        assert!(close(probability(-0.3, &two), 0.5));
        assert!(close(probability(1.0, &three), 0.2 + 0.8 * 0.5));
    }

    #[test]
    fn rasch_ignores_stored_discrimination() {
        let item = ItemParameters::new("r", 0.0, 3.0, 0.4, IrtModel::Rasch).unwrap();
        let expected = 1.0 / (1.0 + (-1.0f64).exp());
        assert!(close(probability(1.0, &item), expected));
        assert!(close(information(1.0, &item), expected * (1.0 - expected)));
    }

    #[test]
    fn extreme_theta_is_finite() {
        let item = ItemParameters::two_pl("t", 0.0, 2.5).unwrap();
        for theta in [-1000.0, -10.0, 10.0, 1000.0] {
            let p = probability(theta, &item);
            assert!(p.is_finite() && (0.0..=1.0).contains(&p), "p={p}");
            let info = information(theta, &item);
            assert!(info.is_finite() && info >= 0.0, "info={info}");
        }
    }

    #[test]
    fn three_pl_lower_asymptote() {
        let item = ItemParameters::three_pl("h", 0.0, 1.5, 0.25).unwrap();
        let p = probability(-50.0, &item);
        assert!(p >= 0.25 && p < 0.2501);
        assert_eq!(information(-800.0, &item), 0.0);
    }

    #[test]
    fn two_pl_information_peaks_at_difficulty() {
        let item = ItemParameters::two_pl("t", 0.5, 2.0).unwrap();
        assert!(close(information(0.5, &item), 4.0 * 0.25));
        assert!(information(0.5, &item) > information(1.5, &item));
        assert!(information(0.5, &item) > information(-0.5, &item));
    }

    #[test]
    fn standard_error_of_empty_set_is_infinite() {
        let items: Vec<ItemParameters> = Vec::new();
        assert_eq!(test_information(0.0, &items), 0.0);
        assert_eq!(standard_error(0.0, &items), f64::INFINITY);
    }

    #[test]
    fn standard_error_from_information() {
        let items = vec![
            ItemParameters::rasch("a", 0.0).unwrap(),
            ItemParameters::rasch("b", 0.0).unwrap(),
            ItemParameters::rasch("c", 0.0).unwrap(),
            ItemParameters::rasch("d", 0.0).unwrap(),
        ];
        // Four Rasch items at theta == b give 4 * 0.25 = 1.
        assert!(close(test_information(0.0, &items), 1.0));
        assert!(close(standard_error(0.0, &items), 1.0));
    }

    #[test]
    fn curves_match_pointwise_values() {
        let item = ItemParameters::two_pl("t", 0.0, 1.3).unwrap();
        let thetas = [-1.0, 0.0, 1.0];
        let icc = item_characteristic_curve(&item, &thetas);
        assert_eq!(icc.len(), 3);
        assert!(close(icc[1], 0.5));

        let items = vec![item];
        let tic = test_information_curve(&items, &thetas);
        assert!(close(tic[2], information(1.0, &items[0])));
    }
}
