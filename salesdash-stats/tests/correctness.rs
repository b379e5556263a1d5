//! Correctness tests for salesdash-stats.
//!
//! Validates that:
//! 1. Min-max scaling stays inside [0, 1]
//! 2. Z-scores of any non-constant series have mean 0 and population std 1
//! 3. Constant series never produce non-zero z-scores
//! 4. OLS recovers exact lines and extrapolates them
//! 5. Centered moving averages leave exactly half a window undefined per edge

use proptest::prelude::*;
use salesdash_stats::defaults::{DAILY_CYCLE, MONTHLY_CYCLE};
use salesdash_stats::math::{
    centered_moving_average, linear_fit, mean, min_max_normalize, population_std_dev, z_scores,
};

fn finite_series() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6..1.0e6f64, 2..60)
}

proptest! {
    #[test]
    fn normalized_values_are_unit_bounded(values in finite_series()) {
        for v in min_max_normalize(&values) {
            prop_assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn z_scores_are_standardized(values in finite_series()) {
        prop_assume!(population_std_dev(&values) > 1e-3);
        let z = z_scores(&values);
        prop_assert!(mean(&z).abs() < 1e-6);
        prop_assert!((population_std_dev(&z) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn constant_series_scores_zero(value in -1.0e6..1.0e6f64, len in 1usize..40) {
        let values = vec![value; len];
        prop_assert!(z_scores(&values).iter().all(|z| *z == 0.0));
        prop_assert!(min_max_normalize(&values).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn ols_recovers_lines(
        intercept in -1.0e3..1.0e3f64,
        slope in -50.0..50.0f64,
        len in 2usize..50,
    ) {
        let values: Vec<f64> = (0..len).map(|i| intercept + slope * i as f64).collect();
        let fit = linear_fit(&values).unwrap();
        prop_assert!((fit.slope - slope).abs() < 1e-6);
        prop_assert!((fit.intercept - intercept).abs() < 1e-6);
        let next = fit.predict(len as f64);
        prop_assert!((next - (intercept + slope * len as f64)).abs() < 1e-5);
    }
}

#[test]
fn weekly_window_leaves_three_days_per_edge() {
    let values: Vec<f64> = (0..14).map(|i| i as f64).collect();
    let ma = centered_moving_average(&values, DAILY_CYCLE);
    let defined: Vec<usize> = ma
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    assert_eq!(defined.first(), Some(&3));
    assert_eq!(defined.last(), Some(&10));
}

#[test]
fn yearly_window_leaves_six_months_per_edge() {
    let values: Vec<f64> = (0..24).map(|i| (i % 12) as f64).collect();
    let ma = centered_moving_average(&values, MONTHLY_CYCLE);
    assert!(ma[..6].iter().all(Option::is_none));
    assert!(ma[18..].iter().all(Option::is_none));
    // A purely periodic signal has a flat trend equal to its cycle mean.
    for v in ma[6..18].iter().flatten() {
        assert!((v - 5.5).abs() < 1e-9, "trend was {}", v);
    }
}
