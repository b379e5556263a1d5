//! Shared numeric utilities for the analytics components.

use ndarray::ArrayView1;

const FNV_OFFSET_BASIS: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

/// FNV-1a hash for deterministic table and cache identities.
pub fn fnv1a_hash(data: &[u8]) -> u64 {
    fnv1a_extend(FNV_OFFSET_BASIS, data)
}

/// Continue an FNV-1a hash with more bytes.
pub fn fnv1a_extend(mut hash: u64, data: &[u8]) -> u64 {
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    ArrayView1::from(values).mean().unwrap_or(0.0)
}

/// Population standard deviation (ddof = 0); 0 for fewer than two values.
///
/// Identical values (and floating-point noise around them) give exactly 0 so
/// callers can rely on `== 0.0` for the degenerate case.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 || values.iter().all(|v| *v == values[0]) {
        return 0.0;
    }
    let view = ArrayView1::from(values);
    let std = view.std(0.0);
    let scale = mean(values).abs().max(1.0);
    if !std.is_finite() || std <= 1e-12 * scale {
        0.0
    } else {
        std
    }
}

/// Standardized scores `(v - mean) / std`. All zeros when std is 0.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let std = population_std_dev(values);
    if std == 0.0 {
        return vec![0.0; values.len()];
    }
    let mu = mean(values);
    values.iter().map(|v| (v - mu) / std).collect()
}

/// Min-max scale to [0, 1]. A zero range scales every value to 0.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if values.is_empty() || range == 0.0 || !range.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}

/// Growth of `current` over `prior` in percent, 0 when `prior` is 0.
///
/// Divides by `|prior|` so a move from a loss towards profit reads as growth.
pub fn growth_pct(current: f64, prior: f64) -> f64 {
    if prior == 0.0 {
        0.0
    } else {
        (current - prior) / prior.abs() * 100.0
    }
}

/// An ordinary-least-squares line over `(index, value)` points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination. 1.0 when the series is constant.
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit `value = intercept + slope * index` with `index = 0, 1, ..`.
///
/// Returns `None` with fewer than two points.
pub fn linear_fit(values: &[f64]) -> Option<LinearFit> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (i, y) in values.iter().enumerate() {
        let fitted = intercept + slope * i as f64;
        ss_res += (y - fitted).powi(2);
        ss_tot += (y - y_mean).powi(2);
    }
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Centered moving average over `window` points.
///
/// Odd windows average `window` points centered on each index. Even windows
/// use the 2xN average (`window + 1` points, half weight at both ends) so the
/// result stays centered. Indices closer than half a window to either edge
/// have no value.
pub fn centered_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = window / 2;
    let mut out = vec![None; n];
    if window == 0 || n < 2 * half + 1 {
        return out;
    }

    for (i, slot) in out.iter_mut().enumerate().take(n - half).skip(half) {
        let span = &values[i - half..=i + half];
        let avg = if window % 2 == 1 {
            span.iter().sum::<f64>() / window as f64
        } else {
            let inner: f64 = span[1..span.len() - 1].iter().sum();
            (inner + 0.5 * (span[0] + span[span.len() - 1])) / window as f64
        };
        *slot = Some(avg);
    }
    out
}
