//! Shared statistics over sample windows.
//!
//! Every function here accepts an arbitrary slice, including an empty one,
//! and returns `0.0` instead of `NaN` when there is not enough data.

use statrs::statistics::Statistics;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Population variance (divides by `n`).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().population_variance()
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Difference between the largest and smallest value.
pub fn range(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    max - min
}

/// Root mean square of successive differences of an RR interval sequence (ms).
pub fn rmssd(intervals: &[f64]) -> f64 {
    if intervals.len() < 2 {
        return 0.0;
    }
    let squared: Vec<f64> = intervals
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).powi(2))
        .collect();
    mean(&squared).sqrt()
}

/// Standard deviation of an RR interval sequence (ms).
pub fn sdnn(intervals: &[f64]) -> f64 {
    std_dev(intervals)
}

/// Round to a fixed number of decimal places for reporting.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
