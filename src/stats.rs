//! Descriptive statistics over cycle lengths.
//!
//! Every helper returns `0.0` instead of NaN when the input is too small
//! for the measure to be defined.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of `values` around `center`.
pub fn population_std_dev(values: &[f64], center: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - center).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median of the absolute deviations from the median.
pub fn median_absolute_deviation(values: &[f64]) -> f64 {
    let center = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Standard deviation as a percentage of the mean.
pub fn coefficient_of_variation(std_dev: f64, mean: f64) -> f64 {
    if mean <= 0.0 {
        return 0.0;
    }
    std_dev / mean * 100.0
}
