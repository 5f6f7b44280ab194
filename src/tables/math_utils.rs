use log::warn;

// Scales `values` to sum to one and returns the previous sum; a zero sum leaves `values` untouched
pub fn normalize(values: &mut [f64]) -> f64 {
    let sum: f64 = values.iter().sum();
    if sum != 0.0 {
        values.iter_mut().for_each(|value| *value /= sum);
    }
    sum
}

pub fn log_to_linear(values: &mut [f64]) {
    values.iter_mut().for_each(|value| *value = value.exp());
}

pub fn linear_to_log(values: &mut [f64]) {
    if values.iter().any(|&value| value == 0.0) {
        warn!("Converting zero probabilities to log scale, entries become -inf");
    }
    values.iter_mut().for_each(|value| *value = value.ln());
}

/// Turns log-scale beliefs into normalized probabilities.
///
/// The largest finite entry is subtracted before exponentiation so that very small
/// log values do not all underflow to zero.
pub fn log_normalize(values: &mut [f64]) {
    let max = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        warn!("All log-scale beliefs are -inf or non-finite, nothing to normalize");
        return;
    }
    values.iter_mut().for_each(|value| *value = (*value - max).exp());
    normalize(values);
}
