//! Cross-sectional statistics over scenario samples.
//!
//! Quantiles use linear interpolation between order statistics
//! (`h = (n - 1)·p`), the same definition as the default percentile
//! of most numerical packages.

use num_traits::Float;

/// Arithmetic mean; `None` for an empty sample.
pub fn mean<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);
    T::from(values.len()).map(|n| sum / n)
}

/// Unbiased sample standard deviation; `None` for fewer than two values.
pub fn std_dev<T: Float>(values: &[T]) -> Option<T> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss = values
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - m) * (v - m));
    T::from(values.len() - 1).map(|d| (ss / d).sqrt())
}

/// Population standard deviation (divisor `n`); `None` for an empty sample.
pub fn population_std_dev<T: Float>(values: &[T]) -> Option<T> {
    let m = mean(values)?;
    let ss = values
        .iter()
        .fold(T::zero(), |acc, &v| acc + (v - m) * (v - m));
    T::from(values.len()).map(|n| (ss / n).sqrt())
}

/// Quantile at probability `p` in `[0, 1]` of an ascending-sorted sample.
pub fn quantile_sorted<T: Float>(sorted: &[T], p: T) -> Option<T> {
    if sorted.is_empty() || p < T::zero() || p > T::one() {
        return None;
    }
    let h = T::from(sorted.len() - 1)? * p;
    let lo = h.floor();
    let idx = lo.to_usize()?;
    if idx + 1 >= sorted.len() {
        return sorted.last().copied();
    }
    let frac = h - lo;
    Some(sorted[idx] + frac * (sorted[idx + 1] - sorted[idx]))
}

/// Quantiles at each probability in `probs`, sorting a copy of `values` once.
///
/// Returns `None` for an empty sample, a sample containing NaN, or a
/// probability outside `[0, 1]`.
pub fn quantiles<T: Float>(values: &[T], probs: &[T]) -> Option<Vec<T>> {
    if values.iter().any(|v| v.is_nan()) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    probs.iter().map(|&p| quantile_sorted(&sorted, p)).collect()
}

/// Pearson correlation of two equally long samples.
pub fn correlation<T: Float>(x: &[T], y: &[T]) -> Option<T> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let (mut sxy, mut sxx, mut syy) = (T::zero(), T::zero(), T::zero());
    for (&a, &b) in x.iter().zip(y.iter()) {
        sxy = sxy + (a - mx) * (b - my);
        sxx = sxx + (a - mx) * (a - mx);
        syy = syy + (b - my) * (b - my);
    }
    let denom = (sxx * syy).sqrt();
    if denom <= T::zero() {
        None
    } else {
        Some(sxy / denom)
    }
}
