//! Statistical reductions over measurement values
//!
//! Every function accepts anything implementing [`Flatten`]: a scalar, a
//! slice, a `Vec`, an array, or any nesting of those. Values are flattened
//! in order before reducing.
//!
//! Conventions:
//! - Empty input yields NaN (except [`percentile`], which yields 0)
//! - Any NaN in the input yields NaN

/// Values that can be flattened into a list of `f64`
pub trait Flatten {
    /// Append all contained values to `out` in order
    fn flatten_into(&self, out: &mut Vec<f64>);
}

impl Flatten for f64 {
    fn flatten_into(&self, out: &mut Vec<f64>) {
        out.push(*self);
    }
}

impl<T: Flatten> Flatten for [T] {
    fn flatten_into(&self, out: &mut Vec<f64>) {
        for item in self {
            item.flatten_into(out);
        }
    }
}

impl<T: Flatten, const N: usize> Flatten for [T; N] {
    fn flatten_into(&self, out: &mut Vec<f64>) {
        self.as_slice().flatten_into(out);
    }
}

impl<T: Flatten> Flatten for Vec<T> {
    fn flatten_into(&self, out: &mut Vec<f64>) {
        self.as_slice().flatten_into(out);
    }
}

impl<T: Flatten + ?Sized> Flatten for &T {
    fn flatten_into(&self, out: &mut Vec<f64>) {
        (**self).flatten_into(out);
    }
}

/// Collect all values into a flat vector
pub fn flat<T: Flatten + ?Sized>(values: &T) -> Vec<f64> {
    let mut out = Vec::new();
    values.flatten_into(&mut out);
    out
}

/// Flatten and sort ascending, or None if empty or any value is NaN
fn sorted<T: Flatten + ?Sized>(values: &T) -> Option<Vec<f64>> {
    let mut v = flat(values);
    if v.is_empty() || v.iter().any(|x| x.is_nan()) {
        return None;
    }
    v.sort_by(f64::total_cmp);
    Some(v)
}

/// Flatten, or None if empty or any value is NaN
fn checked<T: Flatten + ?Sized>(values: &T) -> Option<Vec<f64>> {
    let v = flat(values);
    if v.is_empty() || v.iter().any(|x| x.is_nan()) {
        None
    } else {
        Some(v)
    }
}

/// Largest value
pub fn max<T: Flatten + ?Sized>(values: &T) -> f64 {
    checked(values)
        .map(|v| v.into_iter().fold(f64::NEG_INFINITY, f64::max))
        .unwrap_or(f64::NAN)
}

/// Smallest value
pub fn min<T: Flatten + ?Sized>(values: &T) -> f64 {
    checked(values)
        .map(|v| v.into_iter().fold(f64::INFINITY, f64::min))
        .unwrap_or(f64::NAN)
}

/// Value with the largest magnitude, sign preserved
///
/// Ties keep the first occurrence.
pub fn absmax<T: Flatten + ?Sized>(values: &T) -> f64 {
    let Some(v) = checked(values) else {
        return f64::NAN;
    };
    let mut best = v[0];
    for &x in &v[1..] {
        if x.abs() > best.abs() {
            best = x;
        }
    }
    best
}

/// Arithmetic mean
pub fn avg<T: Flatten + ?Sized>(values: &T) -> f64 {
    checked(values)
        .map(|v| v.iter().sum::<f64>() / v.len() as f64)
        .unwrap_or(f64::NAN)
}

/// Mean of absolute values
pub fn avgabs<T: Flatten + ?Sized>(values: &T) -> f64 {
    checked(values)
        .map(|v| v.iter().map(|x| x.abs()).sum::<f64>() / v.len() as f64)
        .unwrap_or(f64::NAN)
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let half = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[half - 1] + sorted[half]) / 2.0
    } else {
        sorted[half]
    }
}

/// Median (mean of the two middle elements for even length)
pub fn median<T: Flatten + ?Sized>(values: &T) -> f64 {
    sorted(values)
        .map(|v| median_sorted(&v))
        .unwrap_or(f64::NAN)
}

/// Median absolute deviation from the median
pub fn mad<T: Flatten + ?Sized>(values: &T) -> f64 {
    let Some(v) = sorted(values) else {
        return f64::NAN;
    };
    let m = median_sorted(&v);
    let deviations: Vec<f64> = v.iter().map(|x| (x - m).abs()).collect();
    median(&deviations)
}

/// Population variance
pub fn variance<T: Flatten + ?Sized>(values: &T) -> f64 {
    let Some(v) = checked(values) else {
        return f64::NAN;
    };
    let n = v.len() as f64;
    let mean = v.iter().sum::<f64>() / n;
    v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n
}

/// Population standard deviation
pub fn stddev<T: Flatten + ?Sized>(values: &T) -> f64 {
    variance(values).sqrt()
}

/// Percentile with linear interpolation
///
/// `p` is a fraction in 0..1. `p <= 0` returns the minimum, `p >= 1` the
/// maximum. Empty input returns 0.
pub fn percentile<T: Flatten + ?Sized>(values: &T, p: f64) -> f64 {
    let v = flat(values);
    if v.is_empty() {
        return 0.0;
    }
    let Some(v) = sorted(&v) else {
        return f64::NAN;
    };
    if p <= 0.0 {
        return v[0];
    }
    if p >= 1.0 {
        return v[v.len() - 1];
    }
    let index = (v.len() - 1) as f64 * p;
    let lower = index.floor() as usize;
    let upper = lower + 1;
    let weight = index.fract();
    if upper >= v.len() {
        return v[lower];
    }
    v[lower] * (1.0 - weight) + v[upper] * weight
}

/// Difference between largest and smallest value
pub fn range<T: Flatten + ?Sized>(values: &T) -> f64 {
    max(values) - min(values)
}
