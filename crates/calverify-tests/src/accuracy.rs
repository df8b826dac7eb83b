//! Summary statistics over color differences

use calverify_core::math::stats;
use serde::Serialize;

/// Statistics from a ΔE comparison
#[derive(Debug, Clone, Serialize)]
pub struct DeltaEStats {
    pub mean: f64,
    pub max: f64,
    pub p95: f64,
    pub count: usize,
}

impl DeltaEStats {
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            mean: stats::avg(values),
            max: stats::max(values),
            p95: stats::percentile(values, 0.95),
            count: values.len(),
        }
    }

    /// Below the threshold of perception (ΔE < 1.0)
    pub fn is_excellent(&self) -> bool {
        self.max < 1.0
    }

    /// Numerically identical for all practical purposes
    pub fn is_identical(&self, epsilon: f64) -> bool {
        self.max < epsilon
    }
}

impl std::fmt::Display for DeltaEStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} mean={:.6} p95={:.6} max={:.6}",
            self.count, self.mean, self.p95, self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats() {
        let stats = DeltaEStats::from_values(&[0.0, 0.5, 1.0]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.max, 1.0);
        assert!((stats.mean - 0.5).abs() < 1e-12);
        assert!(!stats.is_excellent());
        assert!(stats.is_identical(1.5));
    }
}
