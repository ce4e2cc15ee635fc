//! Ordinary least squares for a single predictor.

use serde::{Deserialize, Serialize};

/// Fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Least-squares fit of `ys` against `xs`.
    ///
    /// Returns `None` with fewer than two pairs, mismatched lengths, or when
    /// every `x` is the same.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return None;
        }
        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;

        let (covariance, variance) = xs
            .iter()
            .zip(ys)
            .fold((0.0, 0.0), |(cov, var), (x, y)| {
                let dx = x - mean_x;
                (cov + dx * (y - mean_y), var + dx * dx)
            });

        if variance <= f64::EPSILON || !variance.is_finite() {
            return None;
        }
        let slope = covariance / variance;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Copy of `values` where each value equal to an earlier one is raised by 1
/// per earlier match, so that repeated readings still form a usable predictor.
pub fn separate_duplicates(values: &[f64]) -> Vec<f64> {
    let mut separated: Vec<f64> = Vec::with_capacity(values.len());
    for &value in values {
        let mut value = value;
        for previous in &separated {
            if (*previous - value).abs() < 1e-9 {
                value += 1.0;
            }
        }
        separated.push(value);
    }
    separated
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_line() {
        let fit = LinearFit::fit(&[1000.0, 3000.0, 5000.0], &[5.0, 15.0, 25.0]).unwrap();
        assert!((fit.slope - 0.005).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-9);
        assert!((fit.predict(4000.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(LinearFit::fit(&[1.0], &[2.0]).is_none());
        assert!(LinearFit::fit(&[1.0, 1.0], &[2.0, 3.0]).is_none());
        assert!(LinearFit::fit(&[1.0, 2.0], &[2.0]).is_none());
    }

    #[test]
    fn test_separate_duplicates() {
        assert_eq!(separate_duplicates(&[10.0, 10.0, 10.0]), vec![10.0, 11.0, 12.0]);
        assert_eq!(separate_duplicates(&[10.0, 11.0, 10.0]), vec![10.0, 11.0, 12.0]);
        assert_eq!(separate_duplicates(&[3.0, 7.0]), vec![3.0, 7.0]);
    }

    proptest! {
        #[test]
        fn prop_recovers_linear_response(
            gain in 10.0f64..5000.0,
            offset in 0.0f64..2000.0,
            first in 1.0f64..50.0,
            step in 1.0f64..50.0,
            target in 1000.0f64..60000.0,
        ) {
            // brightness = gain * exposure + offset; invert to exposure from brightness
            let exposures = [first, first + step, first + 2.0 * step];
            let brightness: Vec<f64> = exposures.iter().map(|e| gain * e + offset).collect();
            let fit = LinearFit::fit(&brightness, &exposures).unwrap();
            let expected = (target - offset) / gain;
            prop_assert!((fit.predict(target) - expected).abs() < 1e-6 * expected.abs().max(1.0));
        }
    }
}
