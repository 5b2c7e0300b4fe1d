//! Expected-strokes smoothing.
//!
//! Turns per-bin (distance, mean strokes remaining) pairs into a smoothed
//! expected-strokes curve with a robust LOWESS (tricube weights, bisquare
//! robustness passes) from the `lowess` crate. The span shrinks as the number
//! of bins approaches the quantile bin target; tiny groups degrade gracefully
//! and any failure falls back to the raw values.

use lowess::prelude::{Batch, Lowess};
use thiserror::Error;
use tracing::warn;

use crate::config::SmootherConfig;

/// Smoothing failures. Never surfaced past [`ExpectedStrokesSmoother::smooth`].
#[derive(Debug, Error, PartialEq)]
pub enum SmoothError {
    #[error("x and y lengths differ ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("input contains non-finite values")]
    NonFinite,

    #[error("LOWESS fit failed: {0}")]
    Fit(String),

    #[error("no fitted value could be resolved")]
    Unresolved,
}

/// Expected strokes never drop below one stroke.
pub const MIN_EXPECTED_STROKES: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct ExpectedStrokesSmoother {
    config: SmootherConfig,
    target_bins: usize,
}

impl Default for ExpectedStrokesSmoother {
    fn default() -> Self {
        Self::new(SmootherConfig::default(), 40)
    }
}

impl ExpectedStrokesSmoother {
    /// `target_bins` is the quantile bin target the span schedule is scaled by.
    pub fn new(config: SmootherConfig, target_bins: usize) -> Self {
        Self {
            config,
            target_bins: target_bins.max(1),
        }
    }

    /// Span for `n` points, rounded to two decimals and clamped to `[min_frac, max_frac]`.
    pub fn frac_for(&self, n: usize) -> f64 {
        let c = &self.config;
        let raw = c.max_frac - c.frac_slope * (n as f64 / self.target_bins as f64);
        let rounded = (raw * 100.0).round() / 100.0;
        rounded.clamp(c.min_frac, c.max_frac)
    }

    /// Smooth `strokes` against `distances`, reporting failures.
    pub fn try_smooth(&self, distances: &[f64], strokes: &[f64]) -> Result<Vec<f64>, SmoothError> {
        if distances.len() != strokes.len() {
            return Err(SmoothError::LengthMismatch {
                x: distances.len(),
                y: strokes.len(),
            });
        }
        match strokes.len() {
            0 => return Ok(Vec::new()),
            1 => return Ok(strokes.to_vec()),
            _ => {}
        }
        if distances.iter().chain(strokes).any(|v| !v.is_finite()) {
            return Err(SmoothError::NonFinite);
        }

        let (min, max) = distances
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(*d), hi.max(*d))
            });

        let model = Lowess::new()
            .fraction(self.frac_for(strokes.len()))
            .iterations(self.config.robust_iterations)
            .delta(self.config.delta_fraction * (max - min))
            .adapter(Batch)
            .build()
            .map_err(|e| SmoothError::Fit(e.to_string()))?;
        let result = model
            .fit(distances, strokes)
            .map_err(|e| SmoothError::Fit(e.to_string()))?;

        let mut fitted = result.y;
        if fitted.len() != strokes.len() {
            return Err(SmoothError::LengthMismatch {
                x: strokes.len(),
                y: fitted.len(),
            });
        }
        fill_unresolved(distances, &mut fitted)?;
        for value in fitted.iter_mut() {
            if *value < MIN_EXPECTED_STROKES {
                *value = MIN_EXPECTED_STROKES;
            }
        }
        Ok(fitted)
    }

    /// Smooth `strokes` against `distances`; on failure returns the raw strokes.
    pub fn smooth(&self, distances: &[f64], strokes: &[f64]) -> Vec<f64> {
        match self.try_smooth(distances, strokes) {
            Ok(fitted) => fitted,
            Err(e) => {
                warn!(
                    "Smoothing failed for {} points, using raw values: {}",
                    strokes.len(),
                    e
                );
                strokes.to_vec()
            }
        }
    }
}

/// Replace non-finite fitted values by linear interpolation over
/// distance-sorted positions; edges take the nearest resolved value.
fn fill_unresolved(distances: &[f64], fitted: &mut [f64]) -> Result<(), SmoothError> {
    if fitted.iter().all(|v| v.is_finite()) {
        return Ok(());
    }

    let mut order: Vec<usize> = (0..fitted.len()).collect();
    order.sort_by(|&a, &b| distances[a].total_cmp(&distances[b]));

    let resolved: Vec<usize> = order
        .iter()
        .enumerate()
        .filter(|(_, i)| fitted[**i].is_finite())
        .map(|(pos, _)| pos)
        .collect();
    if resolved.is_empty() {
        return Err(SmoothError::Unresolved);
    }

    for pos in 0..order.len() {
        let idx = order[pos];
        if fitted[idx].is_finite() {
            continue;
        }
        let after = resolved.partition_point(|&r| r < pos);
        let value = match (after.checked_sub(1).map(|i| resolved[i]), resolved.get(after)) {
            (Some(lo), Some(&hi)) => {
                let (y0, y1) = (fitted[order[lo]], fitted[order[hi]]);
                y0 + (y1 - y0) * (pos - lo) as f64 / (hi - lo) as f64
            }
            (Some(lo), None) => fitted[order[lo]],
            (None, Some(&hi)) => fitted[order[hi]],
            (None, None) => return Err(SmoothError::Unresolved),
        };
        fitted[idx] = value;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoother() -> ExpectedStrokesSmoother {
        ExpectedStrokesSmoother::default()
    }

    #[test]
    fn test_frac_schedule() {
        let s = smoother();
        assert_eq!(s.frac_for(1), 0.89);
        assert_eq!(s.frac_for(20), 0.75);
        assert_eq!(s.frac_for(40), 0.6);
        assert_eq!(s.frac_for(200), 0.3);
    }

    #[test]
    fn test_frac_follows_bin_target() {
        let s = ExpectedStrokesSmoother::new(SmootherConfig::default(), 20);
        assert_eq!(s.frac_for(20), 0.6);
        assert_eq!(s.frac_for(10), 0.75);
    }

    #[test]
    fn test_smooth_tracks_linear_trend() {
        let distances: Vec<f64> = (1..=20).map(|v| v as f64 * 360.0).collect();
        let strokes: Vec<f64> = (1..=20).map(|v| 2.0 + v as f64 * 0.1).collect();
        let fitted = smoother().try_smooth(&distances, &strokes).unwrap();
        assert_eq!(fitted.len(), strokes.len());
        for (f, s) in fitted.iter().zip(&strokes) {
            assert!((f - s).abs() < 1e-3, "{} vs {}", f, s);
        }
    }

    #[test]
    fn test_single_point_is_identity() {
        let s = smoother();
        assert_eq!(s.smooth(&[500.0], &[0.4]), vec![0.4]);
        assert_eq!(s.smooth(&[500.0], &[3.2]), vec![3.2]);
    }

    #[test]
    fn test_empty_input() {
        assert!(smoother().smooth(&[], &[]).is_empty());
    }

    #[test]
    fn test_output_never_below_one() {
        let distances: Vec<f64> = (1..=12).map(|v| v as f64 * 12.0).collect();
        let strokes: Vec<f64> = (1..=12).map(|v| 0.2 + v as f64 * 0.01).collect();
        let fitted = smoother().smooth(&distances, &strokes);
        assert_eq!(fitted.len(), strokes.len());
        assert!(fitted.iter().all(|v| *v >= 1.0));
    }

    #[test]
    fn test_same_length_and_order() {
        let distances = vec![3600.0, 360.0, 7200.0, 1800.0, 5400.0];
        let strokes = vec![2.9, 2.2, 3.4, 2.6, 3.1];
        let fitted = smoother().smooth(&distances, &strokes);
        assert_eq!(fitted.len(), 5);
        // Longest distance keeps the highest expectation.
        let max_idx = fitted
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(max_idx, 2);
    }

    #[test]
    fn test_failure_falls_back_to_raw() {
        let s = smoother();
        let distances = vec![1.0, f64::NAN, 3.0];
        let strokes = vec![1.5, 2.0, 2.5];
        assert!(s.try_smooth(&distances, &strokes).is_err());
        assert_eq!(s.smooth(&distances, &strokes), strokes);
    }

    #[test]
    fn test_length_mismatch_falls_back() {
        let s = smoother();
        assert_eq!(
            s.try_smooth(&[1.0, 2.0], &[1.0]),
            Err(SmoothError::LengthMismatch { x: 2, y: 1 })
        );
    }

    #[test]
    fn test_fill_unresolved() {
        let distances = vec![4.0, 1.0, 2.0, 3.0, 5.0];
        let mut fitted = vec![f64::NAN, 1.0, f64::NAN, 3.0, f64::NAN];
        fill_unresolved(&distances, &mut fitted).unwrap();
        // sorted positions: 1.0 -> 1.0, 2.0 -> NaN, 3.0 -> 3.0, 4.0 -> NaN, 5.0 -> NaN
        assert_eq!(fitted, vec![3.0, 1.0, 2.0, 3.0, 3.0]);

        let mut none = vec![f64::NAN, f64::NAN];
        assert_eq!(
            fill_unresolved(&[1.0, 2.0], &mut none),
            Err(SmoothError::Unresolved)
        );
    }
}
