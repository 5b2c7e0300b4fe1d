//! Strokes-gained calculation.
//!
//! Looks up expected strokes on a fitted curve and derives:
//! - Strokes gained for a single shot
//! - Hole-level strokes gained against the field average

use crate::models::{GroupedShotModel, ModelRow, ShotRecord, ShotType};

/// A single fitted curve, ordered by mean distance.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedCurve {
    points: Vec<(f64, f64)>,
}

impl ExpectedCurve {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a ModelRow>) -> Self {
        let mut points: Vec<(f64, f64)> = rows
            .into_iter()
            .filter(|r| r.distance.is_finite() && r.expected_strokes.is_finite())
            .map(|r| (r.distance, r.expected_strokes))
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    /// Curve of one shot type on one surface, `None` when the model has no rows for it.
    pub fn from_model(model: &GroupedShotModel, shot_type: ShotType, surface: &str) -> Option<Self> {
        let curve = Self::from_rows(model.curve(shot_type, surface));
        if curve.is_empty() {
            None
        } else {
            Some(curve)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Expected strokes at `distance` inches.
    ///
    /// Linear between bin means, clamped to the end values outside them.
    pub fn expected_at(&self, distance: f64) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        if distance <= first.0 {
            return Some(first.1);
        }
        if distance >= last.0 {
            return Some(last.1);
        }

        let idx = self.points.partition_point(|(x, _)| *x < distance);
        let (x1, y1) = self.points[idx];
        if x1 == distance {
            return Some(y1);
        }
        let (x0, y0) = self.points[idx - 1];
        let t = (distance - x0) / (x1 - x0);
        Some(y0 + t * (y1 - y0))
    }
}

/// Strokes gained by a shot given expectations before and after it.
pub fn strokes_gained(expected_before: f64, expected_after: f64, strokes_taken: u32) -> f64 {
    expected_before - expected_after - f64::from(strokes_taken)
}

/// Strokes gained by `shot`.
///
/// `before` is looked up at the start distance and `after` at the distance
/// left. Holed shots expect nothing afterwards.
pub fn shot_strokes_gained(
    shot: &ShotRecord,
    before: &ExpectedCurve,
    after: Option<&ExpectedCurve>,
) -> Option<f64> {
    let expected_before = before.expected_at(f64::from(shot.start_distance))?;
    let expected_after = if shot.is_holed() {
        0.0
    } else {
        after?.expected_at(f64::from(shot.distance_left))?
    };
    Some(strokes_gained(
        expected_before,
        expected_after,
        shot.strokes_taken,
    ))
}

/// Hole-level strokes gained against the field average.
pub fn hole_strokes_gained(hole_avg: f64, player_score: u32) -> f64 {
    hole_avg - f64::from(player_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shot::fixtures::shot;
    use crate::models::{ModelKey, ToLocation};

    fn row(surface: &str, distance: f64, expected: f64) -> ModelRow {
        ModelRow {
            surface: surface.to_string(),
            distance_bin: String::new(),
            distance,
            shots_remaining: expected,
            expected_strokes: expected,
            sample_count: 10,
        }
    }

    fn curve() -> ExpectedCurve {
        ExpectedCurve::from_rows(&[
            row("Green", 600.0, 2.0),
            row("Green", 120.0, 1.5),
            row("Green", 360.0, 1.8),
        ])
    }

    #[test]
    fn test_expected_at_interpolates() {
        let c = curve();
        assert_eq!(c.len(), 3);
        assert_eq!(c.expected_at(120.0), Some(1.5));
        assert_eq!(c.expected_at(360.0), Some(1.8));
        let mid = c.expected_at(480.0).unwrap();
        assert!((mid - 1.9).abs() < 1e-9);
    }

    #[test]
    fn test_expected_at_clamps() {
        let c = curve();
        assert_eq!(c.expected_at(10.0), Some(1.5));
        assert_eq!(c.expected_at(9000.0), Some(2.0));
        assert_eq!(ExpectedCurve::from_rows(&Vec::<ModelRow>::new()).expected_at(100.0), None);
    }

    #[test]
    fn test_strokes_gained() {
        assert!((strokes_gained(3.0, 1.8, 1) - 0.2).abs() < 1e-9);
        assert!((strokes_gained(1.5, 0.0, 1) - 0.5).abs() < 1e-9);
        assert!((strokes_gained(4.0, 3.5, 2) + 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_shot_strokes_gained() {
        let before = ExpectedCurve::from_rows(&[row("Fairway", 3600.0, 3.0), row("Fairway", 7200.0, 3.4)]);
        let after = curve();

        let approach = shot("1001", 2, 3600, 360, 1);
        let sg = shot_strokes_gained(&approach, &before, Some(&after)).unwrap();
        assert!((sg - 0.2).abs() < 1e-9);

        let mut holed = shot("1001", 2, 3600, 0, 0);
        holed.to_surface = ToLocation::Hole;
        let sg = shot_strokes_gained(&holed, &before, None).unwrap();
        assert!((sg - 2.0).abs() < 1e-9);

        assert_eq!(shot_strokes_gained(&approach, &before, None), None);
    }

    #[test]
    fn test_from_model() {
        let mut model = GroupedShotModel::empty(&ModelKey::new("sample-open", "Round", "1"));
        model
            .shot_types
            .insert(ShotType::App, vec![row("Green", 120.0, 1.5), row("Rough", 900.0, 2.6)]);
        let green = ExpectedCurve::from_model(&model, ShotType::App, "Green").unwrap();
        assert_eq!(green.len(), 1);
        assert!(ExpectedCurve::from_model(&model, ShotType::App, "Bunker").is_none());
        assert!(ExpectedCurve::from_model(&model, ShotType::Tee, "Tee").is_none());
    }

    #[test]
    fn test_hole_strokes_gained() {
        assert_eq!(hole_strokes_gained(4.25, 4), 0.25);
        assert_eq!(hole_strokes_gained(4.0, 5), -1.0);
    }
}
