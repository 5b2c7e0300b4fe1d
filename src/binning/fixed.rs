//! Fixed-width distance bins.

use super::{format_edge, DistanceBin, DistanceUnit, OverflowPolicy};
use crate::config::{BinningConfig, ClassifierConfig};
use crate::models::ShotType;

/// Contiguous bins of equal width from 0 to a maximum distance.
#[derive(Debug, Clone)]
pub struct FixedBins {
    width: u32,
    max: u32,
    unit: DistanceUnit,
    overflow: OverflowPolicy,
    bins: Vec<DistanceBin>,
}

impl FixedBins {
    /// `max_inches` is the upper bound; `interval` is the width in `unit`.
    pub fn new(max_inches: u32, interval: u32, unit: DistanceUnit, overflow: OverflowPolicy) -> Self {
        let width = interval.max(1) * unit.scale();
        let max = max_inches.max(1);
        let count = max.div_ceil(width);
        let scale = unit.scale() as f64;

        let bins = (0..count)
            .map(|i| {
                let lower = i * width;
                let upper = ((i + 1) * width).min(max);
                DistanceBin {
                    lower: lower as f64,
                    upper: upper as f64,
                    label: format!(
                        "({} to {}] {}",
                        format_edge(lower as f64 / scale),
                        format_edge(upper as f64 / scale),
                        unit.label()
                    ),
                }
            })
            .collect();

        Self {
            width,
            max,
            unit,
            overflow,
            bins,
        }
    }

    /// Bins up to `max_yards` in steps of `interval` units.
    pub fn yards(max_yards: u32, interval: u32, unit: DistanceUnit, overflow: OverflowPolicy) -> Self {
        Self::new(max_yards * DistanceUnit::Yards.scale(), interval, unit, overflow)
    }

    pub fn bins(&self) -> &[DistanceBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn unit(&self) -> DistanceUnit {
        self.unit
    }

    /// Index of the bin holding `distance` inches.
    pub fn index_of(&self, distance: u32) -> Option<usize> {
        let idx = if distance == 0 {
            0
        } else {
            ((distance - 1) / self.width) as usize
        };
        if distance <= self.max {
            Some(idx.min(self.bins.len() - 1))
        } else {
            match self.overflow {
                OverflowPolicy::LastBin => Some(self.bins.len() - 1),
                OverflowPolicy::Exclude => None,
            }
        }
    }

    pub fn label_of(&self, distance: u32) -> Option<&str> {
        self.index_of(distance).map(|i| self.bins[i].label.as_str())
    }

    pub fn bin_all(&self, distances: &[u32]) -> Vec<Option<&str>> {
        distances.iter().map(|d| self.label_of(*d)).collect()
    }
}

/// The fixed bins attached to every annotated shot.
#[derive(Debug, Clone)]
pub struct FixedBinSet {
    tee: FixedBins,
    approach: FixedBins,
    around_green: FixedBins,
    long_putt: FixedBins,
    short_putt: FixedBins,
    left_5yd: FixedBins,
    left_1ft: FixedBins,
}

impl FixedBinSet {
    pub fn from_config(binning: &BinningConfig, classifier: &ClassifierConfig) -> Self {
        let overflow = binning.overflow;
        let hole = binning.max_hole_yards;
        let green = binning.max_green_yards;
        let arg_max = classifier.arg_inches().ceil().max(1.0) as u32;

        Self {
            tee: FixedBins::yards(hole, 10, DistanceUnit::Yards, overflow),
            approach: FixedBins::yards(hole, 5, DistanceUnit::Yards, overflow),
            around_green: FixedBins::new(arg_max, 1, DistanceUnit::Yards, overflow),
            long_putt: FixedBins::yards(green, 1, DistanceUnit::Feet, overflow),
            short_putt: FixedBins::yards(green, 4, DistanceUnit::Inches, overflow),
            left_5yd: FixedBins::yards(hole, 5, DistanceUnit::Yards, overflow),
            left_1ft: FixedBins::yards(green, 1, DistanceUnit::Feet, overflow),
        }
    }

    /// Start distance label at the granularity of the shot type.
    pub fn start_label(&self, shot_type: ShotType, start_distance: u32) -> Option<String> {
        let bins = match shot_type {
            ShotType::Tee => &self.tee,
            ShotType::App => &self.approach,
            ShotType::Arg => &self.around_green,
            ShotType::LngPutt => &self.long_putt,
            ShotType::ShtPutt => &self.short_putt,
            ShotType::Penalty | ShotType::Unknown => return None,
        };
        bins.label_of(start_distance).map(str::to_string)
    }

    pub fn left_5yd_label(&self, distance_left: u32) -> Option<String> {
        self.left_5yd.label_of(distance_left).map(str::to_string)
    }

    pub fn left_1ft_label(&self, distance_left: u32) -> Option<String> {
        self.left_1ft.label_of(distance_left).map(str::to_string)
    }
}

impl Default for FixedBinSet {
    fn default() -> Self {
        Self::from_config(&BinningConfig::default(), &ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bin_count_and_labels() {
        let bins = FixedBins::yards(700, 10, DistanceUnit::Yards, OverflowPolicy::LastBin);
        assert_eq!(bins.len(), 70);
        assert_eq!(bins.bins()[0].label, "(0 to 10] yds");
        assert_eq!(bins.bins()[69].label, "(690 to 700] yds");
    }

    #[test]
    fn test_bins_are_contiguous() {
        let bins = FixedBins::yards(50, 4, DistanceUnit::Inches, OverflowPolicy::LastBin);
        assert_eq!(bins.len(), 450);
        for pair in bins.bins().windows(2) {
            assert_eq!(pair[0].upper, pair[1].lower);
            assert!(pair[0].lower < pair[0].upper);
        }
        assert_eq!(bins.bins().last().unwrap().upper, 1800.0);
    }

    #[test]
    fn test_ceil_count_clips_last_edge() {
        // 100 inches in 30 inch steps: 4 bins, last one (90, 100].
        let bins = FixedBins::new(100, 30, DistanceUnit::Inches, OverflowPolicy::LastBin);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.bins()[3].upper, 100.0);
        assert_eq!(bins.bins()[3].label, "(90 to 100] in");
    }

    #[test]
    fn test_right_closed_assignment() {
        let bins = FixedBins::yards(700, 5, DistanceUnit::Yards, OverflowPolicy::LastBin);
        assert_eq!(bins.label_of(0), Some("(0 to 5] yds"));
        assert_eq!(bins.label_of(180), Some("(0 to 5] yds"));
        assert_eq!(bins.label_of(181), Some("(5 to 10] yds"));
        assert_eq!(bins.label_of(14400), Some("(395 to 400] yds"));
    }

    #[test]
    fn test_every_distance_lands_in_its_bin() {
        let bins = FixedBins::yards(50, 1, DistanceUnit::Feet, OverflowPolicy::LastBin);
        for d in 0..=1800u32 {
            let idx = bins.index_of(d).unwrap();
            assert!(bins.bins()[idx].contains(d as f64, idx == 0), "distance {}", d);
        }
    }

    #[test]
    fn test_overflow_policy() {
        let last = FixedBins::yards(50, 1, DistanceUnit::Feet, OverflowPolicy::LastBin);
        assert_eq!(last.label_of(5000), Some("(149 to 150] ft"));

        let exclude = FixedBins::yards(50, 1, DistanceUnit::Feet, OverflowPolicy::Exclude);
        assert_eq!(exclude.label_of(5000), None);
        assert_eq!(exclude.bin_all(&[12, 5000]), vec![Some("(0 to 1] ft"), None]);
    }

    #[test]
    fn test_bin_set_granularity() {
        let set = FixedBinSet::default();
        assert_eq!(set.start_label(ShotType::Tee, 14400).unwrap(), "(390 to 400] yds");
        assert_eq!(set.start_label(ShotType::App, 6480).unwrap(), "(175 to 180] yds");
        assert_eq!(set.start_label(ShotType::Arg, 500).unwrap(), "(13 to 14] yds");
        assert_eq!(set.start_label(ShotType::LngPutt, 240).unwrap(), "(19 to 20] ft");
        assert_eq!(set.start_label(ShotType::ShtPutt, 30).unwrap(), "(28 to 32] in");
        assert_eq!(set.start_label(ShotType::Penalty, 30), None);
        assert_eq!(set.left_5yd_label(720).unwrap(), "(15 to 20] yds");
        assert_eq!(set.left_1ft_label(720).unwrap(), "(59 to 60] ft");
    }
}
