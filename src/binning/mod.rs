//! Distance binning.
//!
//! Two flavours are provided:
//! - [`FixedBins`]: contiguous fixed-width labeled bins over integer inches,
//!   used to annotate every shot.
//! - [`QuantileBins`]: adaptive equal-population bins used when grouping
//!   shots for modeling, shrinking the bin count when a group has few
//!   distinct distances.
//!
//! All bins are right-closed `(lower, upper]`, the first bin also includes
//! its lower bound.

mod fixed;
mod quantile;

pub use fixed::{FixedBinSet, FixedBins};
pub use quantile::{quantile_bin_count, QuantileBins};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance unit used in bin labels. Distances themselves are always inches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Yards,
    Feet,
    Inches,
}

impl DistanceUnit {
    /// Inches per unit.
    pub fn scale(&self) -> u32 {
        match self {
            DistanceUnit::Yards => 36,
            DistanceUnit::Feet => 12,
            DistanceUnit::Inches => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DistanceUnit::Yards => "yds",
            DistanceUnit::Feet => "ft",
            DistanceUnit::Inches => "in",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What to do with distances beyond the last fixed bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    #[default]
    LastBin,
    Exclude,
}

/// A labeled right-closed interval in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceBin {
    pub lower: f64,
    pub upper: f64,
    pub label: String,
}

impl DistanceBin {
    /// Whether `x` falls in this bin. `first` marks the bin that includes its lower edge.
    pub fn contains(&self, x: f64, first: bool) -> bool {
        (x > self.lower || (first && x == self.lower)) && x <= self.upper
    }
}

/// Render a bin edge: integers without decimals, otherwise two places.
pub(crate) fn format_edge(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
