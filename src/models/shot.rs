//! Annotated per-shot records produced by the shot pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Direction, ShotType, Surface, ToLocation};

/// Identity of one hole played in one round.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HoleKey {
    pub pga_year: i32,
    pub course_id: String,
    pub hole_num: u8,
    pub round_num: u8,
}

impl fmt::Display for HoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "year {} course {} hole {} round {}",
            self.pga_year, self.course_id, self.hole_num, self.round_num
        )
    }
}

/// One golf shot with classification, distance and outcome annotations.
///
/// Distances are integer inches (1/36 yard).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotRecord {
    #[serde(rename = "playerID")]
    pub player_id: String,
    pub hole_num: u8,
    pub round_num: u8,
    #[serde(rename = "courseID")]
    pub course_id: String,
    pub pga_year: i32,
    pub round_date: Option<NaiveDate>,
    pub par: u8,
    pub stimp: Option<f64>,

    pub shot_id: u32,
    /// Distance the ball travelled.
    pub shot_distance: u32,
    pub start_distance: u32,
    pub distance_left: u32,

    /// Raw lie code from the feed.
    pub from_code: String,
    /// Raw outcome code from the feed.
    pub to_code: String,

    pub shot_type: ShotType,
    pub from_surface: Surface,
    pub direction: Direction,
    pub to_surface: ToLocation,

    pub shots_remaining: u32,
    pub strokes_taken: u32,
    pub player_score: u32,
    pub hole_avg: f64,

    pub is_advanced: bool,
    pub is_re_tee: bool,
    pub is_drop: bool,

    /// Fixed-width start distance bin for the shot type.
    #[serde(default)]
    pub start_distance_bin: Option<String>,
    #[serde(default, rename = "distanceLeft5ydBin")]
    pub distance_left_5yd_bin: Option<String>,
    #[serde(default, rename = "distanceLeft1ftBin")]
    pub distance_left_1ft_bin: Option<String>,
}

impl ShotRecord {
    pub fn hole_key(&self) -> HoleKey {
        HoleKey {
            pga_year: self.pga_year,
            course_id: self.course_id.clone(),
            hole_num: self.hole_num,
            round_num: self.round_num,
        }
    }

    pub fn is_holed(&self) -> bool {
        self.to_surface == ToLocation::Hole || (self.distance_left == 0 && self.shots_remaining == 0)
    }
}
