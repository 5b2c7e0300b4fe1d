//! Raw tournament documents as delivered by the shot telemetry feed.
//!
//! The feed stores many numbers as strings, so numeric fields accept
//! either representation. A tournament-year document is reshaped into
//! [`RawHole`] units (one per course, hole and round) before processing.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while reading raw tournament documents.
#[derive(Debug, Error)]
pub enum RawDataError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid tournament dates: {0}")]
    InvalidDates(String),
}

// ── Lenient numeric deserializers ───────────────────────────────────────────

fn value_as_i64(v: &serde_json::Value) -> Option<i64> {
    match v {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|x| x.round() as i64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|x| x.round() as i64))
        }
        _ => None,
    }
}

/// Deserialize a required integer that may arrive as a number or a numeric string.
fn deserialize_string_or_number_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let val = serde_json::Value::deserialize(deserializer)?;
    value_as_i64(&val)
        .ok_or_else(|| serde::de::Error::custom(format!("expected integer, got {}", val)))
}

/// Deserialize an integer that may be missing, a number, or a numeric string.
/// Anything unparseable becomes `None` so one bad shot cannot sink the document.
fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let val: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(val.as_ref().and_then(value_as_i64))
}

fn deserialize_string_or_number_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let n = deserialize_string_or_number_i64(deserializer)?;
    u8::try_from(n).map_err(|_| serde::de::Error::custom(format!("value out of range: {}", n)))
}

fn deserialize_string_or_number_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let n = deserialize_string_or_number_i64(deserializer)?;
    i32::try_from(n).map_err(|_| serde::de::Error::custom(format!("value out of range: {}", n)))
}

fn deserialize_string_or_number_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let val: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(val.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Identifiers arrive as strings or bare numbers; normalize to strings.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let val = serde_json::Value::deserialize(deserializer)?;
    match val {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected identifier, got {}",
            other
        ))),
    }
}

// ── Feed documents ──────────────────────────────────────────────────────────

/// One recorded stroke. Distances are in inches.
///
/// Numeric fields are `None` when missing or unparseable; the pipeline
/// rejects the hole that contains such a shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawShot {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub shot_id: Option<i64>,

    /// Distance the ball travelled.
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub distance: Option<i64>,

    /// Lie code the shot was played from.
    #[serde(default)]
    pub from: String,

    /// Location code the ball finished in.
    #[serde(default)]
    pub to: String,

    /// Distance to the hole after the shot.
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub left: Option<i64>,
}

/// Per-round hole setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHoleRound {
    #[serde(rename = "round_Id", deserialize_with = "deserialize_string_or_number_u8")]
    pub round_id: u8,

    /// Hole length in yards.
    #[serde(deserialize_with = "deserialize_string_or_number_i64")]
    pub distance: i64,

    #[serde(deserialize_with = "deserialize_string_or_number_i64")]
    pub par: i64,

    #[serde(default, deserialize_with = "deserialize_string_or_number_f64")]
    pub stimp: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCourseHole {
    #[serde(rename = "holeNumber", deserialize_with = "deserialize_string_or_number_u8")]
    pub hole_number: u8,

    #[serde(default)]
    pub rounds: Vec<RawHoleRound>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCourse {
    #[serde(rename = "courseID", deserialize_with = "deserialize_id")]
    pub course_id: String,

    #[serde(default)]
    pub holes: Vec<RawCourseHole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPlayerHole {
    #[serde(rename = "holeNumber", deserialize_with = "deserialize_string_or_number_u8")]
    pub hole_number: u8,

    #[serde(default)]
    pub shots: Vec<RawShot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPlayerRound {
    #[serde(rename = "courseId", deserialize_with = "deserialize_id")]
    pub course_id: String,

    #[serde(rename = "playerID", deserialize_with = "deserialize_id")]
    pub player_id: String,

    #[serde(rename = "roundNumber", deserialize_with = "deserialize_string_or_number_u8")]
    pub round_number: u8,

    #[serde(default)]
    pub holes: Vec<RawPlayerHole>,
}

/// One year of a tournament as scraped from the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentYear {
    #[serde(default)]
    pub tournament_name: Option<String>,

    #[serde(deserialize_with = "deserialize_string_or_number_i32")]
    pub pga_year: i32,

    /// Human readable date range, e.g. "Thursday Jan 30 - Sunday Feb 2, 2020".
    #[serde(default)]
    pub dates: Option<String>,

    #[serde(default)]
    pub courses: Vec<RawCourse>,

    #[serde(default)]
    pub player_rounds: Vec<RawPlayerRound>,
}

/// All shots played on one hole in one round, keyed by player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHole {
    pub pga_year: i32,
    pub course_id: String,
    pub hole_num: u8,
    pub round_num: u8,
    /// Hole length in yards.
    pub distance: i64,
    pub par: i64,
    pub stimp: Option<f64>,
    pub round_date: Option<NaiveDate>,
    pub player_shots: BTreeMap<String, Vec<RawShot>>,
}

impl RawHole {
    pub fn is_empty(&self) -> bool {
        self.player_shots.values().all(|shots| shots.is_empty())
    }

    pub fn shot_count(&self) -> usize {
        self.player_shots.values().map(|s| s.len()).sum()
    }
}

/// Parse a feed date range such as "Thursday Jan 30 - Sunday Feb 2, 2020".
pub fn parse_tournament_dates(dates: &str) -> Result<(NaiveDate, NaiveDate), RawDataError> {
    let re = Regex::new(r"^\s*([A-Za-z]+\s+[A-Za-z]+\s+\d{1,2})\s*-\s*([A-Za-z]+\s+[A-Za-z]+\s+\d{1,2})\s*,\s*(\d{4})\s*$")
        .map_err(|e| RawDataError::InvalidDates(e.to_string()))?;
    let caps = re
        .captures(dates)
        .ok_or_else(|| RawDataError::InvalidDates(dates.to_string()))?;

    let year = &caps[3];
    let parse = |day: &str| {
        NaiveDate::parse_from_str(&format!("{} {}", day, year), "%A %b %d %Y")
            .map_err(|e| RawDataError::InvalidDates(format!("{}: {}", dates, e)))
    };

    Ok((parse(&caps[1])?, parse(&caps[2])?))
}

impl TournamentYear {
    pub fn from_json(contents: &str) -> Result<Self, RawDataError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Reshape the document into hole units ordered by course, hole and round.
    ///
    /// Round dates are the first tournament day plus the round's position in
    /// the hole's round list.
    pub fn into_holes(self) -> Vec<RawHole> {
        let first_day = match self.dates.as_deref().map(parse_tournament_dates) {
            Some(Ok((first, _))) => Some(first),
            Some(Err(e)) => {
                warn!("Year {}: {}", self.pga_year, e);
                None
            }
            None => None,
        };

        let mut holes: BTreeMap<(String, u8, u8), RawHole> = BTreeMap::new();

        for course in &self.courses {
            for hole in &course.holes {
                for (i, round) in hole.rounds.iter().enumerate() {
                    let round_date = first_day.map(|d| d + Duration::days(i as i64));
                    holes.insert(
                        (course.course_id.clone(), hole.hole_number, round.round_id),
                        RawHole {
                            pga_year: self.pga_year,
                            course_id: course.course_id.clone(),
                            hole_num: hole.hole_number,
                            round_num: round.round_id,
                            distance: round.distance,
                            par: round.par,
                            stimp: round.stimp,
                            round_date,
                            player_shots: BTreeMap::new(),
                        },
                    );
                }
            }
        }

        for player_round in self.player_rounds {
            for player_hole in player_round.holes {
                let key = (
                    player_round.course_id.clone(),
                    player_hole.hole_number,
                    player_round.round_number,
                );
                match holes.get_mut(&key) {
                    Some(hole) => {
                        hole.player_shots
                            .insert(player_round.player_id.clone(), player_hole.shots);
                    }
                    None => {
                        warn!(
                            "Year {}: no hole setup for course {} hole {} round {} (player {})",
                            self.pga_year,
                            player_round.course_id,
                            player_hole.hole_number,
                            player_round.round_number,
                            player_round.player_id
                        );
                    }
                }
            }
        }

        debug!("Year {}: {} hole units", self.pga_year, holes.len());
        holes.into_values().collect()
    }
}
