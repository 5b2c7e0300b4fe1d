//! Grouped expected-strokes models and the keys that identify them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{ModelId, ShotRecord, ShotType};

/// A single attribute shots can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingDimension {
    Course,
    Year,
    Round,
    Hole,
}

impl GroupingDimension {
    /// Value of this dimension for a shot.
    pub fn value_of(&self, shot: &ShotRecord) -> String {
        match self {
            GroupingDimension::Course => shot.course_id.clone(),
            GroupingDimension::Year => shot.pga_year.to_string(),
            GroupingDimension::Round => shot.round_num.to_string(),
            GroupingDimension::Hole => shot.hole_num.to_string(),
        }
    }
}

/// A named combination of dimensions, e.g. `YearRound = [year, round]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub name: String,
    pub dimensions: Vec<GroupingDimension>,
}

impl Grouping {
    pub fn new(name: &str, dimensions: &[GroupingDimension]) -> Self {
        Self {
            name: name.to_string(),
            dimensions: dimensions.to_vec(),
        }
    }

    /// Grouping value for a shot; compound values are joined with a space.
    pub fn value_of(&self, shot: &ShotRecord) -> String {
        self.dimensions
            .iter()
            .map(|d| d.value_of(shot))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Course, Year, Round, Hole, YearRound and YearHole.
    pub fn defaults() -> Vec<Grouping> {
        use GroupingDimension::*;
        vec![
            Grouping::new("Course", &[Course]),
            Grouping::new("Year", &[Year]),
            Grouping::new("Round", &[Round]),
            Grouping::new("Hole", &[Hole]),
            Grouping::new("YearRound", &[Year, Round]),
            Grouping::new("YearHole", &[Year, Hole]),
        ]
    }
}

/// Which distance and surface a shot type is modeled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceBasis {
    /// Start distance and from-surface; strokes = shots remaining + 1.
    Start,
    /// Distance left and outcome location; strokes = shots remaining.
    Left,
}

/// Persistence key of a grouped model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelKey {
    pub tournament_name: String,
    pub grouped_by: String,
    pub group_detail: String,
}

impl ModelKey {
    pub fn new(tournament_name: &str, grouped_by: &str, group_detail: &str) -> Self {
        Self {
            tournament_name: tournament_name.to_string(),
            grouped_by: grouped_by.to_string(),
            group_detail: group_detail.to_string(),
        }
    }

    pub fn id(&self) -> ModelId {
        ModelId::generate(&[&self.tournament_name, &self.grouped_by, &self.group_detail])
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.tournament_name, self.grouped_by, self.group_detail
        )
    }
}

/// One distance bin of a fitted curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRow {
    pub surface: String,

    #[serde(rename = "distanceBinLabel")]
    pub distance_bin: String,

    /// Mean distance of the bin, inches.
    #[serde(rename = "meanDistance")]
    pub distance: f64,

    #[serde(rename = "meanShotsRemaining")]
    pub shots_remaining: f64,

    #[serde(rename = "expectedStrokesSmoothed")]
    pub expected_strokes: f64,

    #[serde(rename = "sampleCount")]
    pub sample_count: usize,
}

/// Expected-strokes curves for one grouping value, per shot type and surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedShotModel {
    pub id: ModelId,
    pub tournament_name: String,
    pub grouped_by: String,
    pub group_detail: String,

    /// Rows per shot type, ordered by surface then bin.
    #[serde(flatten)]
    pub shot_types: BTreeMap<ShotType, Vec<ModelRow>>,
}

impl GroupedShotModel {
    /// An empty model with every modeled shot type present.
    pub fn empty(key: &ModelKey) -> Self {
        Self {
            id: key.id(),
            tournament_name: key.tournament_name.clone(),
            grouped_by: key.grouped_by.clone(),
            group_detail: key.group_detail.clone(),
            shot_types: ShotType::MODELED
                .iter()
                .map(|t| (*t, Vec::new()))
                .collect(),
        }
    }

    pub fn key(&self) -> ModelKey {
        ModelKey::new(&self.tournament_name, &self.grouped_by, &self.group_detail)
    }

    /// Rows of one shot type on one surface, in bin order.
    pub fn curve(&self, shot_type: ShotType, surface: &str) -> Vec<&ModelRow> {
        self.shot_types
            .get(&shot_type)
            .map(|rows| rows.iter().filter(|r| r.surface == surface).collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self) -> usize {
        self.shot_types.values().map(|r| r.len()).sum()
    }
}

/// Lifecycle of a grouped model within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelState {
    #[default]
    Uncomputed,
    Computing,
    Computed,
    Persisted,
}

impl ModelState {
    pub fn can_transition_to(&self, next: ModelState) -> bool {
        matches!(
            (self, next),
            (ModelState::Uncomputed, ModelState::Computing)
                | (ModelState::Computing, ModelState::Computed)
                | (ModelState::Computed, ModelState::Persisted)
        )
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelState::Uncomputed => "uncomputed",
            ModelState::Computing => "computing",
            ModelState::Computed => "computed",
            ModelState::Persisted => "persisted",
        };
        write!(f, "{}", s)
    }
}
