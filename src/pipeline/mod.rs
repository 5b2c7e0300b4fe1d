//! Shot record pipeline.
//!
//! Turns one raw hole (shots keyed by player) into annotated [`ShotRecord`]s:
//! start distances are chained from the previous shot, consecutive duplicate
//! shot ids are dropped, each shot is classified, penalty strokes are folded
//! into the shot that caused them, and fixed-width bins are attached.
//! Players who never hole out are set aside so their last shot cannot claim
//! a distance left with no shots remaining.

mod tournament;

pub use tournament::{process_tournament, PipelineReport, TournamentShots};

use thiserror::Error;
use tracing::{debug, warn};

use crate::binning::FixedBinSet;
use crate::classify::{self, ShotTypeClassifier};
use crate::config::AppConfig;
use crate::models::{
    Direction, HoleKey, RawHole, RawShot, ShotRecord, ShotType, Surface, ToLocation,
};

/// Reasons a hole is skipped.
#[derive(Debug, Error, PartialEq)]
pub enum HoleError {
    #[error("hole has no recorded shots")]
    Empty,

    #[error("first recorded shot has no distance left, hole is not shot-tracked")]
    NotTracked,

    #[error("invalid par {0}")]
    InvalidPar(i64),

    #[error("invalid hole length {0} yards")]
    InvalidLength(i64),

    #[error("invalid {field} {value} for player {player} shot {shot_id}")]
    InvalidDistance {
        player: String,
        shot_id: u32,
        field: &'static str,
        value: i64,
    },

    #[error("missing or unparseable {field} for player {player} (row {row})")]
    MissingField {
        player: String,
        row: usize,
        field: &'static str,
    },

    #[error("invalid shot id {value} for player {player}")]
    InvalidShotId { player: String, value: i64 },
}

impl HoleError {
    /// Whether the hole broke the input contract, as opposed to simply having nothing to model.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            HoleError::InvalidPar(_)
                | HoleError::InvalidLength(_)
                | HoleError::InvalidDistance { .. }
                | HoleError::MissingField { .. }
                | HoleError::InvalidShotId { .. }
        )
    }
}

/// A raw shot whose numeric fields all parsed.
#[derive(Debug, Clone, Copy)]
struct ValidShot<'a> {
    raw: &'a RawShot,
    shot_id: u32,
    distance: u32,
    left: u32,
}

impl<'a> ValidShot<'a> {
    fn parse(player: &str, row: usize, raw: &'a RawShot) -> Result<Self, HoleError> {
        let require = |value: Option<i64>, field: &'static str| {
            value.ok_or_else(|| HoleError::MissingField {
                player: player.to_string(),
                row,
                field,
            })
        };

        let id = require(raw.shot_id, "shot id")?;
        let shot_id = u32::try_from(id)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| HoleError::InvalidShotId {
                player: player.to_string(),
                value: id,
            })?;
        let to_inches = |value: i64, field: &'static str| {
            u32::try_from(value).map_err(|_| HoleError::InvalidDistance {
                player: player.to_string(),
                shot_id,
                field,
                value,
            })
        };

        Ok(Self {
            raw,
            shot_id,
            distance: to_inches(require(raw.distance, "shot distance")?, "shot distance")?,
            left: to_inches(require(raw.left, "distance left")?, "distance left")?,
        })
    }
}

/// Annotated shots of one hole.
#[derive(Debug, Clone, Default)]
pub struct HoleShots {
    pub records: Vec<ShotRecord>,
    /// Players whose last recorded shot did not finish in the hole.
    pub unfinished: Vec<String>,
}

/// A validated raw shot with its classification.
#[derive(Debug, Clone)]
struct ClassifiedShot<'a> {
    raw: &'a RawShot,
    shot_id: u32,
    shot_distance: u32,
    start_distance: u32,
    distance_left: u32,
    shot_type: ShotType,
    from_surface: Surface,
    direction: Direction,
    to_surface: ToLocation,
    shots_remaining: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ShotRecordPipeline {
    classifier: ShotTypeClassifier,
    bins: FixedBinSet,
}

impl ShotRecordPipeline {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            classifier: ShotTypeClassifier::new(config.classifier.clone()),
            bins: FixedBinSet::from_config(&config.binning, &config.classifier),
        }
    }

    /// Annotate every shot on one hole.
    ///
    /// Any shot with a missing or invalid number rejects the whole hole.
    /// Players who stop before holing out are left out of the records and
    /// the hole average, and listed in [`HoleShots::unfinished`].
    pub fn process_hole(&self, hole: &RawHole) -> Result<HoleShots, HoleError> {
        if hole.is_empty() {
            return Err(HoleError::Empty);
        }
        let par = u8::try_from(hole.par)
            .ok()
            .filter(|p| *p > 0)
            .ok_or(HoleError::InvalidPar(hole.par))?;
        let hole_length = u32::try_from(hole.distance)
            .ok()
            .and_then(|yards| yards.checked_mul(36))
            .ok_or(HoleError::InvalidLength(hole.distance))?;

        let first_left = hole
            .player_shots
            .values()
            .find_map(|shots| shots.first())
            .and_then(|s| s.left);
        if first_left == Some(0) {
            return Err(HoleError::NotTracked);
        }

        let key = HoleKey {
            pga_year: hole.pga_year,
            course_id: hole.course_id.clone(),
            hole_num: hole.hole_num,
            round_num: hole.round_num,
        };

        let mut players = Vec::new();
        let mut unfinished = Vec::new();
        for (player, shots) in &hole.player_shots {
            if shots.is_empty() {
                continue;
            }
            let classified = self.classify_player(&key, player, shots, par, hole_length)?;
            if !holed_out(&classified) {
                warn!(
                    "{}: player {} did not finish the hole, leaving out {} shots",
                    key,
                    player,
                    classified.len()
                );
                unfinished.push(player.clone());
                continue;
            }
            players.push((player, classified));
        }
        if players.is_empty() {
            return Ok(HoleShots {
                records: Vec::new(),
                unfinished,
            });
        }

        let hole_avg = players
            .iter()
            .map(|(_, shots)| player_score(shots) as f64)
            .sum::<f64>()
            / players.len() as f64;

        let mut records = Vec::new();
        for (player, shots) in players {
            records.extend(self.finish_player(hole, &key, par, hole_avg, player, shots));
        }

        debug!("{}: {} shots annotated", key, records.len());
        Ok(HoleShots {
            records,
            unfinished,
        })
    }

    /// Dedup, chain start distances, classify, and count remaining shots for one player.
    fn classify_player<'a>(
        &self,
        key: &HoleKey,
        player: &str,
        shots: &'a [RawShot],
        par: u8,
        hole_length: u32,
    ) -> Result<Vec<ClassifiedShot<'a>>, HoleError> {
        let mut deduped: Vec<ValidShot<'a>> = Vec::with_capacity(shots.len());
        for (row, raw) in shots.iter().enumerate() {
            let shot = ValidShot::parse(player, row + 1, raw)?;
            if deduped.last().map(|s| s.shot_id) == Some(shot.shot_id) {
                debug!("{}: dropping repeated shot {} for player {}", key, shot.shot_id, player);
                continue;
            }
            deduped.push(shot);
        }

        let count = deduped.len();
        let mut classified: Vec<ClassifiedShot<'a>> = Vec::with_capacity(count);
        let mut prev_left: Option<u32> = None;

        for (i, shot) in deduped.into_iter().enumerate() {
            let raw = shot.raw;
            let shot_distance = shot.distance;
            let distance_left = shot.left;

            let start_distance = if raw.from == "OTB" {
                hole_length
            } else if let Some(left) = prev_left {
                left
            } else {
                warn!(
                    "{}: player {} shot {} has no previous shot, start distance unknown",
                    key, player, shot.shot_id
                );
                0
            };

            let (shot_type, from_surface) =
                self.classifier
                    .classify(&raw.from, start_distance, par, shot_distance);
            let (direction, to_surface) = classify::classify_end_location(&raw.to);

            classified.push(ClassifiedShot {
                raw,
                shot_id: shot.shot_id,
                shot_distance,
                start_distance,
                distance_left,
                shot_type,
                from_surface,
                direction,
                to_surface,
                shots_remaining: (count - i - 1) as u32,
            });
            prev_left = Some(distance_left);
        }

        // A shot followed by a penalty stroke ended in a penalty area.
        for i in 0..classified.len().saturating_sub(1) {
            if classified[i + 1].shot_type == ShotType::Penalty {
                classified[i].direction = Direction::Penalty;
                classified[i].to_surface = ToLocation::Penalty;
            }
        }

        Ok(classified)
    }

    /// Fold penalties, derive flags and bins, and emit records for one player.
    fn finish_player(
        &self,
        hole: &RawHole,
        key: &HoleKey,
        par: u8,
        hole_avg: f64,
        player: &str,
        shots: Vec<ClassifiedShot<'_>>,
    ) -> Vec<ShotRecord> {
        let score = player_score(&shots);
        let advanced_pct = self.classifier.config().advanced_pct;

        let mut kept: Vec<ClassifiedShot<'_>> = shots
            .into_iter()
            .filter(|s| s.shot_type != ShotType::Penalty)
            .collect();

        let mut records = Vec::with_capacity(kept.len());
        let mut prev_left = 0u32;

        for i in 0..kept.len() {
            let next = kept.get(i + 1).map(|n| (n.start_distance, n.shot_id));
            let shot = &mut kept[i];

            let is_advanced = classify::is_advanced(
                shot.shot_type,
                shot.start_distance,
                shot.distance_left,
                advanced_pct,
            );

            let penalty = shot.to_surface == ToLocation::Penalty;
            if penalty {
                shot.distance_left = next.map(|(start, _)| start).unwrap_or(0);
            } else if shot.distance_left > shot.start_distance && shot.start_distance > 0 {
                warn!(
                    "{}: player {} shot {} finished further away ({} > {})",
                    key,
                    player,
                    shot.shot_id,
                    shot.distance_left,
                    shot.start_distance
                );
            }

            let strokes_taken = next
                .map(|(_, next_id)| next_id.saturating_sub(shot.shot_id))
                .filter(|d| *d > 0)
                .unwrap_or(1);

            records.push(ShotRecord {
                player_id: player.to_string(),
                hole_num: hole.hole_num,
                round_num: hole.round_num,
                course_id: hole.course_id.clone(),
                pga_year: hole.pga_year,
                round_date: hole.round_date,
                par,
                stimp: hole.stimp,
                shot_id: shot.shot_id,
                shot_distance: shot.shot_distance,
                start_distance: shot.start_distance,
                distance_left: shot.distance_left,
                from_code: shot.raw.from.clone(),
                to_code: shot.raw.to.clone(),
                shot_type: shot.shot_type,
                from_surface: shot.from_surface,
                direction: shot.direction,
                to_surface: shot.to_surface,
                shots_remaining: shot.shots_remaining,
                strokes_taken,
                player_score: score,
                hole_avg,
                is_advanced,
                is_re_tee: classify::is_re_tee(shot.shot_type, shot.start_distance, shot.distance_left),
                is_drop: classify::is_drop(shot.start_distance, prev_left),
                start_distance_bin: self.bins.start_label(shot.shot_type, shot.start_distance),
                distance_left_5yd_bin: self.bins.left_5yd_label(shot.distance_left),
                distance_left_1ft_bin: self.bins.left_1ft_label(shot.distance_left),
            });
            prev_left = shot.distance_left;
        }

        records
    }
}

/// Whether the player's last stroke finished in the hole.
///
/// A trailing penalty row counts as finished; folding it leaves no distance.
fn holed_out(shots: &[ClassifiedShot<'_>]) -> bool {
    match shots.last() {
        Some(last) if last.shot_type == ShotType::Penalty => true,
        Some(last) => last.distance_left == 0 || last.to_surface == ToLocation::Hole,
        None => false,
    }
}

/// Player's strokes on the hole: the highest recorded shot id.
fn player_score(shots: &[ClassifiedShot<'_>]) -> u32 {
    shots.iter().map(|s| s.shot_id).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn shot(shot_id: i64, distance: i64, from: &str, to: &str, left: i64) -> RawShot {
        RawShot {
            shot_id: Some(shot_id),
            distance: Some(distance),
            from: from.to_string(),
            to: to.to_string(),
            left: Some(left),
        }
    }

    fn hole(distance_yards: i64, par: i64, players: Vec<(&str, Vec<RawShot>)>) -> RawHole {
        RawHole {
            pga_year: 2020,
            course_id: "500".to_string(),
            hole_num: 1,
            round_num: 1,
            distance: distance_yards,
            par,
            stimp: Some(11.5),
            round_date: None,
            player_shots: players
                .into_iter()
                .map(|(p, s)| (p.to_string(), s))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    /// Tee 400 yds, fairway from 180 yds, putt from 20 inches.
    fn three_shot_hole() -> RawHole {
        hole(
            400,
            4,
            vec![(
                "1001",
                vec![
                    shot(1, 7920, "OTB", "OFW", 6480),
                    shot(2, 6460, "OFW", "OGR", 20),
                    shot(3, 20, "OGR", "hole", 0),
                ],
            )],
        )
    }

    #[test]
    fn test_three_shot_hole() {
        let records = ShotRecordPipeline::default()
            .process_hole(&three_shot_hole())
            .unwrap()
            .records;

        let types: Vec<ShotType> = records.iter().map(|r| r.shot_type).collect();
        assert_eq!(types, vec![ShotType::Tee, ShotType::App, ShotType::ShtPutt]);

        let remaining: Vec<u32> = records.iter().map(|r| r.shots_remaining).collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let starts: Vec<u32> = records.iter().map(|r| r.start_distance).collect();
        assert_eq!(starts, vec![14400, 6480, 20]);

        assert_eq!(records[2].to_surface, ToLocation::Hole);
        assert!(records.iter().all(|r| r.player_score == 3 && r.hole_avg == 3.0));
        assert!(records.iter().all(|r| r.strokes_taken == 1));
        assert!(records.iter().all(|r| !r.is_drop && !r.is_re_tee));
    }

    #[test]
    fn test_distance_chain_holds() {
        let records = ShotRecordPipeline::default()
            .process_hole(&three_shot_hole())
            .unwrap()
            .records;
        for pair in records.windows(2) {
            assert_eq!(pair[0].distance_left, pair[1].start_distance);
        }
    }

    #[test]
    fn test_bins_attached() {
        let records = ShotRecordPipeline::default()
            .process_hole(&three_shot_hole())
            .unwrap()
            .records;
        assert_eq!(records[0].start_distance_bin.as_deref(), Some("(390 to 400] yds"));
        assert_eq!(records[1].start_distance_bin.as_deref(), Some("(175 to 180] yds"));
        assert_eq!(records[2].start_distance_bin.as_deref(), Some("(16 to 20] in"));
        assert_eq!(records[0].distance_left_5yd_bin.as_deref(), Some("(175 to 180] yds"));
        assert_eq!(records[2].distance_left_1ft_bin.as_deref(), Some("(0 to 1] ft"));
    }

    #[test]
    fn test_penalty_folded_into_previous_shot() {
        let h = hole(
            400,
            4,
            vec![(
                "1001",
                vec![
                    shot(1, 9000, "OTB", "OWA", 5400),
                    shot(2, 0, "OWA", "ODO", 5400),
                    shot(3, 5000, "ORO", "OGR", 300),
                    shot(4, 300, "OGR", "hole", 0),
                ],
            )],
        );
        let records = ShotRecordPipeline::default().process_hole(&h).unwrap().records;

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.shot_type != ShotType::Penalty));

        let tee = &records[0];
        assert_eq!(tee.to_surface, ToLocation::Penalty);
        assert_eq!(tee.direction, Direction::Penalty);
        assert_eq!(tee.shots_remaining, 3);
        assert_eq!(tee.strokes_taken, 2);
        // Distance left becomes the next remaining shot's start.
        assert_eq!(tee.distance_left, records[1].start_distance);
        assert_eq!(tee.player_score, 4);
    }

    #[test]
    fn test_penalty_on_last_shot_leaves_zero() {
        let h = hole(
            180,
            3,
            vec![(
                "1001",
                vec![shot(1, 6000, "OTB", "OWA", 600), shot(2, 0, "OWA", "OWA", 600)],
            )],
        );
        let records = ShotRecordPipeline::default().process_hole(&h).unwrap().records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].shot_type, ShotType::App);
        assert_eq!(records[0].distance_left, 0);
    }

    #[test]
    fn test_drop_detection() {
        let pipeline = ShotRecordPipeline::default();
        let chained = hole(
            400,
            4,
            vec![(
                "1001",
                vec![
                    shot(1, 9000, "OTB", "OTH", 5400),
                    shot(2, 200, "OTH", "ORO", 5000),
                    shot(3, 4700, "ORO", "OGR", 300),
                    shot(4, 300, "OGR", "hole", 0),
                ],
            )],
        );
        let records = pipeline.process_hole(&chained).unwrap().records;
        assert!(records.iter().all(|r| !r.is_drop));

        // Replayed from the tee without a penalty row: start no longer matches the previous left.
        let replayed = hole(
            400,
            4,
            vec![(
                "1001",
                vec![
                    shot(1, 9000, "OTB", "OTH", 5400),
                    shot(2, 9400, "OTB", "ORO", 5000),
                    shot(3, 4700, "ORO", "OGR", 300),
                    shot(4, 300, "OGR", "hole", 0),
                ],
            )],
        );
        let records = pipeline.process_hole(&replayed).unwrap().records;
        assert!(!records[0].is_drop);
        assert!(records[1].is_drop);
        assert!(!records[2].is_drop);
    }

    #[test]
    fn test_re_tee() {
        let h = hole(
            400,
            4,
            vec![(
                "1001",
                vec![
                    shot(1, 9000, "OTB", "OTB", 14400),
                    shot(2, 9000, "OTB", "OFW", 5400),
                    shot(3, 5380, "OFW", "OGR", 20),
                    shot(4, 20, "OGR", "hole", 0),
                ],
            )],
        );
        let records = ShotRecordPipeline::default().process_hole(&h).unwrap().records;
        assert!(records[0].is_re_tee);
        assert!(!records[1].is_re_tee);
    }

    #[test]
    fn test_duplicate_shot_ids_dropped() {
        let h = hole(
            400,
            4,
            vec![(
                "1001",
                vec![
                    shot(1, 7920, "OTB", "OFW", 6480),
                    shot(1, 7920, "OTB", "OFW", 6480),
                    shot(2, 6460, "OFW", "OGR", 20),
                    shot(3, 20, "OGR", "hole", 0),
                ],
            )],
        );
        let records = ShotRecordPipeline::default().process_hole(&h).unwrap().records;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].shots_remaining, 2);
    }

    #[test]
    fn test_hole_average_across_players() {
        let h = hole(
            400,
            4,
            vec![
                (
                    "1001",
                    vec![
                        shot(1, 7920, "OTB", "OFW", 6480),
                        shot(2, 6460, "OFW", "OGR", 20),
                        shot(3, 20, "OGR", "hole", 0),
                    ],
                ),
                (
                    "1002",
                    vec![
                        shot(1, 7920, "OTB", "OFW", 6480),
                        shot(2, 6000, "OFW", "OGR", 480),
                        shot(3, 440, "OGR", "OGR", 40),
                        shot(4, 40, "OGR", "hole", 0),
                    ],
                ),
                ("1003", vec![]),
            ],
        );
        let records = ShotRecordPipeline::default().process_hole(&h).unwrap().records;
        assert_eq!(records.len(), 7);
        assert!(records.iter().all(|r| r.hole_avg == 3.5));
        let second: Vec<&ShotRecord> = records.iter().filter(|r| r.player_id == "1002").collect();
        assert_eq!(second[2].shot_type, ShotType::LngPutt);
        assert_eq!(second[0].player_score, 4);
    }

    #[test]
    fn test_empty_hole() {
        let h = hole(400, 4, vec![("1001", vec![])]);
        assert_eq!(
            ShotRecordPipeline::default().process_hole(&h).unwrap_err(),
            HoleError::Empty
        );
    }

    #[test]
    fn test_untracked_hole() {
        let h = hole(400, 4, vec![("1001", vec![shot(1, 7920, "OTB", "OFW", 0)])]);
        let err = ShotRecordPipeline::default().process_hole(&h).unwrap_err();
        assert_eq!(err, HoleError::NotTracked);
        assert!(!err.is_contract_violation());
    }

    #[test]
    fn test_contract_violations() {
        let pipeline = ShotRecordPipeline::default();

        let zero_par = hole(400, 0, vec![("1001", vec![shot(1, 7920, "OTB", "OFW", 6480)])]);
        let err = pipeline.process_hole(&zero_par).unwrap_err();
        assert_eq!(err, HoleError::InvalidPar(0));
        assert!(err.is_contract_violation());

        let negative = hole(400, 4, vec![("1001", vec![shot(1, 7920, "OTB", "OFW", -5)])]);
        let err = pipeline.process_hole(&negative).unwrap_err();
        assert!(matches!(err, HoleError::InvalidDistance { value: -5, .. }));
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_unknown_lie_is_kept() {
        let h = hole(
            400,
            4,
            vec![(
                "1001",
                vec![shot(1, 7920, "OTB", "OXX", 6480), shot(2, 6480, "OXX", "hole", 0)],
            )],
        );
        let records = ShotRecordPipeline::default().process_hole(&h).unwrap().records;
        assert_eq!(records[0].to_surface, ToLocation::Unknown);
        assert_eq!(records[1].shot_type, ShotType::Unknown);
        assert_eq!(records[1].start_distance_bin, None);
    }

    #[test]
    fn test_missing_number_rejects_hole() {
        let mut bad = shot(2, 6460, "OFW", "OGR", 20);
        bad.left = None;
        let h = hole(
            400,
            4,
            vec![(
                "1001",
                vec![shot(1, 7920, "OTB", "OFW", 6480), bad, shot(3, 20, "OGR", "hole", 0)],
            )],
        );
        let err = ShotRecordPipeline::default().process_hole(&h).unwrap_err();
        assert_eq!(
            err,
            HoleError::MissingField {
                player: "1001".to_string(),
                row: 2,
                field: "distance left",
            }
        );
        assert!(err.is_contract_violation());

        let mut no_id = shot(1, 7920, "OTB", "OFW", 6480);
        no_id.shot_id = Some(0);
        let h = hole(400, 4, vec![("1001", vec![no_id])]);
        let err = ShotRecordPipeline::default().process_hole(&h).unwrap_err();
        assert!(matches!(err, HoleError::InvalidShotId { value: 0, .. }));
    }

    #[test]
    fn test_unfinished_player_left_out() {
        let h = hole(
            400,
            4,
            vec![
                (
                    "1001",
                    vec![
                        shot(1, 7920, "OTB", "OFW", 6480),
                        shot(2, 6460, "OFW", "OGR", 20),
                        shot(3, 20, "OGR", "hole", 0),
                    ],
                ),
                (
                    "1002",
                    vec![shot(1, 7920, "OTB", "OFW", 6480), shot(2, 6180, "OFW", "OGR", 300)],
                ),
            ],
        );
        let out = ShotRecordPipeline::default().process_hole(&h).unwrap();
        assert_eq!(out.unfinished, vec!["1002".to_string()]);
        assert_eq!(out.records.len(), 3);
        assert!(out.records.iter().all(|r| r.player_id == "1001"));
        assert!(out.records.iter().all(|r| r.hole_avg == 3.0));
    }
}
