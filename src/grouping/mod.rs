//! Grouped expected-strokes model building.
//!
//! For each configured grouping, shots are partitioned by grouping value.
//! Within a partition every modeled shot type is split by surface, its
//! distances are cut into adaptive quantile bins, strokes are averaged per
//! bin and the bin means are smoothed into an expected-strokes curve.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::binning::QuantileBins;
use crate::config::{AppConfig, BinningConfig, GroupingConfig};
use crate::models::{
    DistanceBasis, GroupedShotModel, ModelKey, ModelRow, ModelState, ShotRecord, ShotType,
};
use crate::smooth::ExpectedStrokesSmoother;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("{key} {shot_type}: {count} shots have distance left but no shots remaining")]
    ContractViolation {
        key: String,
        shot_type: ShotType,
        count: usize,
    },

    #[error("{key}: cannot move from {from} to {to}")]
    InvalidTransition {
        key: String,
        from: ModelState,
        to: ModelState,
    },

    #[error("{0}: unknown model")]
    UnknownModel(String),
}

/// Counts reported at the end of a modeling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRunSummary {
    pub computed: usize,
    pub skipped_persisted: usize,
    pub failed: usize,
    pub persisted: usize,
    /// Shots with an unrecognized lie, left out of every model.
    pub unknown_excluded: usize,
    pub errors: Vec<String>,
}

/// Models built in one run, with their lifecycle states.
#[derive(Debug, Clone, Default)]
pub struct ModelRun {
    pub models: Vec<GroupedShotModel>,
    pub states: BTreeMap<ModelKey, ModelState>,
    pub summary: ModelRunSummary,
}

impl ModelRun {
    fn transition(&mut self, key: &ModelKey, to: ModelState) -> Result<(), ModelError> {
        let from = self.states.get(key).copied().unwrap_or_default();
        if !from.can_transition_to(to) {
            return Err(ModelError::InvalidTransition {
                key: key.to_string(),
                from,
                to,
            });
        }
        self.states.insert(key.clone(), to);
        Ok(())
    }

    /// Record that a computed model reached the store.
    pub fn mark_persisted(&mut self, key: &ModelKey) -> Result<(), ModelError> {
        if !self.states.contains_key(key) {
            return Err(ModelError::UnknownModel(key.to_string()));
        }
        self.transition(key, ModelState::Persisted)?;
        self.summary.persisted += 1;
        Ok(())
    }

    pub fn state_of(&self, key: &ModelKey) -> ModelState {
        self.states.get(key).copied().unwrap_or_default()
    }
}

/// One observation entering a curve.
#[derive(Debug, Clone, Copy)]
struct Sample {
    distance: f64,
    strokes: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GroupedModelBuilder {
    grouping: GroupingConfig,
    binning: BinningConfig,
    smoother: ExpectedStrokesSmoother,
}

impl GroupedModelBuilder {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            grouping: config.grouping.clone(),
            binning: config.binning.clone(),
            smoother: ExpectedStrokesSmoother::new(
                config.smoother.clone(),
                config.binning.target_quantile_count,
            ),
        }
    }

    /// Build every grouped model of a tournament.
    ///
    /// Keys in `persisted` are skipped unless `force` is set. A group that
    /// violates the data contract fails on its own; the run always completes.
    ///
    /// Skipping applies to every grouping, including single-dimension ones
    /// such as Course, Round or Hole whose models span several seasons. When a
    /// new season is added to a tournament those models keep their stored
    /// curves until the run is forced.
    pub fn build(
        &self,
        tournament: &str,
        shots: &[ShotRecord],
        persisted: &HashSet<ModelKey>,
        force: bool,
    ) -> ModelRun {
        let mut run = ModelRun::default();

        run.summary.unknown_excluded = shots
            .iter()
            .filter(|s| s.shot_type == ShotType::Unknown)
            .count();
        if run.summary.unknown_excluded > 0 {
            warn!(
                "{}: {} shots with unknown lie excluded from modeling",
                tournament, run.summary.unknown_excluded
            );
        }

        for grouping in &self.grouping.groupings {
            let mut partitions: BTreeMap<String, Vec<&ShotRecord>> = BTreeMap::new();
            for shot in shots {
                partitions
                    .entry(grouping.value_of(shot))
                    .or_default()
                    .push(shot);
            }

            for (value, group) in partitions {
                let key = ModelKey::new(tournament, &grouping.name, &value);
                if !force && persisted.contains(&key) {
                    debug!("{} already persisted, skipping", key);
                    run.summary.skipped_persisted += 1;
                    continue;
                }

                run.states.insert(key.clone(), ModelState::Uncomputed);
                if let Err(e) = run.transition(&key, ModelState::Computing) {
                    run.summary.errors.push(e.to_string());
                    continue;
                }

                match self.build_model(&key, &group) {
                    Ok(model) => {
                        if let Err(e) = run.transition(&key, ModelState::Computed) {
                            run.summary.errors.push(e.to_string());
                            continue;
                        }
                        run.summary.computed += 1;
                        run.models.push(model);
                    }
                    Err(e) => {
                        warn!("Model {} failed: {}", key, e);
                        run.states.insert(key.clone(), ModelState::Uncomputed);
                        run.summary.failed += 1;
                        run.summary.errors.push(e.to_string());
                    }
                }
            }
        }

        info!(
            "{}: {} models computed, {} skipped, {} failed",
            tournament, run.summary.computed, run.summary.skipped_persisted, run.summary.failed
        );
        run
    }

    /// Build the model of one grouping value.
    pub fn build_model(
        &self,
        key: &ModelKey,
        shots: &[&ShotRecord],
    ) -> Result<GroupedShotModel, ModelError> {
        let mut model = GroupedShotModel::empty(key);

        for shot_type in ShotType::MODELED {
            let basis = self.grouping.basis_for(shot_type);
            let mut by_surface: BTreeMap<&'static str, Vec<Sample>> = BTreeMap::new();
            let mut violations = 0usize;

            for shot in shots.iter().filter(|s| s.shot_type == shot_type) {
                let (surface, distance, strokes) = match basis {
                    DistanceBasis::Start => (
                        shot.from_surface.as_str(),
                        shot.start_distance,
                        shot.shots_remaining + 1,
                    ),
                    DistanceBasis::Left => {
                        if shot.distance_left > 0 && shot.shots_remaining == 0 {
                            violations += 1;
                        }
                        (
                            shot.to_surface.as_str(),
                            shot.distance_left,
                            shot.shots_remaining,
                        )
                    }
                };
                if distance == 0 {
                    continue;
                }
                by_surface.entry(surface).or_default().push(Sample {
                    distance: f64::from(distance),
                    strokes: f64::from(strokes),
                });
            }

            if violations > 0 {
                return Err(ModelError::ContractViolation {
                    key: key.to_string(),
                    shot_type,
                    count: violations,
                });
            }

            let mut rows = Vec::new();
            for (surface, samples) in by_surface {
                rows.extend(self.fit_curve(surface, &samples));
            }
            model.shot_types.insert(shot_type, rows);
        }

        debug!("{}: {} curve rows", key, model.row_count());
        Ok(model)
    }

    /// Bin, aggregate and smooth the samples of one surface.
    fn fit_curve(&self, surface: &str, samples: &[Sample]) -> Vec<ModelRow> {
        let distances: Vec<f64> = samples.iter().map(|s| s.distance).collect();
        let bins = QuantileBins::fit(
            &distances,
            self.binning.target_quantile_count,
            self.binning.quantile_shrink,
        );

        let mut sums = vec![(0.0f64, 0.0f64, 0usize); bins.len()];
        for sample in samples {
            if let Some(idx) = bins.index_of(sample.distance) {
                let entry = &mut sums[idx];
                entry.0 += sample.distance;
                entry.1 += sample.strokes;
                entry.2 += 1;
            }
        }

        let mut rows: Vec<ModelRow> = bins
            .bins()
            .iter()
            .zip(sums)
            .filter(|(_, (_, _, count))| *count > 0)
            .map(|(bin, (distance, strokes, count))| ModelRow {
                surface: surface.to_string(),
                distance_bin: bin.label.clone(),
                distance: distance / count as f64,
                shots_remaining: strokes / count as f64,
                expected_strokes: 0.0,
                sample_count: count,
            })
            .collect();

        let mean_distances: Vec<f64> = rows.iter().map(|r| r.distance).collect();
        let mean_strokes: Vec<f64> = rows.iter().map(|r| r.shots_remaining).collect();
        let expected = self.smoother.smooth(&mean_distances, &mean_strokes);
        for (row, value) in rows.iter_mut().zip(expected) {
            row.expected_strokes = value;
        }
        rows
    }
}
