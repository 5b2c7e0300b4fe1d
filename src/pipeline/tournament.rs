//! Tournament-level assembly of annotated shots.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{HoleError, ShotRecordPipeline};
use crate::models::{RawHole, ShotRecord};

/// What happened to the holes of one tournament.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub holes_processed: usize,
    pub holes_empty: usize,
    pub holes_not_tracked: usize,
    pub holes_rejected: usize,
    /// Player-holes left out because the player never holed out.
    #[serde(default)]
    pub players_unfinished: usize,
    pub shots: usize,
    pub errors: Vec<String>,
}

/// The concatenated shot table of a tournament.
#[derive(Debug, Clone, Default)]
pub struct TournamentShots {
    pub shots: Vec<ShotRecord>,
    pub report: PipelineReport,
}

/// Run the pipeline over every hole. A bad hole is skipped and reported; the rest continue.
pub fn process_tournament(
    pipeline: &ShotRecordPipeline,
    tournament: &str,
    holes: &[RawHole],
) -> TournamentShots {
    let mut out = TournamentShots::default();

    for hole in holes {
        match pipeline.process_hole(hole) {
            Ok(hole_shots) => {
                out.report.holes_processed += 1;
                out.report.players_unfinished += hole_shots.unfinished.len();
                out.report.shots += hole_shots.records.len();
                out.shots.extend(hole_shots.records);
            }
            Err(HoleError::Empty) => out.report.holes_empty += 1,
            Err(HoleError::NotTracked) => {
                warn!(
                    "{}: course {} hole {} round {} ({}) is not shot-tracked, skipping",
                    tournament, hole.course_id, hole.hole_num, hole.round_num, hole.pga_year
                );
                out.report.holes_not_tracked += 1;
            }
            Err(e) => {
                let msg = format!(
                    "{} {} course {} hole {} round {}: {}",
                    tournament, hole.pga_year, hole.course_id, hole.hole_num, hole.round_num, e
                );
                warn!("Skipping hole: {}", msg);
                out.report.holes_rejected += 1;
                out.report.errors.push(msg);
            }
        }
    }

    info!(
        "{}: {} holes processed, {} shots ({} empty, {} untracked, {} rejected, {} unfinished players)",
        tournament,
        out.report.holes_processed,
        out.report.shots,
        out.report.holes_empty,
        out.report.holes_not_tracked,
        out.report.holes_rejected,
        out.report.players_unfinished
    );
    out
}
