//! Loading raw tournament data from the data lake.
//!
//! Each tournament keeps one JSON document per season under
//! `raw/<tournament>/*.json`. Documents are flattened into per-hole units
//! ready for the shot pipeline.

use std::collections::BTreeSet;
use std::fs;

use glob::glob;
use tracing::{debug, info, warn};

use crate::models::{RawHole, TournamentYear};
use crate::storage::{StorageConfig, StorageError};

/// All raw holes of one tournament, across its seasons.
#[derive(Debug, Clone, Default)]
pub struct RawTournament {
    pub name: String,
    pub years: Vec<i32>,
    pub holes: Vec<RawHole>,
    /// Documents that could not be read or parsed.
    pub errors: Vec<String>,
}

/// Tournaments with at least one raw document, sorted by name.
pub fn discover_tournaments(config: &StorageConfig) -> Result<Vec<String>, StorageError> {
    let pattern = config.raw_dir().join("*").join("*.json");
    let mut names = BTreeSet::new();

    for entry in glob(&pattern.to_string_lossy())? {
        match entry {
            Ok(path) => {
                if let Some(name) = path
                    .parent()
                    .and_then(|p| p.file_name())
                    .and_then(|n| n.to_str())
                {
                    names.insert(name.to_string());
                }
            }
            Err(e) => warn!("Unreadable raw entry: {}", e),
        }
    }

    Ok(names.into_iter().collect())
}

/// Load every season document of a tournament.
///
/// A document that cannot be parsed is skipped and reported; the others load.
pub fn load_tournament(config: &StorageConfig, tournament: &str) -> Result<RawTournament, StorageError> {
    let dir = config.tournament_raw_dir(tournament);
    if !dir.exists() {
        return Err(StorageError::PathNotFound(dir));
    }

    let mut out = RawTournament {
        name: tournament.to_string(),
        ..Default::default()
    };

    let pattern = dir.join("*.json");
    let mut paths: Vec<_> = glob(&pattern.to_string_lossy())?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Unreadable raw entry: {}", e);
                None
            }
        })
        .collect();
    paths.sort();

    for path in paths {
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                out.errors.push(format!("{}: {}", path.display(), e));
                continue;
            }
        };

        match TournamentYear::from_json(&contents) {
            Ok(doc) => {
                if let Some(name) = doc.tournament_name.as_deref() {
                    if name != tournament {
                        debug!("{:?} names tournament '{}'", path, name);
                    }
                }
                out.years.push(doc.pga_year);
                let holes = doc.into_holes();
                debug!("{:?}: {} hole units", path, holes.len());
                out.holes.extend(holes);
            }
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                out.errors.push(format!("{}: {}", path.display(), e));
            }
        }
    }

    info!(
        "{}: loaded {} seasons, {} hole units",
        tournament,
        out.years.len(),
        out.holes.len()
    );
    Ok(out)
}
