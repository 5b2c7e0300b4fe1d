//! Run orchestrator.
//!
//! Coordinates one tournament end to end:
//! 1. Load raw season documents
//! 2. Annotate shots hole by hole
//! 3. Build grouped models, skipping those already stored
//! 4. Store shots and models in JSONL, optionally exporting Parquet

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::grouping::{GroupedModelBuilder, ModelRunSummary};
use crate::ingest;
use crate::models::ShotRecord;
use crate::pipeline::{process_tournament, PipelineReport, ShotRecordPipeline};
use crate::storage::{
    Dataset, JsonlReader, JsonlWriter, ModelStore, ParquetWriter, StorageConfig, StorageError,
};

/// Errors that stop a tournament run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No annotated shots for {0}; run `process` first")]
    NoShots(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Rebuild models that are already stored.
    pub force: bool,
    /// Also export Parquet tables.
    pub parquet: bool,
}

/// Result of annotating one tournament.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub shots: Vec<ShotRecord>,
    pub seasons: usize,
    pub report: PipelineReport,
    pub raw_errors: Vec<String>,
}

/// Summary of a full run over one tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub tournament: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub seasons: usize,
    pub pipeline: PipelineReport,
    pub models: ModelRunSummary,
    pub raw_errors: Vec<String>,
}

impl RunSummary {
    pub fn error_count(&self) -> usize {
        self.raw_errors.len() + self.pipeline.errors.len() + self.models.errors.len()
    }
}

/// Processing engine bound to one data lake.
pub struct Engine {
    storage: StorageConfig,
    pipeline: ShotRecordPipeline,
    builder: GroupedModelBuilder,
}

impl Engine {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_storage(config, StorageConfig::new(config.data_dir.clone()))
    }

    pub fn with_storage(config: &AppConfig, storage: StorageConfig) -> Self {
        Self {
            storage,
            pipeline: ShotRecordPipeline::new(config),
            builder: GroupedModelBuilder::new(config),
        }
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Raw documents to annotated shots, written to `shots.jsonl`.
    pub fn process(&self, tournament: &str, options: RunOptions) -> Result<ProcessOutcome, RunError> {
        let raw = ingest::load_tournament(&self.storage, tournament)?;
        let processed = process_tournament(&self.pipeline, tournament, &raw.holes);

        JsonlWriter::for_dataset(&self.storage, Dataset::Shots, tournament)
            .write_all(&processed.shots)?;
        if options.parquet {
            ParquetWriter::new(self.storage.clone()).write_shots(tournament, &processed.shots)?;
        }

        Ok(ProcessOutcome {
            shots: processed.shots,
            seasons: raw.years.len(),
            report: processed.report,
            raw_errors: raw.errors,
        })
    }

    /// Build and store models from the stored shot table.
    pub fn model_stored(
        &self,
        tournament: &str,
        store: &mut dyn ModelStore,
        options: RunOptions,
    ) -> Result<ModelRunSummary, RunError> {
        let reader: JsonlReader<ShotRecord> =
            JsonlReader::for_dataset(&self.storage, Dataset::Shots, tournament);
        if !reader.exists() {
            return Err(RunError::NoShots(tournament.to_string()));
        }
        let shots = reader.read_all()?;
        self.model(tournament, &shots, store, options)
    }

    /// Build models from `shots` and store them.
    pub fn model(
        &self,
        tournament: &str,
        shots: &[ShotRecord],
        store: &mut dyn ModelStore,
        options: RunOptions,
    ) -> Result<ModelRunSummary, RunError> {
        let persisted = store.persisted_keys(tournament)?;
        let mut run = self
            .builder
            .build(tournament, shots, &persisted, options.force);

        store.persist(&run.models)?;
        let keys: Vec<_> = run.models.iter().map(|m| m.key()).collect();
        for key in &keys {
            if let Err(e) = run.mark_persisted(key) {
                warn!("{}", e);
                run.summary.errors.push(e.to_string());
            }
        }

        if options.parquet {
            let stored = store.load_all(tournament)?;
            ParquetWriter::new(self.storage.clone()).write_model_rows(tournament, &stored)?;
        }

        Ok(run.summary)
    }

    /// Process then model one tournament.
    pub fn run(
        &self,
        tournament: &str,
        store: &mut dyn ModelStore,
        options: RunOptions,
    ) -> Result<RunSummary, RunError> {
        let started_at = Utc::now();
        let start = Instant::now();
        info!("Starting run for {}", tournament);

        let processed = self.process(tournament, options)?;
        let models = self.model(tournament, &processed.shots, store, options)?;

        let summary = RunSummary {
            run_id: Uuid::new_v4(),
            tournament: tournament.to_string(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            seasons: processed.seasons,
            pipeline: processed.report,
            models,
            raw_errors: processed.raw_errors,
        };

        info!(
            "Run {} for {} complete: {} shots, {} models persisted, {} errors in {}ms",
            summary.run_id,
            tournament,
            summary.pipeline.shots,
            summary.models.persisted,
            summary.error_count(),
            summary.duration_ms
        );
        Ok(summary)
    }
}
