//! Filesystem data lake operations.
//!
//! Handles reading and writing to the local data lake:
//! - Raw tournament-year documents
//! - Annotated shot tables and model documents (JSONL)
//! - Parquet analytics exports

pub mod jsonl;
pub mod model_store;
pub mod parquet;

pub use jsonl::{list_tournaments, Dataset, JsonlReader, JsonlWriter};
pub use model_store::{InMemoryModelStore, JsonlModelStore, ModelStore};
pub use parquet::{ParquetReader, ParquetWriter, TableType};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn normalized_dir(&self) -> PathBuf {
        self.data_dir.join("normalized")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    pub fn parquet_dir(&self) -> PathBuf {
        self.data_dir.join("parquet")
    }

    /// Directory holding a tournament's raw year documents.
    pub fn tournament_raw_dir(&self, tournament: &str) -> PathBuf {
        self.raw_dir().join(tournament)
    }

    pub fn shots_path(&self, tournament: &str) -> PathBuf {
        self.normalized_dir()
            .join(tournament)
            .join(Dataset::Shots.filename())
    }

    pub fn models_path(&self, tournament: &str) -> PathBuf {
        self.models_dir()
            .join(tournament)
            .join(Dataset::Models.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
