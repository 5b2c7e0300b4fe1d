//! # sg-engine
//!
//! Shot classification and expected-strokes modeling for PGA shot telemetry.
//!
//! ## Architecture
//!
//! - **models**: Raw feed documents, annotated shots, grouped models
//! - **classify**: Shot type, surface and outcome classification
//! - **binning**: Fixed-width and adaptive quantile distance bins
//! - **smooth**: LOWESS smoothing of expected-strokes curves
//! - **pipeline**: Raw hole to annotated shot records
//! - **grouping**: Grouped expected-strokes model building
//! - **calculate**: Strokes-gained lookups on fitted curves
//! - **storage**: Filesystem data lake operations (JSONL, Parquet)
//! - **ingest**: Raw document discovery and loading
//! - **run**: End-to-end orchestration per tournament
//! - **config**: Configuration loading and validation

pub mod binning;
pub mod calculate;
pub mod classify;
pub mod config;
pub mod grouping;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod run;
pub mod smooth;
pub mod storage;

pub use models::*;
