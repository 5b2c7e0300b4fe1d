//! Parquet storage for analytics.
//!
//! Parquet files are derived from JSONL for fast analytical queries.
//! They are rebuilt from source JSONL when needed.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int32Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::{debug, info};

use super::{StorageConfig, StorageError};
use crate::models::{GroupedShotModel, ShotRecord};

/// Parquet table types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    Shots,
    ModelRows,
}

impl TableType {
    pub fn filename(&self) -> &'static str {
        match self {
            TableType::Shots => "shots.parquet",
            TableType::ModelRows => "model_rows.parquet",
        }
    }
}

/// Schema definitions for Parquet tables.
pub mod schemas {
    use super::*;

    /// Schema for the annotated shot table.
    pub fn shots_schema() -> Schema {
        Schema::new(vec![
            Field::new("player_id", DataType::Utf8, false),
            Field::new("course_id", DataType::Utf8, false),
            Field::new("pga_year", DataType::Int32, false),
            Field::new("hole_num", DataType::UInt32, false),
            Field::new("round_num", DataType::UInt32, false),
            Field::new("round_date", DataType::Utf8, true),
            Field::new("par", DataType::UInt32, false),
            Field::new("stimp", DataType::Float64, true),
            Field::new("shot_id", DataType::UInt32, false),
            Field::new("shot_distance", DataType::UInt32, false),
            Field::new("start_distance", DataType::UInt32, false),
            Field::new("distance_left", DataType::UInt32, false),
            Field::new("from_code", DataType::Utf8, false),
            Field::new("to_code", DataType::Utf8, false),
            Field::new("shot_type", DataType::Utf8, false),
            Field::new("from_surface", DataType::Utf8, false),
            Field::new("direction", DataType::Utf8, false),
            Field::new("to_surface", DataType::Utf8, false),
            Field::new("shots_remaining", DataType::UInt32, false),
            Field::new("strokes_taken", DataType::UInt32, false),
            Field::new("player_score", DataType::UInt32, false),
            Field::new("hole_avg", DataType::Float64, false),
            Field::new("is_advanced", DataType::Boolean, false),
            Field::new("is_re_tee", DataType::Boolean, false),
            Field::new("is_drop", DataType::Boolean, false),
            Field::new("start_distance_bin", DataType::Utf8, true),
            Field::new("distance_left_5yd_bin", DataType::Utf8, true),
            Field::new("distance_left_1ft_bin", DataType::Utf8, true),
        ])
    }

    /// Schema for flattened model curve rows.
    pub fn model_rows_schema() -> Schema {
        Schema::new(vec![
            Field::new("model_id", DataType::Utf8, false),
            Field::new("tournament_name", DataType::Utf8, false),
            Field::new("grouped_by", DataType::Utf8, false),
            Field::new("group_detail", DataType::Utf8, false),
            Field::new("shot_type", DataType::Utf8, false),
            Field::new("surface", DataType::Utf8, false),
            Field::new("distance_bin", DataType::Utf8, false),
            Field::new("mean_distance", DataType::Float64, false),
            Field::new("mean_shots_remaining", DataType::Float64, false),
            Field::new("expected_strokes", DataType::Float64, false),
            Field::new("sample_count", DataType::UInt64, false),
        ])
    }
}

/// Parquet file writer.
pub struct ParquetWriter {
    config: StorageConfig,
}

impl ParquetWriter {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn table_path(&self, table: TableType, tournament: &str) -> PathBuf {
        self.config
            .parquet_dir()
            .join(tournament)
            .join(table.filename())
    }

    fn ensure_dir(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write the annotated shot table.
    pub fn write_shots(&self, tournament: &str, shots: &[ShotRecord]) -> Result<(), StorageError> {
        let path = self.table_path(TableType::Shots, tournament);
        self.ensure_dir(&path)?;

        let schema = Arc::new(schemas::shots_schema());

        let strs = |f: fn(&ShotRecord) -> &str| -> ArrayRef {
            Arc::new(StringArray::from(shots.iter().map(f).collect::<Vec<_>>()))
        };
        let opt_strs = |f: fn(&ShotRecord) -> Option<&str>| -> ArrayRef {
            Arc::new(StringArray::from(shots.iter().map(f).collect::<Vec<_>>()))
        };
        let u32s = |f: fn(&ShotRecord) -> u32| -> ArrayRef {
            Arc::new(UInt32Array::from(shots.iter().map(f).collect::<Vec<_>>()))
        };
        let bools = |f: fn(&ShotRecord) -> bool| -> ArrayRef {
            Arc::new(BooleanArray::from(shots.iter().map(f).collect::<Vec<_>>()))
        };

        // Dates and enums are written as their display strings.
        let dates: Vec<Option<String>> = shots
            .iter()
            .map(|s| s.round_date.map(|d| d.to_string()))
            .collect();
        let date_refs: Vec<Option<&str>> = dates.iter().map(|d| d.as_deref()).collect();
        let directions: Vec<String> = shots.iter().map(|s| s.direction.to_string()).collect();
        let direction_refs: Vec<&str> = directions.iter().map(|d| d.as_str()).collect();

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                strs(|s| s.player_id.as_str()),
                strs(|s| s.course_id.as_str()),
                Arc::new(Int32Array::from(
                    shots.iter().map(|s| s.pga_year).collect::<Vec<_>>(),
                )) as ArrayRef,
                u32s(|s| u32::from(s.hole_num)),
                u32s(|s| u32::from(s.round_num)),
                Arc::new(StringArray::from(date_refs)) as ArrayRef,
                u32s(|s| u32::from(s.par)),
                Arc::new(Float64Array::from(
                    shots.iter().map(|s| s.stimp).collect::<Vec<_>>(),
                )) as ArrayRef,
                u32s(|s| s.shot_id),
                u32s(|s| s.shot_distance),
                u32s(|s| s.start_distance),
                u32s(|s| s.distance_left),
                strs(|s| s.from_code.as_str()),
                strs(|s| s.to_code.as_str()),
                strs(|s| s.shot_type.as_str()),
                strs(|s| s.from_surface.as_str()),
                Arc::new(StringArray::from(direction_refs)) as ArrayRef,
                strs(|s| s.to_surface.as_str()),
                u32s(|s| s.shots_remaining),
                u32s(|s| s.strokes_taken),
                u32s(|s| s.player_score),
                Arc::new(Float64Array::from(
                    shots.iter().map(|s| s.hole_avg).collect::<Vec<_>>(),
                )) as ArrayRef,
                bools(|s| s.is_advanced),
                bools(|s| s.is_re_tee),
                bools(|s| s.is_drop),
                opt_strs(|s| s.start_distance_bin.as_deref()),
                opt_strs(|s| s.distance_left_5yd_bin.as_deref()),
                opt_strs(|s| s.distance_left_1ft_bin.as_deref()),
            ],
        )?;

        self.write_batch(&path, &schema, &batch)?;

        info!("Wrote {} shots to {:?}", shots.len(), path);
        Ok(())
    }

    /// Write every curve row of the given models, one row per bin.
    pub fn write_model_rows(
        &self,
        tournament: &str,
        models: &[GroupedShotModel],
    ) -> Result<usize, StorageError> {
        let path = self.table_path(TableType::ModelRows, tournament);
        self.ensure_dir(&path)?;

        let schema = Arc::new(schemas::model_rows_schema());

        let mut model_ids = Vec::new();
        let mut tournaments = Vec::new();
        let mut grouped_bys = Vec::new();
        let mut details = Vec::new();
        let mut shot_types = Vec::new();
        let mut surfaces = Vec::new();
        let mut bins = Vec::new();
        let mut distances = Vec::new();
        let mut remaining = Vec::new();
        let mut expected = Vec::new();
        let mut counts = Vec::new();

        for model in models {
            for (shot_type, rows) in &model.shot_types {
                for row in rows {
                    model_ids.push(model.id.as_str());
                    tournaments.push(model.tournament_name.as_str());
                    grouped_bys.push(model.grouped_by.as_str());
                    details.push(model.group_detail.as_str());
                    shot_types.push(shot_type.as_str());
                    surfaces.push(row.surface.as_str());
                    bins.push(row.distance_bin.as_str());
                    distances.push(row.distance);
                    remaining.push(row.shots_remaining);
                    expected.push(row.expected_strokes);
                    counts.push(row.sample_count as u64);
                }
            }
        }
        let row_count = model_ids.len();

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(model_ids)) as ArrayRef,
                Arc::new(StringArray::from(tournaments)) as ArrayRef,
                Arc::new(StringArray::from(grouped_bys)) as ArrayRef,
                Arc::new(StringArray::from(details)) as ArrayRef,
                Arc::new(StringArray::from(shot_types)) as ArrayRef,
                Arc::new(StringArray::from(surfaces)) as ArrayRef,
                Arc::new(StringArray::from(bins)) as ArrayRef,
                Arc::new(Float64Array::from(distances)) as ArrayRef,
                Arc::new(Float64Array::from(remaining)) as ArrayRef,
                Arc::new(Float64Array::from(expected)) as ArrayRef,
                Arc::new(UInt64Array::from(counts)) as ArrayRef,
            ],
        )?;

        self.write_batch(&path, &schema, &batch)?;

        info!("Wrote {} model rows to {:?}", row_count, path);
        Ok(row_count)
    }

    fn write_batch(
        &self,
        path: &Path,
        schema: &Arc<Schema>,
        batch: &RecordBatch,
    ) -> Result<(), StorageError> {
        let file = File::create(path)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        writer.write(batch)?;
        writer.close()?;

        Ok(())
    }
}

/// Parquet file reader.
pub struct ParquetReader {
    config: StorageConfig,
}

impl ParquetReader {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn table_path(&self, table: TableType, tournament: &str) -> PathBuf {
        self.config
            .parquet_dir()
            .join(tournament)
            .join(table.filename())
    }

    pub fn exists(&self, table: TableType, tournament: &str) -> bool {
        self.table_path(table, tournament).exists()
    }

    /// Read all record batches from a table. A missing table reads as empty.
    pub fn read_batches(
        &self,
        table: TableType,
        tournament: &str,
    ) -> Result<Vec<RecordBatch>, StorageError> {
        let path = self.table_path(table, tournament);

        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let batches = reader.collect::<Result<Vec<_>, _>>()?;

        debug!("Read {} batches from {:?}", batches.len(), path);
        Ok(batches)
    }

    pub fn count(&self, table: TableType, tournament: &str) -> Result<usize, StorageError> {
        let batches = self.read_batches(table, tournament)?;
        Ok(batches.iter().map(|b| b.num_rows()).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shot::fixtures::shot;
    use crate::models::{ModelKey, ModelRow, ShotType};
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> StorageConfig {
        StorageConfig::new(temp_dir.path().to_path_buf())
    }

    #[test]
    fn test_table_type_filename() {
        assert_eq!(TableType::Shots.filename(), "shots.parquet");
        assert_eq!(TableType::ModelRows.filename(), "model_rows.parquet");
    }

    #[test]
    fn test_schemas() {
        let shots = schemas::shots_schema();
        assert_eq!(shots.fields().len(), 28);
        assert!(shots.field_with_name("shot_type").is_ok());
        assert!(shots.field_with_name("distance_left_1ft_bin").is_ok());

        let rows = schemas::model_rows_schema();
        assert_eq!(rows.fields().len(), 11);
        assert!(rows.field_with_name("expected_strokes").is_ok());
    }

    #[test]
    fn test_write_and_read_shots() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let writer = ParquetWriter::new(config.clone());
        let reader = ParquetReader::new(config);

        let mut first = shot("1001", 1, 14400, 5400, 2);
        first.start_distance_bin = Some("(390 to 400] yds".to_string());
        let shots = vec![first, shot("1001", 2, 5400, 240, 1), shot("1002", 1, 14400, 0, 0)];

        writer.write_shots("sample-open", &shots).unwrap();

        assert!(reader.exists(TableType::Shots, "sample-open"));
        assert_eq!(reader.count(TableType::Shots, "sample-open").unwrap(), 3);
        let batches = reader.read_batches(TableType::Shots, "sample-open").unwrap();
        assert_eq!(batches[0].num_columns(), 28);
    }

    #[test]
    fn test_write_model_rows() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut model = GroupedShotModel::empty(&ModelKey::new("sample-open", "Year", "2020"));
        let row = ModelRow {
            surface: "Green".to_string(),
            distance_bin: "(12 to 48]".to_string(),
            distance: 30.0,
            shots_remaining: 1.2,
            expected_strokes: 1.2,
            sample_count: 14,
        };
        model
            .shot_types
            .insert(ShotType::ShtPutt, vec![row.clone(), row]);

        let written = ParquetWriter::new(config.clone())
            .write_model_rows("sample-open", &[model])
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            ParquetReader::new(config)
                .count(TableType::ModelRows, "sample-open")
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let reader = ParquetReader::new(test_config(&temp_dir));

        assert!(!reader.exists(TableType::Shots, "nonexistent"));
        assert!(reader
            .read_batches(TableType::Shots, "nonexistent")
            .unwrap()
            .is_empty());
    }
}
