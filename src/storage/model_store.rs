//! Persistence of grouped models.

use std::collections::{BTreeMap, HashSet};

use tracing::info;

use super::jsonl::{Dataset, JsonlReader, JsonlWriter};
use super::{StorageConfig, StorageError};
use crate::models::{GroupedShotModel, ModelKey};

/// Where grouped models are kept between runs.
pub trait ModelStore {
    /// Keys of every model already stored for a tournament.
    fn persisted_keys(&self, tournament: &str) -> Result<HashSet<ModelKey>, StorageError>;

    /// Store models, replacing any with the same key. Returns how many were written.
    fn persist(&mut self, models: &[GroupedShotModel]) -> Result<usize, StorageError>;

    fn load(&self, key: &ModelKey) -> Result<Option<GroupedShotModel>, StorageError>;

    /// Every stored model of a tournament.
    fn load_all(&self, tournament: &str) -> Result<Vec<GroupedShotModel>, StorageError>;
}

/// Models in `models/<tournament>/models.jsonl`.
#[derive(Debug, Clone)]
pub struct JsonlModelStore {
    config: StorageConfig,
}

impl JsonlModelStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn read(&self, tournament: &str) -> Result<Vec<GroupedShotModel>, StorageError> {
        JsonlReader::for_dataset(&self.config, Dataset::Models, tournament).read_all()
    }
}

impl ModelStore for JsonlModelStore {
    fn persisted_keys(&self, tournament: &str) -> Result<HashSet<ModelKey>, StorageError> {
        Ok(self.read(tournament)?.iter().map(|m| m.key()).collect())
    }

    fn persist(&mut self, models: &[GroupedShotModel]) -> Result<usize, StorageError> {
        let mut by_tournament: BTreeMap<&str, Vec<&GroupedShotModel>> = BTreeMap::new();
        for model in models {
            by_tournament
                .entry(model.tournament_name.as_str())
                .or_default()
                .push(model);
        }

        let mut written = 0;
        for (tournament, incoming) in by_tournament {
            let mut stored = self.read(tournament)?;
            for model in incoming {
                match stored.iter_mut().find(|m| m.id == model.id) {
                    Some(existing) => *existing = model.clone(),
                    None => stored.push(model.clone()),
                }
                written += 1;
            }
            JsonlWriter::for_dataset(&self.config, Dataset::Models, tournament)
                .write_all(&stored)?;
            info!("{}: {} models stored", tournament, stored.len());
        }
        Ok(written)
    }

    fn load(&self, key: &ModelKey) -> Result<Option<GroupedShotModel>, StorageError> {
        let id = key.id();
        Ok(self
            .read(&key.tournament_name)?
            .into_iter()
            .find(|m| m.id == id))
    }

    fn load_all(&self, tournament: &str) -> Result<Vec<GroupedShotModel>, StorageError> {
        self.read(tournament)
    }
}

/// Store kept in memory, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModelStore {
    models: BTreeMap<ModelKey, GroupedShotModel>,
}

impl InMemoryModelStore {
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelStore for InMemoryModelStore {
    fn persisted_keys(&self, tournament: &str) -> Result<HashSet<ModelKey>, StorageError> {
        Ok(self
            .models
            .keys()
            .filter(|k| k.tournament_name == tournament)
            .cloned()
            .collect())
    }

    fn persist(&mut self, models: &[GroupedShotModel]) -> Result<usize, StorageError> {
        for model in models {
            self.models.insert(model.key(), model.clone());
        }
        Ok(models.len())
    }

    fn load(&self, key: &ModelKey) -> Result<Option<GroupedShotModel>, StorageError> {
        Ok(self.models.get(key).cloned())
    }

    fn load_all(&self, tournament: &str) -> Result<Vec<GroupedShotModel>, StorageError> {
        Ok(self
            .models
            .values()
            .filter(|m| m.tournament_name == tournament)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelRow, ShotType};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn model(tournament: &str, detail: &str, expected: f64) -> GroupedShotModel {
        let mut m = GroupedShotModel::empty(&ModelKey::new(tournament, "Round", detail));
        m.shot_types.insert(
            ShotType::ShtPutt,
            vec![ModelRow {
                surface: "Green".to_string(),
                distance_bin: "(12 to 48]".to_string(),
                distance: 30.0,
                shots_remaining: expected,
                expected_strokes: expected,
                sample_count: 8,
            }],
        );
        m
    }

    #[test]
    fn test_jsonl_store_upserts_by_key() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonlModelStore::new(StorageConfig::new(temp_dir.path().to_path_buf()));

        assert!(store.persisted_keys("sample-open").unwrap().is_empty());

        store
            .persist(&[model("sample-open", "1", 1.2), model("sample-open", "2", 1.3)])
            .unwrap();
        store.persist(&[model("sample-open", "1", 1.1)]).unwrap();

        let keys = store.persisted_keys("sample-open").unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&ModelKey::new("sample-open", "Round", "2")));

        let loaded = store
            .load(&ModelKey::new("sample-open", "Round", "1"))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, model("sample-open", "1", 1.1));
        assert!(store
            .load(&ModelKey::new("sample-open", "Round", "9"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_jsonl_store_separates_tournaments() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        let mut store = JsonlModelStore::new(config.clone());

        let written = store
            .persist(&[model("sample-open", "1", 1.2), model("masters", "1", 1.4)])
            .unwrap();
        assert_eq!(written, 2);
        assert!(config.models_path("sample-open").exists());
        assert!(config.models_path("masters").exists());
        assert_eq!(store.persisted_keys("masters").unwrap().len(), 1);
        assert_eq!(store.load_all("sample-open").unwrap().len(), 1);
    }

    #[test]
    fn test_in_memory_store() {
        let mut store = InMemoryModelStore::default();
        assert!(store.is_empty());
        store
            .persist(&[model("sample-open", "1", 1.2), model("masters", "1", 1.4)])
            .unwrap();
        store.persist(&[model("sample-open", "1", 1.0)]).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.persisted_keys("sample-open").unwrap().len(), 1);
        assert_eq!(store.load_all("masters").unwrap().len(), 1);
        let loaded = store
            .load(&ModelKey::new("sample-open", "Round", "1"))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.shot_types[&ShotType::ShtPutt][0].expected_strokes, 1.0);
    }
}
