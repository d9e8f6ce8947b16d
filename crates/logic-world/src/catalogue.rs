//! Ordered collection of validated levels.
//!
//! Levels are keyed by id and shared as `Arc<Level>` so a running session
//! and the caller can hold the same level without copying the grid.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::error::WorldError;
use crate::level::{Level, LevelRecord};

/// On-disk shape of a level pack: `levels: [ ... ]`.
#[derive(Debug, Deserialize)]
struct LevelPack {
    levels: Vec<LevelRecord>,
}

/// Validated levels ordered by id.
#[derive(Debug, Clone, Default)]
pub struct LevelCatalogue {
    levels: BTreeMap<u32, Arc<Level>>,
}

impl LevelCatalogue {
    /// Validate every record. Duplicate ids are rejected.
    pub fn from_records(records: Vec<LevelRecord>) -> Result<Self, WorldError> {
        let mut levels = BTreeMap::new();
        for record in records {
            let level = Level::from_record(record)?;
            let id = level.id();
            if levels.insert(id, Arc::new(level)).is_some() {
                return Err(WorldError::DuplicateLevel(id));
            }
        }
        Ok(Self { levels })
    }

    /// Parse and validate a YAML level pack.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, WorldError> {
        let pack: LevelPack = serde_yml::from_str(yaml)?;
        Self::from_records(pack.levels)
    }

    /// Load a YAML level pack from disk.
    pub fn from_file(path: &Path) -> Result<Self, WorldError> {
        let contents = std::fs::read_to_string(path)?;
        let catalogue = Self::from_yaml_str(&contents)?;
        info!(
            path = %path.display(),
            levels = catalogue.len(),
            "Level pack loaded"
        );
        Ok(catalogue)
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the catalogue holds no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Look up a level by id.
    pub fn get(&self, id: u32) -> Option<Arc<Level>> {
        self.levels.get(&id).cloned()
    }

    /// Look up a level by id, failing with [`WorldError::LevelNotFound`].
    pub fn require(&self, id: u32) -> Result<Arc<Level>, WorldError> {
        self.get(id).ok_or(WorldError::LevelNotFound(id))
    }

    /// The lowest-numbered level.
    pub fn first(&self) -> Option<Arc<Level>> {
        self.levels.values().next().cloned()
    }

    /// The level following `id` in campaign order.
    pub fn next_after(&self, id: u32) -> Option<Arc<Level>> {
        self.levels
            .range(id.saturating_add(1)..)
            .next()
            .map(|(_, level)| Arc::clone(level))
            .filter(|level| level.id() > id)
    }

    /// Level ids in order.
    pub fn ids(&self) -> Vec<u32> {
        self.levels.keys().copied().collect()
    }

    /// Iterate levels in order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Level>> {
        self.levels.values()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PACK: &str = r"
levels:
  - id: 3
    rows: 1
    cols: 3
    grid: GGG
    start: { row: 0, col: 0, facing: Right }
    markers: [[0, 2]]
    slot_capacities: [3, 0, 0, 0, 0]
    reference_solution:
      F1: F F
  - id: 1
    rows: 3
    cols: 1
    grid: |
      G
      B
      G
    start: { row: 0, col: 0, facing: Down }
    markers: [[2, 0]]
    slot_capacities: [2, 0, 0, 0, 0]
    instructions:
      en: Go down.
      fr: Descendez.
";

    #[test]
    fn pack_is_ordered_by_id() {
        let catalogue = LevelCatalogue::from_yaml_str(PACK).unwrap();
        assert_eq!(catalogue.ids(), vec![1, 3]);
        assert_eq!(catalogue.first().map(|l| l.id()), Some(1));
        assert_eq!(catalogue.next_after(1).map(|l| l.id()), Some(3));
        assert!(catalogue.next_after(3).is_none());
        assert_eq!(catalogue.get(1).unwrap().instructions().fr, "Descendez.");
    }

    #[test]
    fn missing_level_is_an_error() {
        let catalogue = LevelCatalogue::from_yaml_str(PACK).unwrap();
        assert!(matches!(
            catalogue.require(2),
            Err(WorldError::LevelNotFound(2))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dup = PACK.replace("id: 3", "id: 1");
        assert!(matches!(
            LevelCatalogue::from_yaml_str(&dup),
            Err(WorldError::DuplicateLevel(1))
        ));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            LevelCatalogue::from_yaml_str("levels: [ {id: "),
            Err(WorldError::Yaml { .. })
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pack.yaml");
        std::fs::write(&path, PACK).unwrap();
        let catalogue = LevelCatalogue::from_file(&path).unwrap();
        assert_eq!(catalogue.len(), 2);

        let missing = LevelCatalogue::from_file(&dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(WorldError::Io { .. })));
    }
}
