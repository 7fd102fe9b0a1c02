//! Where the persisted mix lives

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;

use super::state::PersistedState;
use crate::config::{read_yaml, save_config};

/// Key-value collaborator holding the persisted mix
pub trait StateStore: Send + Sync {
    /// The stored record, or None if nothing was saved yet
    fn load(&self) -> Result<Option<PersistedState>>;

    fn save(&self, state: &PersistedState) -> Result<()>;
}

/// Persists the mix as a YAML file
pub struct YamlStateStore {
    path: PathBuf,
}

impl YamlStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for YamlStateStore {
    fn load(&self) -> Result<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        read_yaml(&self.path).map(Some)
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        save_config(state, &self.path)
    }
}

/// Keeps the mix in memory for the session only
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<PersistedState>>,
    saves: Mutex<usize>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            saves: Mutex::new(0),
        }
    }

    /// Last saved (or seeded) record
    pub fn current(&self) -> Option<PersistedState> {
        self.state.lock().unwrap().clone()
    }

    /// How many times `save` was called
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<PersistedState>> {
        Ok(self.current())
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        *self.state.lock().unwrap() = Some(state.clone());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SoundId;
    use crate::persist::MixLevels;

    #[test]
    fn test_yaml_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = YamlStateStore::new(dir.path().join("state.yaml"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_yaml_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = YamlStateStore::new(dir.path().join("lull").join("state.yaml"));

        let mut levels = MixLevels::default();
        levels.master_volume = 65.0;
        levels.set_channel(SoundId::Waves, 12.0);
        store.save(&PersistedState::from_levels(&levels)).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.merge(), levels);
    }

    #[test]
    fn test_yaml_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.yaml");
        std::fs::write(&path, "channels: [unclosed").unwrap();
        assert!(YamlStateStore::new(&path).load().is_err());
    }

    #[test]
    fn test_yaml_reads_hand_written_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.yaml");
        std::fs::write(
            &path,
            "master_volume: 40\nchannels:\n  - id: fire\n    volume: 75\n  - id: lava\n    volume: 3\n",
        )
        .unwrap();

        let levels = YamlStateStore::new(&path).load().unwrap().unwrap().merge();
        assert_eq!(levels.master_volume, 40.0);
        assert_eq!(levels.channel(SoundId::Fire), 75.0);
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemoryStateStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&PersistedState::default()).unwrap();
        store.save(&PersistedState::default()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.current(), Some(PersistedState::default()));
    }
}
