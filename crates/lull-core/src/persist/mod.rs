//! Persisted mix state
//!
//! Volumes (master and per channel) are saved through a [`StateStore`] and
//! merged over the catalog defaults on startup.

mod state;
mod store;

pub use state::{MixLevels, PersistedChannel, PersistedState};
pub use store::{MemoryStateStore, StateStore, YamlStateStore};
