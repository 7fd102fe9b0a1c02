//! Persisted mix record and the rules for merging it with defaults

use serde::{Deserialize, Serialize};

use crate::catalog::{SoundId, DEFAULT_CHANNEL_VOLUME, DEFAULT_MASTER_VOLUME, NUM_SOUNDS};
use crate::mix::Mix;
use crate::types::clamp_volume;

/// One channel in the persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedChannel {
    /// Sound id as text, so records naming sounds this build lacks still load
    pub id: String,
    pub volume: f32,
}

/// What survives between sessions: volumes only, never playing flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub master_volume: Option<f32>,
    pub channels: Vec<PersistedChannel>,
}

impl PersistedState {
    /// Snapshot `levels` in catalog order
    pub fn from_levels(levels: &MixLevels) -> Self {
        Self {
            master_volume: Some(levels.master_volume),
            channels: SoundId::ALL
                .iter()
                .map(|id| PersistedChannel {
                    id: id.as_str().to_string(),
                    volume: levels.channel(*id),
                })
                .collect(),
        }
    }

    /// Lay this record over the defaults
    ///
    /// Known ids take the persisted volume, unknown ids are ignored and ids
    /// missing from the record keep the default. Everything is clamped.
    pub fn merge(&self) -> MixLevels {
        let mut levels = MixLevels::default();
        if let Some(master) = self.master_volume {
            levels.master_volume = clamp_volume(master);
        }
        for channel in &self.channels {
            match channel.id.parse::<SoundId>() {
                Ok(id) => levels.set_channel(id, channel.volume),
                Err(_) => log::debug!("PersistedState: ignoring unknown id '{}'", channel.id),
            }
        }
        levels
    }
}

/// Master and per-channel volumes, always clamped to `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixLevels {
    pub master_volume: f32,
    channels: [f32; NUM_SOUNDS],
}

impl Default for MixLevels {
    fn default() -> Self {
        Self {
            master_volume: DEFAULT_MASTER_VOLUME,
            channels: [DEFAULT_CHANNEL_VOLUME; NUM_SOUNDS],
        }
    }
}

impl MixLevels {
    pub fn channel(&self, id: SoundId) -> f32 {
        self.channels[id.index()]
    }

    pub fn set_channel(&mut self, id: SoundId, volume: f32) {
        self.channels[id.index()] = clamp_volume(volume);
    }

    /// Override the channels a share link lists; the rest stay as they are
    pub fn apply_mix(&mut self, mix: &Mix) {
        for &(id, volume) in mix.entries() {
            self.set_channel(id, volume as f32);
        }
    }
}
