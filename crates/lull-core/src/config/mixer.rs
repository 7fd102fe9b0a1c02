//! Mixer configuration file (`config.yaml`)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::{default_config_path, default_sounds_dir};
use crate::audio::AudioConfig;

/// File name of the mixer config inside the config dir
pub const CONFIG_FILENAME: &str = "config.yaml";

/// File name of the persisted mix inside the config dir
pub const STATE_FILENAME: &str = "state.yaml";

/// Origin prepended to share links when none is configured
pub const DEFAULT_SHARE_ORIGIN: &str = "https://lull.app";

/// Top-level configuration
///
/// Every field has a default, so a partial (or missing) file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Directory holding the ambience loop files
    pub sounds_dir: PathBuf,
    /// Where the mix (volumes) is persisted between sessions
    pub state_path: PathBuf,
    /// Origin of share links, `<origin>?rain50,fire30`
    pub share_origin: String,
    pub audio: AudioConfig,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sounds_dir: default_sounds_dir(),
            state_path: default_config_path(STATE_FILENAME),
            share_origin: DEFAULT_SHARE_ORIGIN.to_string(),
            audio: AudioConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config, save_config};

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "sounds_dir: /opt/sounds\naudio:\n  sample_rate: 44100\n").unwrap();

        let config: MixerConfig = load_config(&path);
        assert_eq!(config.sounds_dir, PathBuf::from("/opt/sounds"));
        assert_eq!(config.audio.sample_rate, Some(44100));
        assert_eq!(config.share_origin, DEFAULT_SHARE_ORIGIN);
        assert!(config.state_path.ends_with(STATE_FILENAME));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        let config = MixerConfig {
            share_origin: "http://localhost:8080".to_string(),
            audio: AudioConfig::default().with_buffer_frames(512),
            ..MixerConfig::default()
        };

        save_config(&config, &path).unwrap();
        assert_eq!(load_config::<MixerConfig>(&path), config);
    }
}
