//! Player configuration
//!
//! The mixer config is YAML, by default at `<config dir>/lull/config.yaml`.
//! On first run the defaults are written there so they can be edited.

use std::path::{Path, PathBuf};

use lull_core::config::{default_config_path, load_config, save_config, MixerConfig, CONFIG_FILENAME};

/// Load the config from `path`, or from the default location
///
/// Returns the config and the path it belongs to.
pub fn load(path: Option<&Path>) -> (MixerConfig, PathBuf) {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_config_path(CONFIG_FILENAME));

    let config: MixerConfig = load_config(&path);

    if !path.exists() {
        match save_config(&config, &path) {
            Ok(()) => log::info!("Wrote default config to {:?}", path),
            Err(e) => log::warn!("Could not write default config: {:#}", e),
        }
    }

    (config, path)
}
