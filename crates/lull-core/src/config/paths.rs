//! Default file locations

use std::path::PathBuf;

const APP_DIR: &str = "lull";

/// Per-user config directory, e.g. `~/.config/lull`
///
/// Falls back to `./lull` on platforms without a config dir.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Path of a file inside [`default_config_dir`]
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}

/// Where the ambience loops are looked up by default, e.g. `~/.local/share/lull/sounds`
pub fn default_sounds_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("sounds")
}
