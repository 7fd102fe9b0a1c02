//! Configuration
//!
//! - Generic YAML loading/saving (missing or broken files fall back to defaults)
//! - Default paths under the per-user config dir
//! - [`MixerConfig`], the `config.yaml` schema
//!
//! ```ignore
//! use lull_core::config::{default_config_path, load_config, MixerConfig, CONFIG_FILENAME};
//!
//! let config: MixerConfig = load_config(&default_config_path(CONFIG_FILENAME));
//! ```

mod io;
mod mixer;
mod paths;

pub use io::{load_config, read_yaml, save_config};
pub use mixer::{MixerConfig, CONFIG_FILENAME, DEFAULT_SHARE_ORIGIN, STATE_FILENAME};
pub use paths::{default_config_dir, default_config_path, default_sounds_dir};
