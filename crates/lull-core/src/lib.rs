//! Lull Core - ambient sound mixer engine
//!
//! Infinitely looping ambience channels (rain, wind, fire, ...) with their own
//! volumes, summed into one master output. Pausing keeps every channel's loop
//! position, and the active mix can be shared as a compact link.
//!
//! ```text
//!  catalog ──► asset (cache + decode) ──► engine::channel ──► graph ──► audio
//!                                          engine::master ──────┘
//!  mix, persist ◄── engine::facade (Engine)
//! ```

pub mod asset;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod graph;
pub mod mix;
pub mod persist;
pub mod types;

pub use catalog::{SoundDescriptor, SoundId, CATALOG};
pub use engine::{Engine, EngineEvent, EngineSetup, EngineSnapshot};
pub use mix::Mix;
pub use types::*;
