//! Mixer engine
//!
//! - [`ChannelEngine`]: one playback state machine and gain per sound
//! - [`MasterBus`]: master gain and the global play/pause gate
//! - [`Engine`]: the facade front-ends talk to
//! - [`EngineEvent`]: playback changes published on a crossbeam channel

mod channel;
mod error;
mod events;
mod facade;
mod master;

pub use channel::{ChannelEngine, PlayReport, StartOutcome, StartTicket};
pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, EventBus};
pub use facade::{ChannelSnapshot, Engine, EngineSetup, EngineSnapshot};
pub use master::MasterBus;
