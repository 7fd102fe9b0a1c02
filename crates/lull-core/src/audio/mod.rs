//! Output devices
//!
//! The engine talks to audio output through the [`OutputDevice`] trait:
//!
//! - [`CpalDevice`]: hardware output. A CPAL audio thread owns the graph
//!   [`Renderer`](crate::graph::Renderer) and pulls blocks from it.
//! - [`OfflineDevice`]: renders on demand. Used for deterministic tests and
//!   as a silent fallback when no hardware output can be opened.
//!
//! The audio thread never locks: graph commands arrive through a lock-free
//! ringbuffer and gains are read from atomics.

mod config;
mod cpal_backend;
mod device;
mod error;
mod offline;
mod output;

pub use config::{AudioConfig, BufferSize, DeviceId, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
pub use cpal_backend::CpalDevice;
pub use device::{list_output_devices, DeviceInfo};
pub use error::{DeviceError, DeviceResult};
pub use offline::{drive_realtime, OfflineDevice};
pub use output::{DeviceState, OutputDevice};
