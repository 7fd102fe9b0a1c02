//! The output device seen by the engine

use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;

use super::error::DeviceResult;
use crate::graph::GraphSender;

/// Run state of an output device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Not pulling audio; the clock is frozen
    Suspended,
    /// Pulling audio; the clock advances with every rendered frame
    Running,
    /// Shut down for good
    Closed,
}

/// Lock-free cell for a [`DeviceState`], readable from any thread
#[derive(Debug)]
pub(crate) struct AtomicDeviceState(AtomicU8);

impl AtomicDeviceState {
    pub(crate) fn new(state: DeviceState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> DeviceState {
        match self.0.load(Ordering::Acquire) {
            0 => DeviceState::Suspended,
            1 => DeviceState::Running,
            _ => DeviceState::Closed,
        }
    }

    pub(crate) fn store(&self, state: DeviceState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// An audio output the engine can drive
///
/// Devices start suspended. The engine awaits [`OutputDevice::resume`] before
/// starting any channel, and reads [`OutputDevice::current_time`] to keep
/// loop offsets across pause and resume.
#[async_trait]
pub trait OutputDevice: Send + Sync {
    /// Name for logs and status output
    fn name(&self) -> &str;

    /// Rate the renderer runs at (decoded buffers are resampled to it)
    fn sample_rate(&self) -> u32;

    fn state(&self) -> DeviceState;

    /// Device clock in seconds (frames rendered / sample rate)
    fn current_time(&self) -> f64;

    /// Control side of the audio graph this device renders
    fn graph(&self) -> &GraphSender;

    /// Start pulling audio
    async fn resume(&self) -> DeviceResult<()>;

    /// Stop pulling audio (voices keep their position)
    async fn suspend(&self) -> DeviceResult<()>;
}
