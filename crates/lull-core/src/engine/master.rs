//! Master bus: global output level and the play/pause gate

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use super::channel::{ChannelEngine, PlayReport};
use super::error::EngineResult;
use super::events::{EngineEvent, EventBus};
use crate::audio::OutputDevice;
use crate::catalog::DEFAULT_MASTER_VOLUME;
use crate::graph::GainStage;
use crate::types::{clamp_volume, volume_to_gain};

/// The single gain stage every channel feeds into, plus the master gate
pub struct MasterBus {
    device: Arc<dyn OutputDevice>,
    channels: Arc<ChannelEngine>,
    events: EventBus,
    gain: Arc<GainStage>,
    /// User-facing volume as f32 bits
    volume: AtomicU32,
    playing: AtomicBool,
    /// Playing and the device has resumed
    live: AtomicBool,
}

impl MasterBus {
    pub fn new(device: Arc<dyn OutputDevice>, channels: Arc<ChannelEngine>, events: EventBus) -> Self {
        let gain = device.graph().master_gain();
        gain.set(volume_to_gain(DEFAULT_MASTER_VOLUME));
        Self {
            device,
            channels,
            events,
            gain,
            volume: AtomicU32::new(DEFAULT_MASTER_VOLUME.to_bits()),
            playing: AtomicBool::new(false),
            live: AtomicBool::new(false),
        }
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Whether channels may be started right now
    ///
    /// False while a `play` is still waiting on the device; that `play`
    /// starts every audible channel once the device is up.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Set the master volume (clamped to `0..=100`), returning the stored value
    ///
    /// Scales the mix as a whole; channel levels are untouched.
    pub fn set_master_volume(&self, volume: f32) -> f32 {
        let volume = clamp_volume(volume);
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
        self.gain.set(volume_to_gain(volume));
        volume
    }

    /// Open the gate: resume the device, then start every audible channel
    ///
    /// Channel starts run concurrently and all of them settle before this
    /// returns; individual failures land in the report. If the device cannot
    /// resume the gate closes again and the error is returned.
    pub async fn play(&self) -> EngineResult<PlayReport> {
        self.set_playing(true);

        if let Err(e) = self.device.resume().await {
            log::error!("MasterBus: failed to resume '{}': {}", self.device.name(), e);
            self.set_playing(false);
            self.live.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        self.live.store(true, Ordering::SeqCst);
        if !self.is_playing() {
            self.live.store(false, Ordering::SeqCst);
            log::debug!("MasterBus: paused while the device was resuming");
            return Ok(PlayReport::default());
        }

        let report = self.channels.start_all_with_positive_volume().await;
        if !self.is_live() {
            // A pause landed between the gate check and the start requests
            self.channels.pause_all();
        }
        log::info!(
            "MasterBus: playing, {} started, {} unchanged, {} failed",
            report.started.len(),
            report.unchanged.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Close the gate: stop every channel, keeping positions
    pub fn pause(&self) {
        self.set_playing(false);
        self.live.store(false, Ordering::SeqCst);
        let stopped = self.channels.pause_all();
        log::info!("MasterBus: paused ({} channels stopped)", stopped.len());
    }

    fn set_playing(&self, playing: bool) {
        if self.playing.swap(playing, Ordering::AcqRel) != playing {
            self.events.publish(EngineEvent::MasterChanged { playing });
        }
    }
}
