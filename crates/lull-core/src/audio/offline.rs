//! Offline output device
//!
//! Renders the audio graph only when asked to. Tests drive it frame by frame
//! for a deterministic clock; the player drives it from a timer when no
//! hardware output is available, so the engine keeps its timing without
//! making any sound.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::error::{DeviceError, DeviceResult};
use super::output::{AtomicDeviceState, DeviceState, OutputDevice};
use crate::graph::{audio_graph, GraphSender, Renderer};
use crate::types::StereoBuffer;

/// A device whose clock only moves when [`OfflineDevice::render`] is called
pub struct OfflineDevice {
    sample_rate: u32,
    graph: GraphSender,
    renderer: Mutex<Renderer>,
    frames_rendered: AtomicU64,
    state: AtomicDeviceState,
    reject_resume: AtomicBool,
    /// While true, resume calls wait
    resume_held: tokio::sync::watch::Sender<bool>,
}

impl OfflineDevice {
    pub fn new(sample_rate: u32) -> Self {
        let (graph, renderer) = audio_graph();
        Self {
            sample_rate,
            graph,
            renderer: Mutex::new(renderer),
            frames_rendered: AtomicU64::new(0),
            state: AtomicDeviceState::new(DeviceState::Suspended),
            reject_resume: AtomicBool::new(false),
            resume_held: tokio::sync::watch::Sender::new(false),
        }
    }

    /// Render `frames` frames of output
    ///
    /// While suspended nothing is rendered: the result is silence and the
    /// clock does not move.
    pub fn render(&self, frames: usize) -> StereoBuffer {
        let mut out = StereoBuffer::silence(frames);
        if self.state.load() != DeviceState::Running {
            return out;
        }
        self.renderer.lock().unwrap().render(&mut out);
        self.frames_rendered.fetch_add(frames as u64, Ordering::AcqRel);
        out
    }

    /// Render and discard `secs` seconds of output
    pub fn advance(&self, secs: f64) {
        let frames = (secs * self.sample_rate as f64).round() as usize;
        let _ = self.render(frames);
    }

    /// Number of voices the renderer currently loops
    ///
    /// Pending graph commands are applied first.
    pub fn active_voices(&self) -> usize {
        let mut renderer = self.renderer.lock().unwrap();
        renderer.process_commands();
        renderer.active_voices()
    }

    /// Make the next resume calls fail, as a device without output would
    #[cfg(test)]
    pub(crate) fn set_reject_resume(&self, reject: bool) {
        self.reject_resume.store(reject, Ordering::SeqCst);
    }

    /// Keep resume calls waiting until released, as a slow sound card would
    #[cfg(test)]
    pub(crate) fn hold_resume(&self, held: bool) {
        self.resume_held.send_replace(held);
    }
}

#[async_trait]
impl OutputDevice for OfflineDevice {
    fn name(&self) -> &str {
        "offline"
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn state(&self) -> DeviceState {
        self.state.load()
    }

    fn current_time(&self) -> f64 {
        self.frames_rendered.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn graph(&self) -> &GraphSender {
        &self.graph
    }

    async fn resume(&self) -> DeviceResult<()> {
        let mut held = self.resume_held.subscribe();
        if held.wait_for(|held| !*held).await.is_err() {
            return Err(DeviceError::Closed);
        }
        if self.reject_resume.load(Ordering::SeqCst) {
            return Err(DeviceError::StreamPlayError("resume rejected".to_string()));
        }
        if self.state.load() == DeviceState::Closed {
            return Err(DeviceError::Closed);
        }
        self.state.store(DeviceState::Running);
        Ok(())
    }

    async fn suspend(&self) -> DeviceResult<()> {
        if self.state.load() == DeviceState::Closed {
            return Err(DeviceError::Closed);
        }
        self.state.store(DeviceState::Suspended);
        Ok(())
    }
}

/// Render `device` in real time from a tokio timer, discarding the output
///
/// Keeps the clock of an offline device moving like a sound card would. Runs
/// until the returned task is aborted.
pub fn drive_realtime(device: Arc<OfflineDevice>, block: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let frames = ((block.as_secs_f64() * device.sample_rate() as f64).round() as usize).max(1);
        let mut ticker = tokio::time::interval(block);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Burst);
        log::info!(
            "OfflineDevice: driving {} frames every {:?}",
            frames,
            block
        );
        loop {
            ticker.tick().await;
            let _ = device.render(frames);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AudioBuffer;
    use crate::catalog::SoundId;
    use crate::types::StereoSample;

    #[tokio::test]
    async fn test_clock_moves_only_while_running() {
        let device = OfflineDevice::new(1000);
        assert_eq!(device.state(), DeviceState::Suspended);

        device.advance(1.0);
        assert_eq!(device.current_time(), 0.0);

        device.resume().await.unwrap();
        device.advance(1.5);
        assert!((device.current_time() - 1.5).abs() < 1e-9);

        device.suspend().await.unwrap();
        device.advance(3.0);
        assert!((device.current_time() - 1.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_renders_started_voice() {
        let device = OfflineDevice::new(100);
        device.resume().await.unwrap();

        let frames = StereoBuffer::from_vec(vec![StereoSample::mono(0.25); 100]);
        let buffer = Arc::new(AudioBuffer::new(SoundId::Waves, 100, frames).unwrap());
        let gain = device.graph().create_channel_gain(SoundId::Waves, 1.0);
        let _unit = device.graph().start_voice(buffer, gain, 0).unwrap();

        let out = device.render(10);
        assert!((out[5].left - 0.25).abs() < 1e-6);
        assert_eq!(device.active_voices(), 1);
    }

    #[tokio::test]
    async fn test_rejected_resume_stays_suspended() {
        let device = OfflineDevice::new(100);
        device.set_reject_resume(true);
        assert!(device.resume().await.is_err());
        assert_eq!(device.state(), DeviceState::Suspended);
    }

    #[tokio::test]
    async fn test_held_resume_waits_for_release() {
        let device = Arc::new(OfflineDevice::new(100));
        device.hold_resume(true);

        let resuming = {
            let device = Arc::clone(&device);
            tokio::spawn(async move { device.resume().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(device.state(), DeviceState::Suspended);

        device.hold_resume(false);
        resuming.await.unwrap().unwrap();
        assert_eq!(device.state(), DeviceState::Running);
    }

    #[tokio::test]
    async fn test_realtime_driver_advances_clock() {
        let device = Arc::new(OfflineDevice::new(1000));
        device.resume().await.unwrap();
        let driver = drive_realtime(Arc::clone(&device), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(105)).await;
        driver.abort();

        assert!(device.current_time() > 0.05);
    }
}
