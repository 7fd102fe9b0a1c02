//! Per-sound playback state machines
//!
//! Every catalog sound owns one [`Channel`] record from engine init onwards.
//! A channel is either stopped at a loop offset or playing through a live
//! playback unit:
//!
//! ```text
//!            start (buffer ready, ticket still valid)
//!   Stopped ─────────────────────────────────────────► Playing
//!   {offset} ◄───────────────────────────────────────  {unit, epoch_start}
//!                               stop
//! ```
//!
//! Starting may wait on the asset cache. The start intent is recorded as a
//! ticket before waiting; `stop` clears it, so a load that completes after
//! a stop does not start audio.
//!
//! Position bookkeeping uses the device clock: `epoch_start` is the device
//! time at which loop offset 0 began, so on stop the offset is
//! `(now - epoch_start) mod duration`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;

use super::error::{EngineError, EngineResult};
use super::events::{EngineEvent, EventBus};
use crate::asset::AssetCache;
use crate::audio::OutputDevice;
use crate::catalog::{SoundId, DEFAULT_CHANNEL_VOLUME, NUM_SOUNDS};
use crate::graph::{GainStage, PlaybackUnit};
use crate::types::{clamp_volume, volume_to_gain};

enum Playback {
    Stopped {
        /// Loop-relative position (seconds) reached at the last stop
        offset: f64,
    },
    Playing {
        unit: PlaybackUnit,
        /// Device time at which loop offset 0 began
        epoch_start: f64,
        /// Loop length in seconds
        duration: f64,
    },
}

struct Channel {
    /// User-facing volume, 0..=100
    gain_level: f32,
    playback: Playback,
    /// Created on the first start, reused afterwards
    gain: Option<Arc<GainStage>>,
    /// Start intent waiting for its buffer
    pending_start: Option<u64>,
}

impl Channel {
    fn new() -> Self {
        Self {
            gain_level: DEFAULT_CHANNEL_VOLUME,
            playback: Playback::Stopped { offset: 0.0 },
            gain: None,
            pending_start: None,
        }
    }

    fn is_playing(&self) -> bool {
        matches!(self.playback, Playback::Playing { .. })
    }
}

/// Proof that a start was requested, checked again once the buffer is ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTicket {
    id: SoundId,
    serial: u64,
}

/// What a start request ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new playback unit is looping
    Started,
    /// The channel was already playing; nothing changed
    AlreadyPlaying,
    /// Stopped while the buffer was loading; nothing was started
    Abandoned,
}

/// Result of starting several channels at once
#[derive(Debug, Default)]
pub struct PlayReport {
    pub started: Vec<SoundId>,
    /// Already playing or cancelled while loading
    pub unchanged: Vec<SoundId>,
    pub failed: Vec<(SoundId, EngineError)>,
}

impl PlayReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the playback state and gain of every channel
pub struct ChannelEngine {
    device: Arc<dyn OutputDevice>,
    cache: AssetCache,
    events: EventBus,
    channels: [Mutex<Channel>; NUM_SOUNDS],
    next_ticket: AtomicU64,
}

impl ChannelEngine {
    pub fn new(device: Arc<dyn OutputDevice>, cache: AssetCache, events: EventBus) -> Self {
        Self {
            device,
            cache,
            events,
            channels: std::array::from_fn(|_| Mutex::new(Channel::new())),
            next_ticket: AtomicU64::new(1),
        }
    }

    fn channel(&self, id: SoundId) -> MutexGuard<'_, Channel> {
        self.channels[id.index()].lock().unwrap()
    }

    /// Current volume (0..=100)
    pub fn level(&self, id: SoundId) -> f32 {
        self.channel(id).gain_level
    }

    pub fn is_playing(&self, id: SoundId) -> bool {
        self.channel(id).is_playing()
    }

    /// Whether a start is waiting for its buffer
    pub fn is_pending(&self, id: SoundId) -> bool {
        self.channel(id).pending_start.is_some()
    }

    /// Loop position in seconds: live while playing, frozen while stopped
    pub fn position(&self, id: SoundId) -> f64 {
        match self.channel(id).playback {
            Playback::Stopped { offset } => offset,
            Playback::Playing {
                epoch_start,
                duration,
                ..
            } => (self.device.current_time() - epoch_start).rem_euclid(duration),
        }
    }

    /// Set the volume, clamped to `0..=100`
    ///
    /// Applies live when the channel has a gain stage. Never starts or stops
    /// playback. Returns the stored value.
    pub fn set_volume(&self, id: SoundId, volume: f32) -> f32 {
        let level = clamp_volume(volume);
        let mut channel = self.channel(id);
        channel.gain_level = level;
        if let Some(gain) = &channel.gain {
            gain.set(volume_to_gain(level));
        }
        level
    }

    /// Record a start intent
    ///
    /// Returns None when the channel is already playing. A start that is
    /// already pending hands out the same ticket, so concurrent starts of one
    /// channel resolve to a single playback unit.
    pub fn request_start(&self, id: SoundId) -> Option<StartTicket> {
        let mut channel = self.channel(id);
        if channel.is_playing() {
            return None;
        }
        let serial = *channel
            .pending_start
            .get_or_insert_with(|| self.next_ticket.fetch_add(1, Ordering::Relaxed));
        Some(StartTicket { id, serial })
    }

    /// Wait for the buffer, then start playback if the ticket is still valid
    pub async fn complete_start(&self, ticket: StartTicket) -> EngineResult<StartOutcome> {
        let id = ticket.id;

        let buffer = match self.cache.acquire(id).await {
            Ok(buffer) => buffer,
            Err(e) => {
                let mut channel = self.channel(id);
                if channel.pending_start == Some(ticket.serial) {
                    channel.pending_start = None;
                }
                drop(channel);
                return Err(self.report_failure(id, e.into()));
            }
        };

        let mut channel = self.channel(id);
        if channel.is_playing() {
            return Ok(StartOutcome::AlreadyPlaying);
        }
        if channel.pending_start != Some(ticket.serial) {
            log::debug!("ChannelEngine: start of '{}' cancelled while loading", id);
            return Ok(StartOutcome::Abandoned);
        }
        channel.pending_start = None;

        let graph = self.device.graph();
        let gain = volume_to_gain(channel.gain_level);
        let gain_stage = Arc::clone(
            channel
                .gain
                .get_or_insert_with(|| graph.create_channel_gain(id, gain)),
        );
        gain_stage.set(gain);

        let duration = buffer.duration_secs();
        let offset = match channel.playback {
            Playback::Stopped { offset } => offset.rem_euclid(duration),
            Playback::Playing { .. } => 0.0,
        };
        let start_frame = buffer.frame_at(offset);

        let unit = match graph.start_voice(buffer, gain_stage, start_frame) {
            Ok(unit) => unit,
            Err(e) => {
                drop(channel);
                return Err(self.report_failure(id, e.into()));
            }
        };

        channel.playback = Playback::Playing {
            unit,
            epoch_start: self.device.current_time() - offset,
            duration,
        };
        drop(channel);

        log::info!("ChannelEngine: '{}' playing from {:.3}s", id, offset);
        self.events.publish(EngineEvent::ChannelStarted { id });
        Ok(StartOutcome::Started)
    }

    /// Start one channel, waiting for its buffer if needed
    pub async fn start(&self, id: SoundId) -> EngineResult<StartOutcome> {
        match self.request_start(id) {
            Some(ticket) => self.complete_start(ticket).await,
            None => Ok(StartOutcome::AlreadyPlaying),
        }
    }

    /// Start several channels concurrently and wait for all of them
    ///
    /// Start intents are recorded before anything is awaited, so a pause
    /// issued while buffers load cancels every one of them.
    pub async fn start_many(self: &Arc<Self>, ids: &[SoundId]) -> PlayReport {
        let mut report = PlayReport::default();
        let mut tasks = JoinSet::new();

        for &id in ids {
            match self.request_start(id) {
                Some(ticket) => {
                    let engine = Arc::clone(self);
                    tasks.spawn(async move { (id, engine.complete_start(ticket).await) });
                }
                None => report.unchanged.push(id),
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Ok(StartOutcome::Started))) => report.started.push(id),
                Ok((id, Ok(_))) => report.unchanged.push(id),
                Ok((id, Err(e))) => report.failed.push((id, e)),
                Err(e) => log::error!("ChannelEngine: start task failed: {}", e),
            }
        }

        report.started.sort();
        report.unchanged.sort();
        report.failed.sort_by_key(|(id, _)| *id);
        report
    }

    /// Start every channel whose volume is above zero
    pub async fn start_all_with_positive_volume(self: &Arc<Self>) -> PlayReport {
        let audible: Vec<SoundId> = SoundId::ALL
            .into_iter()
            .filter(|id| self.level(*id) > 0.0)
            .collect();
        self.start_many(&audible).await
    }

    /// Stop a channel, keeping its loop position
    ///
    /// Also cancels a pending start. Returns whether a playback unit was
    /// stopped; stopping a stopped channel is a no-op. When the stop cannot
    /// reach the audio thread the channel stays `Playing` and the error is
    /// returned.
    pub fn stop(&self, id: SoundId) -> EngineResult<bool> {
        let mut channel = self.channel(id);
        channel.pending_start = None;

        let Playback::Playing {
            epoch_start,
            duration,
            ..
        } = channel.playback
        else {
            return Ok(false);
        };

        let offset = (self.device.current_time() - epoch_start).rem_euclid(duration);
        let previous = std::mem::replace(&mut channel.playback, Playback::Stopped { offset });
        if let Playback::Playing { unit, .. } = previous {
            if let Err(e) = self.device.graph().stop_voice(unit) {
                log::error!("ChannelEngine: '{}' could not be stopped: {}", id, e.error);
                channel.playback = Playback::Playing {
                    unit: e.unit,
                    epoch_start,
                    duration,
                };
                return Err(e.error.into());
            }
        }
        drop(channel);

        log::info!("ChannelEngine: '{}' stopped at {:.3}s", id, offset);
        self.events.publish(EngineEvent::ChannelStopped { id });
        Ok(true)
    }

    /// Stop every channel that is playing or about to
    ///
    /// Returns the channels that were actually playing.
    pub fn pause_all(&self) -> Vec<SoundId> {
        SoundId::ALL
            .into_iter()
            .filter(|id| match self.stop(*id) {
                Ok(stopped) => stopped,
                Err(e) => {
                    log::error!("ChannelEngine: failed to stop '{}': {}", id, e);
                    false
                }
            })
            .collect()
    }

    fn report_failure(&self, id: SoundId, error: EngineError) -> EngineError {
        log::warn!("ChannelEngine: '{}' failed to start: {}", id, error);
        self.events.publish(EngineEvent::ChannelFailed {
            id,
            error: error.clone(),
        });
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::TestSource;
    use crate::audio::OfflineDevice;

    const RATE: u32 = 1000;

    struct Fixture {
        device: Arc<OfflineDevice>,
        source: Arc<TestSource>,
        channels: Arc<ChannelEngine>,
        events: crossbeam::channel::Receiver<EngineEvent>,
    }

    /// Two-second loops on an offline device running at 1kHz
    async fn fixture() -> Fixture {
        let device = Arc::new(OfflineDevice::new(RATE));
        device.resume().await.unwrap();
        let source = Arc::new(TestSource::new(2 * RATE as usize, RATE));
        let cache = AssetCache::new(source.clone(), RATE);
        let bus = EventBus::default();
        let events = bus.subscribe();
        let channels = Arc::new(ChannelEngine::new(device.clone(), cache, bus));
        Fixture {
            device,
            source,
            channels,
            events,
        }
    }

    #[tokio::test]
    async fn test_start_twice_creates_one_unit() {
        let f = fixture().await;

        let (a, b) = tokio::join!(f.channels.start(SoundId::Rain), f.channels.start(SoundId::Rain));
        let mut outcomes = vec![a.unwrap(), b.unwrap()];
        outcomes.sort_by_key(|o| *o as u8);
        assert_eq!(outcomes, vec![StartOutcome::Started, StartOutcome::AlreadyPlaying]);

        assert_eq!(
            f.channels.start(SoundId::Rain).await.unwrap(),
            StartOutcome::AlreadyPlaying
        );
        assert_eq!(f.device.active_voices(), 1);
        assert_eq!(f.source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_twice_equals_stop_once() {
        let f = fixture().await;
        f.channels.start(SoundId::Wind).await.unwrap();
        f.device.advance(0.4);

        assert!(f.channels.stop(SoundId::Wind).unwrap());
        let position = f.channels.position(SoundId::Wind);
        f.device.advance(0.3);
        assert!(!f.channels.stop(SoundId::Wind).unwrap());

        assert_eq!(f.channels.position(SoundId::Wind), position);
        assert!(!f.channels.is_playing(SoundId::Wind));
        assert_eq!(f.device.active_voices(), 0);
    }

    #[tokio::test]
    async fn test_pause_resume_keeps_position() {
        let f = fixture().await;
        f.channels.start(SoundId::Fire).await.unwrap();

        f.device.advance(0.75);
        f.channels.stop(SoundId::Fire).unwrap();
        assert!((f.channels.position(SoundId::Fire) - 0.75).abs() < 1e-9);

        // Time passing while stopped does not move the loop
        f.device.advance(5.0);
        assert!((f.channels.position(SoundId::Fire) - 0.75).abs() < 1e-9);

        f.channels.start(SoundId::Fire).await.unwrap();
        assert!((f.channels.position(SoundId::Fire) - 0.75).abs() < 1e-9);

        // Wraps at the two-second loop length
        f.device.advance(1.5);
        assert!((f.channels.position(SoundId::Fire) - 0.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_stop_while_loading_abandons_start() {
        let f = fixture().await;
        f.source.hold();

        let ticket = f.channels.request_start(SoundId::Storm).unwrap();
        let channels = Arc::clone(&f.channels);
        let start = tokio::spawn(async move { channels.complete_start(ticket).await });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(f.channels.is_pending(SoundId::Storm));
        assert!(!f.channels.stop(SoundId::Storm).unwrap());
        assert!(!f.channels.is_pending(SoundId::Storm));

        f.source.release();
        assert_eq!(start.await.unwrap().unwrap(), StartOutcome::Abandoned);
        assert!(!f.channels.is_playing(SoundId::Storm));
        assert_eq!(f.device.active_voices(), 0);
    }

    #[tokio::test]
    async fn test_volume_is_clamped_and_applied_live() {
        let f = fixture().await;
        assert_eq!(f.channels.set_volume(SoundId::Cat, 150.0), 100.0);
        f.channels.start(SoundId::Cat).await.unwrap();

        let out = f.device.render(10);
        assert!((out[0].left - 0.5).abs() < 1e-3);

        assert_eq!(f.channels.set_volume(SoundId::Cat, -3.0), 0.0);
        assert_eq!(f.channels.level(SoundId::Cat), 0.0);
        assert!(f.channels.is_playing(SoundId::Cat));
        assert_eq!(f.device.render(10).peak(), 0.0);
    }

    #[tokio::test]
    async fn test_failed_start_reports_and_allows_retry() {
        let f = fixture().await;
        f.source.fail(SoundId::Birds);

        let err = f.channels.start(SoundId::Birds).await.unwrap_err();
        assert!(matches!(err, EngineError::Asset(_)));
        assert!(!f.channels.is_pending(SoundId::Birds));
        assert!(matches!(
            f.events.try_recv().unwrap(),
            EngineEvent::ChannelFailed { id: SoundId::Birds, .. }
        ));

        f.source.heal(SoundId::Birds);
        assert_eq!(f.channels.start(SoundId::Birds).await.unwrap(), StartOutcome::Started);
    }

    #[tokio::test]
    async fn test_start_all_skips_silent_and_pause_all_stops_everything() {
        let f = fixture().await;
        for id in SoundId::ALL {
            f.channels.set_volume(id, 0.0);
        }
        f.channels.set_volume(SoundId::Rain, 40.0);
        f.channels.set_volume(SoundId::Waves, 10.0);

        let report = f.channels.start_all_with_positive_volume().await;
        assert!(report.is_clean());
        assert_eq!(report.started, vec![SoundId::Rain, SoundId::Waves]);
        assert_eq!(f.device.active_voices(), 2);

        let stopped = f.channels.pause_all();
        assert_eq!(stopped, vec![SoundId::Rain, SoundId::Waves]);
        assert_eq!(f.device.active_voices(), 0);
    }

    #[tokio::test]
    async fn test_stop_with_full_queue_keeps_channel_playing() {
        use crate::asset::AudioBuffer;
        use crate::types::{StereoBuffer, StereoSample};

        let f = fixture().await;
        f.channels.start(SoundId::Rain).await.unwrap();
        assert_eq!(f.device.active_voices(), 1);

        // Fill the command queue without letting the renderer drain it
        let frames = StereoBuffer::from_vec(vec![StereoSample::mono(0.1); 10]);
        let filler = Arc::new(AudioBuffer::new(SoundId::Cat, RATE, frames).unwrap());
        let graph = f.device.graph();
        let gain = graph.create_channel_gain(SoundId::Cat, 0.0);
        let mut fillers = Vec::new();
        while let Ok(unit) = graph.start_voice(Arc::clone(&filler), Arc::clone(&gain), 0) {
            fillers.push(unit);
        }

        let err = f.channels.stop(SoundId::Rain).unwrap_err();
        assert!(matches!(err, EngineError::Graph(_)));
        assert!(f.channels.is_playing(SoundId::Rain));

        // Once the queue drains the same unit stops, and a restart adds one voice
        assert_eq!(f.device.active_voices(), 1 + fillers.len());
        assert!(f.channels.stop(SoundId::Rain).unwrap());
        assert_eq!(f.device.active_voices(), fillers.len());
        f.channels.start(SoundId::Rain).await.unwrap();
        assert_eq!(f.device.active_voices(), fillers.len() + 1);
    }
}
