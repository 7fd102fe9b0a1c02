//! Audio graph - gain stages, playback units and the real-time renderer
//!
//! The graph is split in two halves created together by [`audio_graph`]:
//!
//! - [`GraphSender`]: control side. Creates channel gain stages, starts and
//!   stops playback units. Shared by the engine.
//! - [`Renderer`]: audio side. Owned by the output device's audio thread.
//!
//! Construction is explicit: a channel gain stage is created through the
//! sender (`channel gain -> master gain -> device output`), and each start
//! pushes a `StartVoice` command bound to that stage.

mod command;
mod gain;
mod render;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::asset::AudioBuffer;
use crate::catalog::SoundId;

pub use command::{command_channel, GraphCommand, VoiceId, COMMAND_QUEUE_CAPACITY};
pub use gain::GainStage;
pub use render::{Renderer, MAX_VOICES};

/// Errors from the control side of the graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The audio thread is not draining commands fast enough (or has stopped)
    #[error("Audio graph command queue is full")]
    QueueFull,
}

/// A stop that could not be queued; the unit is handed back still live
#[derive(Error, Debug)]
#[error("Failed to stop voice: {error}")]
pub struct StopVoiceError {
    pub unit: PlaybackUnit,
    pub error: GraphError,
}

/// A live, non-reusable playback unit
///
/// Returned by [`GraphSender::start_voice`] and consumed by
/// [`GraphSender::stop_voice`], so a unit can be stopped at most once and can
/// never be restarted.
#[derive(Debug)]
pub struct PlaybackUnit {
    voice: VoiceId,
    buffer: Arc<AudioBuffer>,
}

impl PlaybackUnit {
    pub fn voice(&self) -> VoiceId {
        self.voice
    }

    pub fn sound(&self) -> SoundId {
        self.buffer.id()
    }

    /// Loop length of the bound buffer in seconds
    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }
}

/// Control-side handle to the audio graph
pub struct GraphSender {
    producer: Mutex<rtrb::Producer<GraphCommand>>,
    master_gain: Arc<GainStage>,
    next_voice: AtomicU64,
}

impl GraphSender {
    /// The single master gain stage every channel feeds into
    pub fn master_gain(&self) -> Arc<GainStage> {
        Arc::clone(&self.master_gain)
    }

    /// Create a channel gain stage routed into the master gain
    pub fn create_channel_gain(&self, sound: SoundId, gain: f32) -> Arc<GainStage> {
        log::debug!("GraphSender: connecting '{}' gain -> master", sound);
        Arc::new(GainStage::new(gain))
    }

    /// Start looping `buffer` from `start_frame` through `channel_gain`
    pub fn start_voice(
        &self,
        buffer: Arc<AudioBuffer>,
        channel_gain: Arc<GainStage>,
        start_frame: usize,
    ) -> Result<PlaybackUnit, GraphError> {
        let voice = VoiceId(self.next_voice.fetch_add(1, Ordering::Relaxed));
        self.push(GraphCommand::StartVoice {
            voice,
            buffer: Arc::clone(&buffer),
            channel_gain,
            start_frame,
        })?;
        Ok(PlaybackUnit { voice, buffer })
    }

    /// Halt and release a playback unit
    ///
    /// If the command queue is full the unit comes back in the error and
    /// keeps playing.
    pub fn stop_voice(&self, unit: PlaybackUnit) -> Result<(), StopVoiceError> {
        match self.push(GraphCommand::StopVoice { voice: unit.voice }) {
            Ok(()) => Ok(()),
            Err(error) => Err(StopVoiceError { unit, error }),
        }
    }

    fn push(&self, cmd: GraphCommand) -> Result<(), GraphError> {
        let mut producer = self.producer.lock().unwrap();
        producer.push(cmd).map_err(|e| match e {
            rtrb::PushError::Full(cmd) => {
                log::error!("GraphSender: command queue full, dropping {:?}", cmd);
                GraphError::QueueFull
            }
        })
    }
}

/// Create both halves of an audio graph
pub fn audio_graph() -> (GraphSender, Renderer) {
    let (producer, consumer) = command_channel();
    let master_gain = Arc::new(GainStage::default());
    let sender = GraphSender {
        producer: Mutex::new(producer),
        master_gain: Arc::clone(&master_gain),
        next_voice: AtomicU64::new(1),
    };
    (sender, Renderer::new(consumer, master_gain))
}
