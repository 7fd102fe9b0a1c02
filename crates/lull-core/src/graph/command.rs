//! Lock-free command queue from the control side to the renderer
//!
//! The control side pushes commands into an `rtrb` SPSC ring buffer (never
//! blocks), the audio thread drains it at the start of every block. Only two operations
//! cross the boundary: start a voice and stop a voice. Gains travel through
//! [`GainStage`] atomics instead.

use std::sync::Arc;

use crate::asset::AudioBuffer;

use super::gain::GainStage;

/// Capacity of the command ring buffer
///
/// A full master play of the whole catalog issues one command per sound, so
/// this leaves ample headroom for bursts of volume/pause interactions.
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Identifier of one playback unit (never reused within a session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

/// Commands processed by the renderer at block boundaries
pub enum GraphCommand {
    /// Begin looping `buffer` from `start_frame`, through `channel_gain`
    StartVoice {
        voice: VoiceId,
        buffer: Arc<AudioBuffer>,
        channel_gain: Arc<GainStage>,
        start_frame: usize,
    },
    /// Halt and release a voice
    StopVoice { voice: VoiceId },
}

impl std::fmt::Debug for GraphCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphCommand::StartVoice { voice, buffer, start_frame, .. } => f
                .debug_struct("StartVoice")
                .field("voice", voice)
                .field("sound", &buffer.id())
                .field("start_frame", start_frame)
                .finish(),
            GraphCommand::StopVoice { voice } => {
                f.debug_struct("StopVoice").field("voice", voice).finish()
            }
        }
    }
}

/// Create the command ring buffer
pub fn command_channel() -> (rtrb::Producer<GraphCommand>, rtrb::Consumer<GraphCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}
