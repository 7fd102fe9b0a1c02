//! Real-time renderer - owned exclusively by the audio thread
//!
//! Signal flow per block:
//!
//! ```text
//!  voice(rain) ──► × channel gain(rain) ──┐
//!  voice(fire) ──► × channel gain(fire) ──┼──► Σ ──► × master gain ──► device
//!  voice(wind) ──► × channel gain(wind) ──┘
//! ```
//!
//! Voices loop their buffer seamlessly: the read position wraps to frame 0
//! inside the block, so there is no gap at the loop point.

use std::sync::Arc;

use crate::asset::AudioBuffer;
use crate::types::StereoBuffer;

use super::command::{GraphCommand, VoiceId};
use super::gain::GainStage;

/// Voices pre-allocated so starting playback never allocates on the audio thread
pub const MAX_VOICES: usize = 64;

/// One live playback unit
struct Voice {
    id: VoiceId,
    buffer: Arc<AudioBuffer>,
    channel_gain: Arc<GainStage>,
    /// Next frame to read
    position: usize,
}

/// Mixes all live voices into the output block
pub struct Renderer {
    commands: rtrb::Consumer<GraphCommand>,
    voices: Vec<Voice>,
    master_gain: Arc<GainStage>,
}

impl Renderer {
    pub fn new(commands: rtrb::Consumer<GraphCommand>, master_gain: Arc<GainStage>) -> Self {
        Self {
            commands,
            voices: Vec::with_capacity(MAX_VOICES),
            master_gain,
        }
    }

    /// Number of voices currently looping
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Drain pending commands (lock-free, called once per block)
    pub fn process_commands(&mut self) {
        while let Ok(cmd) = self.commands.pop() {
            match cmd {
                GraphCommand::StartVoice {
                    voice,
                    buffer,
                    channel_gain,
                    start_frame,
                } => {
                    let position = start_frame % buffer.frame_count();
                    self.voices.push(Voice {
                        id: voice,
                        buffer,
                        channel_gain,
                        position,
                    });
                }
                GraphCommand::StopVoice { voice } => {
                    if let Some(idx) = self.voices.iter().position(|v| v.id == voice) {
                        // Buffers stay referenced by the asset cache, so this
                        // never frees sample memory on the audio thread
                        self.voices.swap_remove(idx);
                    }
                }
            }
        }
    }

    /// Render one block into `out` (its current length is the block size)
    pub fn render(&mut self, out: &mut StereoBuffer) {
        self.process_commands();
        out.fill_silence();

        let out = out.as_mut_slice();
        let block_len = out.len();

        for voice in &mut self.voices {
            let frames = voice.buffer.frames().as_slice();
            let len = frames.len();
            let gain = voice.channel_gain.get();

            if gain == 0.0 {
                // Silent, but the loop keeps moving so resuming the gain stays in phase
                voice.position = (voice.position + block_len) % len;
                continue;
            }

            let mut pos = voice.position;
            for sample in out.iter_mut() {
                *sample += frames[pos] * gain;
                pos += 1;
                if pos == len {
                    pos = 0;
                }
            }
            voice.position = pos;
        }

        let master = self.master_gain.get();
        if master != 1.0 {
            for sample in out.iter_mut() {
                *sample *= master;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SoundId;
    use crate::graph::command::command_channel;
    use crate::types::StereoSample;

    /// Buffer whose frame `i` holds `i` in both channels
    fn ramp_buffer(id: SoundId, frames: usize) -> Arc<AudioBuffer> {
        let samples = (0..frames).map(|i| StereoSample::mono(i as f32)).collect();
        Arc::new(AudioBuffer::new(id, 100, StereoBuffer::from_vec(samples)).unwrap())
    }

    fn constant_buffer(id: SoundId, value: f32) -> Arc<AudioBuffer> {
        let samples = vec![StereoSample::mono(value); 100];
        Arc::new(AudioBuffer::new(id, 100, StereoBuffer::from_vec(samples)).unwrap())
    }

    #[test]
    fn test_loop_wraps_seamlessly() {
        let (mut tx, rx) = command_channel();
        let mut renderer = Renderer::new(rx, Arc::new(GainStage::default()));
        tx.push(GraphCommand::StartVoice {
            voice: VoiceId(1),
            buffer: ramp_buffer(SoundId::Rain, 4),
            channel_gain: Arc::new(GainStage::default()),
            start_frame: 2,
        })
        .unwrap();

        let mut out = StereoBuffer::silence(6);
        renderer.render(&mut out);
        let lefts: Vec<f32> = out.iter().map(|s| s.left).collect();
        assert_eq!(lefts, vec![2.0, 3.0, 0.0, 1.0, 2.0, 3.0]);

        // Continues where the previous block ended
        renderer.render(&mut out);
        assert_eq!(out[0].left, 0.0);
        assert_eq!(out[1].left, 1.0);
    }

    #[test]
    fn test_channel_and_master_gain() {
        let (mut tx, rx) = command_channel();
        let master = Arc::new(GainStage::default());
        let mut renderer = Renderer::new(rx, Arc::clone(&master));

        let rain_gain = Arc::new(GainStage::new(0.8));
        let fire_gain = Arc::new(GainStage::new(0.2));
        tx.push(GraphCommand::StartVoice {
            voice: VoiceId(1),
            buffer: constant_buffer(SoundId::Rain, 1.0),
            channel_gain: Arc::clone(&rain_gain),
            start_frame: 0,
        })
        .unwrap();
        tx.push(GraphCommand::StartVoice {
            voice: VoiceId(2),
            buffer: constant_buffer(SoundId::Fire, 1.0),
            channel_gain: Arc::clone(&fire_gain),
            start_frame: 0,
        })
        .unwrap();

        let mut out = StereoBuffer::silence(8);
        renderer.render(&mut out);
        assert!((out[0].left - 1.0).abs() < 1e-6);

        master.set(0.5);
        renderer.render(&mut out);
        assert!((out[0].left - 0.5).abs() < 1e-6);
        assert_eq!(rain_gain.get(), 0.8);
        assert_eq!(fire_gain.get(), 0.2);
    }

    #[test]
    fn test_stop_voice_removes_it() {
        let (mut tx, rx) = command_channel();
        let mut renderer = Renderer::new(rx, Arc::new(GainStage::default()));
        tx.push(GraphCommand::StartVoice {
            voice: VoiceId(7),
            buffer: constant_buffer(SoundId::Wind, 1.0),
            channel_gain: Arc::new(GainStage::default()),
            start_frame: 0,
        })
        .unwrap();
        renderer.process_commands();
        assert_eq!(renderer.active_voices(), 1);

        tx.push(GraphCommand::StopVoice { voice: VoiceId(7) }).unwrap();
        tx.push(GraphCommand::StopVoice { voice: VoiceId(99) }).unwrap();
        let mut out = StereoBuffer::silence(4);
        renderer.render(&mut out);
        assert_eq!(renderer.active_voices(), 0);
        assert_eq!(out.peak(), 0.0);
    }
}
