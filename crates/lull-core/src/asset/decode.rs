//! Ambience loop decoding
//!
//! Turns encoded asset bytes (FLAC, WAV, Ogg Vorbis) into a stereo
//! [`AudioBuffer`] at the output device's sample rate, so the renderer can
//! loop it frame by frame without any conversion on the audio thread.

use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::catalog::SoundId;
use crate::types::{StereoBuffer, StereoSample};

use super::error::{AssetError, AssetResult};

/// Decoded PCM for one sound
///
/// Immutable once built. Shared between the cache and every playback unit
/// through `Arc`.
#[derive(Debug)]
pub struct AudioBuffer {
    id: SoundId,
    sample_rate: u32,
    frames: StereoBuffer,
}

impl AudioBuffer {
    /// Wrap already-decoded stereo frames
    ///
    /// Returns a decode error for an empty buffer: a zero-length loop has no
    /// duration to wrap around.
    pub fn new(id: SoundId, sample_rate: u32, frames: StereoBuffer) -> AssetResult<Self> {
        if frames.is_empty() {
            return Err(AssetError::Decode {
                id,
                reason: "no audio frames".to_string(),
            });
        }
        if sample_rate == 0 {
            return Err(AssetError::Decode {
                id,
                reason: "sample rate is zero".to_string(),
            });
        }
        Ok(Self { id, sample_rate, frames })
    }

    pub fn id(&self) -> SoundId {
        self.id
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of stereo frames in one loop iteration
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Natural loop duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.sample_rate as f64
    }

    pub fn frames(&self) -> &StereoBuffer {
        &self.frames
    }

    /// Convert a loop-relative offset in seconds to a frame index
    ///
    /// The offset is wrapped into the loop, so any non-negative value maps to
    /// a valid frame.
    pub fn frame_at(&self, offset_secs: f64) -> usize {
        let frame = (offset_secs.max(0.0) * self.sample_rate as f64).round() as usize;
        frame % self.frames.len()
    }
}

/// Decode an encoded asset into an [`AudioBuffer`] at `target_rate`
///
/// `asset_path` is only used as a format hint (file extension).
pub fn decode_audio(
    id: SoundId,
    bytes: Vec<u8>,
    asset_path: &str,
    target_rate: u32,
) -> AssetResult<AudioBuffer> {
    let decode_err = |reason: String| AssetError::Decode { id, reason };

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(asset_path).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_err(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("no audio track found".to_string()))?;

    let track_id = track.id;
    let source_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| decode_err("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(e.to_string()))?;

    let mut frames: Vec<StereoSample> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut channels = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_err(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("decode_audio: skipping corrupt packet in '{}': {}", id, e);
                continue;
            }
            Err(e) => return Err(decode_err(e.to_string())),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            push_stereo_frames(&mut frames, buf.samples(), channels);
        }
    }

    if channels == 0 {
        return Err(decode_err("no audio frames".to_string()));
    }

    let frames = if source_rate != target_rate {
        log::debug!(
            "decode_audio: resampling '{}' {} Hz -> {} Hz",
            id,
            source_rate,
            target_rate
        );
        resample_linear(&frames, source_rate, target_rate)
    } else {
        frames
    };

    log::info!(
        "decode_audio: '{}' decoded, {} frames @ {} Hz ({} source channel(s))",
        id,
        frames.len(),
        target_rate,
        channels
    );

    AudioBuffer::new(id, target_rate, StereoBuffer::from_vec(frames))
}

/// Append interleaved samples as stereo frames
///
/// Mono is duplicated to both sides; channels beyond the first two are dropped.
fn push_stereo_frames(out: &mut Vec<StereoSample>, interleaved: &[f32], channels: usize) {
    match channels {
        0 => {}
        1 => out.extend(interleaved.iter().map(|&s| StereoSample::mono(s))),
        n => out.extend(
            interleaved
                .chunks_exact(n)
                .map(|frame| StereoSample::new(frame[0], frame[1])),
        ),
    }
}

/// Simple linear interpolation resampling over stereo frames
fn resample_linear(frames: &[StereoSample], from_rate: u32, to_rate: u32) -> Vec<StereoSample> {
    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (frames.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < frames.len() {
            frames[idx] * (1.0 - frac) + frames[idx + 1] * frac
        } else if idx < frames.len() {
            frames[idx]
        } else {
            StereoSample::silence()
        };
        output.push(sample);
    }

    output
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode `frames` stereo frames of a constant value as a 16-bit WAV file
    pub(crate) fn wav_bytes(frames: usize, sample_rate: u32, channels: u16, value: f32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            let sample = (value * i16::MAX as f32) as i16;
            for _ in 0..frames * channels as usize {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_stereo_wav() {
        let bytes = wav_bytes(4800, 48000, 2, 0.5);
        let buffer = decode_audio(SoundId::Wind, bytes, "wind.wav", 48000).unwrap();
        assert_eq!(buffer.frame_count(), 4800);
        assert!((buffer.duration_secs() - 0.1).abs() < 1e-9);
        assert!((buffer.frames()[100].left - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_decode_mono_is_duplicated() {
        let bytes = wav_bytes(480, 48000, 1, 0.25);
        let buffer = decode_audio(SoundId::Cat, bytes, "cat.wav", 48000).unwrap();
        let frame = buffer.frames()[10];
        assert_eq!(frame.left, frame.right);
        assert!((frame.left - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_decode_resamples_to_target_rate() {
        let bytes = wav_bytes(44100, 44100, 2, 0.5);
        let buffer = decode_audio(SoundId::Waves, bytes, "waves.wav", 48000).unwrap();
        assert_eq!(buffer.sample_rate(), 48000);
        assert!((buffer.duration_secs() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = decode_audio(SoundId::Fire, b"definitely not audio".to_vec(), "fire.flac", 48000)
            .unwrap_err();
        assert!(matches!(err, AssetError::Decode { id: SoundId::Fire, .. }));
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let err = AudioBuffer::new(SoundId::Rain, 48000, StereoBuffer::default()).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }

    #[test]
    fn test_frame_at_wraps() {
        let buffer = AudioBuffer::new(SoundId::Rain, 100, StereoBuffer::silence(200)).unwrap();
        assert_eq!(buffer.frame_at(0.5), 50);
        assert_eq!(buffer.frame_at(2.5), 50);
        assert_eq!(buffer.frame_at(-1.0), 0);
    }
}
