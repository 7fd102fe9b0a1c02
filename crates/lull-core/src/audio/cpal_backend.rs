//! CPAL hardware output
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  StartVoice/StopVoice  ┌─────────────────────┐
//! │  Engine (tokio)  │───────push()──────────►│   Command Queue     │
//! │                  │                        │  (lock-free SPSC)   │
//! └────────┬─────────┘                        └──────────┬──────────┘
//!          │ DeviceControl + oneshot reply               │ pop()
//!          ▼                                             ▼
//! ┌──────────────────┐      play()/pause()    ┌─────────────────────┐
//! │  Device thread   │───────────────────────►│  CPAL Audio Thread  │
//! │ (owns the Stream)│                        │  (owns Renderer)    │
//! └──────────────────┘                        └─────────────────────┘
//! ```
//!
//! `cpal::Stream` cannot move between threads, so a dedicated thread builds
//! it, keeps it alive and serves resume/suspend requests. The audio callback
//! counts rendered frames into an atomic, which is the device clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use crossbeam::channel::{Receiver, Sender};
use tokio::sync::oneshot;

use super::config::{AudioConfig, MAX_BUFFER_SIZE};
use super::device::resolve_device;
use super::error::{DeviceError, DeviceResult};
use super::output::{AtomicDeviceState, DeviceState, OutputDevice};
use crate::graph::{audio_graph, GraphSender, Renderer};
use crate::types::StereoBuffer;

enum DeviceControl {
    Resume(oneshot::Sender<DeviceResult<()>>),
    Suspend(oneshot::Sender<DeviceResult<()>>),
    Close,
}

/// State shared between the handle, the device thread and the audio callback
struct DeviceShared {
    frames_rendered: AtomicU64,
    state: AtomicDeviceState,
}

/// What the device thread reports back once the stream is built
struct StreamInfo {
    name: String,
    sample_rate: u32,
    buffer_size: u32,
}

/// A hardware output opened through CPAL
///
/// Opens suspended. Dropping the handle closes the stream.
pub struct CpalDevice {
    name: String,
    sample_rate: u32,
    buffer_size: u32,
    graph: GraphSender,
    shared: Arc<DeviceShared>,
    control: Sender<DeviceControl>,
    thread: Option<thread::JoinHandle<()>>,
}

impl CpalDevice {
    /// Open the configured (or default) output device
    pub fn open(config: &AudioConfig) -> DeviceResult<Self> {
        let (graph, renderer) = audio_graph();
        let shared = Arc::new(DeviceShared {
            frames_rendered: AtomicU64::new(0),
            state: AtomicDeviceState::new(DeviceState::Suspended),
        });

        let (control_tx, control_rx) = crossbeam::channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam::channel::bounded(1);

        let thread_shared = Arc::clone(&shared);
        let thread_config = config.clone();
        let thread = thread::Builder::new()
            .name("lull-audio-device".to_string())
            .spawn(move || {
                let (stream, info) = match build_stream(&thread_config, renderer, &thread_shared) {
                    Ok(built) => built,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(info));
                run_control_loop(stream, control_rx, &thread_shared);
            })
            .map_err(|e| DeviceError::StreamBuildError(e.to_string()))?;

        let info = ready_rx.recv().map_err(|_| DeviceError::Closed)??;

        log::info!(
            "CpalDevice: opened '{}' at {}Hz, {} frames (~{:.1}ms)",
            info.name,
            info.sample_rate,
            info.buffer_size,
            info.buffer_size as f32 / info.sample_rate as f32 * 1000.0
        );

        Ok(Self {
            name: info.name,
            sample_rate: info.sample_rate,
            buffer_size: info.buffer_size,
            graph,
            shared,
            control: control_tx,
            thread: Some(thread),
        })
    }

    /// Negotiated buffer size in frames
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<DeviceResult<()>>) -> DeviceControl,
    ) -> DeviceResult<()> {
        let (tx, rx) = oneshot::channel();
        self.control.send(make(tx)).map_err(|_| DeviceError::Closed)?;
        rx.await.map_err(|_| DeviceError::Closed)?
    }
}

#[async_trait]
impl OutputDevice for CpalDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn state(&self) -> DeviceState {
        self.shared.state.load()
    }

    fn current_time(&self) -> f64 {
        self.shared.frames_rendered.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn graph(&self) -> &GraphSender {
        &self.graph
    }

    async fn resume(&self) -> DeviceResult<()> {
        self.request(DeviceControl::Resume).await
    }

    async fn suspend(&self) -> DeviceResult<()> {
        self.request(DeviceControl::Suspend).await
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        let _ = self.control.send(DeviceControl::Close);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("CpalDevice: device thread panicked");
            }
        }
    }
}

fn run_control_loop(stream: Stream, control: Receiver<DeviceControl>, shared: &DeviceShared) {
    while let Ok(msg) = control.recv() {
        match msg {
            DeviceControl::Resume(reply) => {
                let result = stream
                    .play()
                    .map_err(|e| DeviceError::StreamPlayError(e.to_string()));
                if result.is_ok() {
                    shared.state.store(DeviceState::Running);
                    log::debug!("CpalDevice: stream running");
                }
                let _ = reply.send(result);
            }
            DeviceControl::Suspend(reply) => {
                let result = stream
                    .pause()
                    .map_err(|e| DeviceError::StreamPlayError(e.to_string()));
                if result.is_ok() {
                    shared.state.store(DeviceState::Suspended);
                    log::debug!("CpalDevice: stream suspended");
                }
                let _ = reply.send(result);
            }
            DeviceControl::Close => break,
        }
    }
    shared.state.store(DeviceState::Closed);
    drop(stream);
    log::info!("CpalDevice: stream closed");
}

fn build_stream(
    config: &AudioConfig,
    mut renderer: Renderer,
    shared: &Arc<DeviceShared>,
) -> DeviceResult<(Stream, StreamInfo)> {
    let device = resolve_device(config.device.as_ref())?;
    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let supported = get_output_config(&device, config)?;
    let buffer_size = config.buffer_size.frames();
    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(buffer_size),
    };
    let sample_rate = stream_config.sample_rate.0;
    let channels = stream_config.channels as usize;

    let mut block = StereoBuffer::silence(MAX_BUFFER_SIZE);
    let clock = Arc::clone(shared);

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                for chunk in data.chunks_mut(MAX_BUFFER_SIZE * channels) {
                    let n_frames = chunk.len() / channels;
                    block.set_len_from_capacity(n_frames);
                    renderer.render(&mut block);

                    if channels == 2 {
                        chunk.copy_from_slice(block.as_interleaved());
                        continue;
                    }
                    for (frame, sample) in chunk.chunks_mut(channels).zip(block.iter()) {
                        frame[0] = sample.left;
                        if channels > 1 {
                            frame[1] = sample.right;
                        }
                        for ch in frame.iter_mut().skip(2) {
                            *ch = 0.0;
                        }
                    }
                }
                clock
                    .frames_rendered
                    .fetch_add((data.len() / channels) as u64, Ordering::AcqRel);
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| DeviceError::StreamBuildError(e.to_string()))?;

    // Some hosts start streams on creation
    if let Err(e) = stream.pause() {
        log::debug!("CpalDevice: initial pause not supported: {}", e);
    }

    Ok((
        stream,
        StreamInfo {
            name,
            sample_rate,
            buffer_size,
        },
    ))
}

/// Pick an f32 output config, stereo if possible, at the requested rate
fn get_output_config(
    device: &cpal::Device,
    config: &AudioConfig,
) -> DeviceResult<cpal::SupportedStreamConfig> {
    let supported: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| DeviceError::ConfigError(e.to_string()))?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .collect();

    if supported.is_empty() {
        return Err(DeviceError::UnsupportedFormat(
            "device offers no f32 output configuration".to_string(),
        ));
    }

    let target = config.target_sample_rate();
    let in_range = |c: &&cpal::SupportedStreamConfigRange| {
        target >= c.min_sample_rate().0 && target <= c.max_sample_rate().0
    };

    let best = supported
        .iter()
        .filter(|c| c.channels() >= 2)
        .find(in_range)
        .or_else(|| supported.iter().find(|c| c.channels() >= 2))
        .or_else(|| supported.first())
        .ok_or_else(|| DeviceError::ConfigError("No suitable output configuration".to_string()))?;

    let sample_rate = if in_range(&best) {
        cpal::SampleRate(target)
    } else {
        let fallback = best.max_sample_rate();
        log::warn!(
            "Audio device doesn't support {}Hz, falling back to {}Hz (sounds will be resampled)",
            target,
            fallback.0
        );
        fallback
    };

    Ok(best.clone().with_sample_rate(sample_rate))
}
