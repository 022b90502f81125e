//! Audio output: the cpal stream and the lock-free queue that feeds it.
//!
//! The render loop produces stereo blocks on the main thread and pushes them
//! as [`AudioCommand`]s; the audio thread drains them in its callback. The
//! callback publishes how many frames it has played, which is what the
//! render loop paces itself against.

pub mod callback;
pub mod command;
pub mod limiter;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    traits::{Producer, Split},
    HeapRb,
};
use thiserror::Error;
use tracing::{error, info};

pub use command::AudioCommand;
pub use limiter::Limiter;

use callback::AudioCallback;

/// Ring buffer capacity in commands.
const RING_BUFFER_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device found")]
    NoOutputDevice,
    #[error("device config error: {0}")]
    DeviceConfig(String),
    #[error("stream build error: {0}")]
    StreamBuild(String),
    #[error("stream play error: {0}")]
    StreamPlay(String),
    #[error("audio command ring buffer is full")]
    BufferFull,
}

/// Owns the output stream and the producer side of the command queue.
pub struct AudioEngine {
    _stream: cpal::Stream,
    producer: ringbuf::HeapProd<AudioCommand>,
    sample_rate: u32,
    channels: u16,
    played: Arc<AtomicU64>,
}

impl AudioEngine {
    /// Open the default output device at its default configuration.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoOutputDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;
        Self::build(&device, config.sample_rate().0, config.channels())
    }

    fn build(device: &cpal::Device, sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        let (producer, consumer) = HeapRb::<AudioCommand>::new(RING_BUFFER_CAPACITY).split();
        let played = Arc::new(AtomicU64::new(0));
        let mut audio_callback = AudioCallback::new(consumer, channels, sample_rate, played.clone());

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    audio_callback.process(data);
                },
                |err: cpal::StreamError| {
                    error!(error = %err, "audio stream error");
                },
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        stream.play().map_err(|e| AudioError::StreamPlay(e.to_string()))?;
        info!(sample_rate, channels, "audio output started");

        Ok(Self {
            _stream: stream,
            producer,
            sample_rate,
            channels,
            played,
        })
    }

    /// Queue interleaved stereo frames.
    pub fn send_block(&mut self, samples: Vec<f32>) -> Result<(), AudioError> {
        self.push(AudioCommand::Block(samples))
    }

    /// Master volume, clamped to 0.0..=1.0 on the audio thread.
    pub fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.push(AudioCommand::SetVolume(volume))
    }

    /// Drop queued audio.
    pub fn flush(&mut self) -> Result<(), AudioError> {
        self.push(AudioCommand::Flush)
    }

    fn push(&mut self, command: AudioCommand) -> Result<(), AudioError> {
        self.producer.try_push(command).map_err(|_| AudioError::BufferFull)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Stereo frames the device has played so far (underruns excluded).
    pub fn frames_played(&self) -> u64 {
        self.played.load(Ordering::Relaxed)
    }
}
