//! Audio callback, running on the cpal thread.
//!
//! Drains commands, plays queued stereo frames on whatever channel layout the
//! device has, and counts the frames it consumed so the render loop can pace
//! itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringbuf::traits::Consumer;
use ringbuf::HeapCons;

use super::command::AudioCommand;
use super::limiter::Limiter;

/// Consumed samples are compacted away once the read position passes this.
const COMPACT_THRESHOLD: usize = 8192;

/// State owned by the audio thread.
pub struct AudioCallback {
    consumer: HeapCons<AudioCommand>,
    /// Interleaved stereo.
    queue: Vec<f32>,
    read_pos: usize,
    volume: f32,
    limiter: Limiter,
    channels: u16,
    played: Arc<AtomicU64>,
}

impl AudioCallback {
    pub fn new(consumer: HeapCons<AudioCommand>, channels: u16, sample_rate: u32, played: Arc<AtomicU64>) -> Self {
        Self {
            consumer,
            queue: Vec::with_capacity(sample_rate as usize * 2),
            read_pos: 0,
            volume: 1.0,
            limiter: Limiter::for_sample_rate(sample_rate),
            channels: channels.max(1),
            played,
        }
    }

    /// Fill one device buffer of `channels`-interleaved samples.
    pub fn process(&mut self, output: &mut [f32]) {
        while let Some(cmd) = self.consumer.try_pop() {
            match cmd {
                AudioCommand::Block(data) => self.queue.extend_from_slice(&data),
                AudioCommand::SetVolume(v) => self.volume = v.clamp(0.0, 1.0),
                AudioCommand::Flush => {
                    self.queue.clear();
                    self.read_pos = 0;
                    self.limiter.reset();
                }
            }
        }

        let channels = self.channels as usize;
        let mut consumed = 0u64;
        for frame in output.chunks_mut(channels) {
            let (left, right) = if self.read_pos + 1 < self.queue.len() {
                let pair = (self.queue[self.read_pos], self.queue[self.read_pos + 1]);
                self.read_pos += 2;
                consumed += 1;
                pair
            } else {
                (0.0, 0.0)
            };
            let (left, right) = self.limiter.process(left * self.volume, right * self.volume);
            write_frame(frame, left, right);
        }
        if consumed > 0 {
            self.played.fetch_add(consumed, Ordering::Relaxed);
        }

        if self.read_pos >= COMPACT_THRESHOLD {
            self.queue.drain(..self.read_pos);
            self.read_pos = 0;
        }
    }

    /// Stereo frames still waiting to be played.
    pub fn queued_frames(&self) -> usize {
        (self.queue.len() - self.read_pos) / 2
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// Map a stereo frame onto a device frame: mono gets the average, extra
/// channels stay silent.
fn write_frame(frame: &mut [f32], left: f32, right: f32) {
    match frame.len() {
        0 => {}
        1 => frame[0] = 0.5 * (left + right),
        _ => {
            frame[0] = left;
            frame[1] = right;
            for sample in &mut frame[2..] {
                *sample = 0.0;
            }
        }
    }
}
