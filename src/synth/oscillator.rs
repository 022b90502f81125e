//! Oscillator primitives: waveform shapes and a phase accumulator.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Available waveform shapes. `Pulse` renders as a square wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Sawtooth,
    Square,
    Triangle,
    Pulse,
}

/// Generate a single sample for the given waveform at the specified phase.
///
/// `phase` is in the range [0.0, 1.0), representing one full cycle.
/// Returns a value in [-1.0, 1.0].
pub fn oscillator(waveform: Waveform, phase: f64) -> f64 {
    match waveform {
        Waveform::Sine => (phase * 2.0 * PI).sin(),
        Waveform::Sawtooth => 2.0 * phase - 1.0,
        Waveform::Square | Waveform::Pulse => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => {
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        }
    }
}

/// Convert a (possibly fractional) MIDI note number to frequency in Hz.
///
/// Standard tuning: A4 (MIDI 69) = 440 Hz.
pub fn midi_to_freq(note: f64) -> f64 {
    440.0 * 2.0f64.powf((note - 69.0) / 12.0)
}

/// Frequency ratio of a detune in cents.
pub fn cents_to_ratio(cents: f64) -> f64 {
    2.0f64.powf(cents / 1200.0)
}

/// A free-running oscillator.
#[derive(Debug, Clone)]
pub struct Phasor {
    waveform: Waveform,
    phase: f64,
}

impl Phasor {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    /// Current sample, then advance by one sample at `freq`.
    #[inline]
    pub fn next(&mut self, freq: f64, sample_rate: f64) -> f64 {
        let v = oscillator(self.waveform, self.phase);
        self.phase = (self.phase + freq / sample_rate).rem_euclid(1.0);
        v
    }
}
