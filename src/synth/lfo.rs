//! Per-voice low-frequency oscillator.

use super::oscillator::Phasor;
use super::patch::{LfoDestination, LfoSettings};

/// Cents of pitch modulation per unit of LFO amount.
pub const PITCH_CENTS_PER_UNIT: f32 = 0.5;
/// Hz of cutoff modulation per unit of LFO amount.
pub const FILTER_HZ_PER_UNIT: f32 = 20.0;

/// Offset an LFO applies to its destination at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LfoOffset {
    pub cents: f32,
    pub cutoff_hz: f32,
}

#[derive(Debug, Clone)]
pub struct Lfo {
    phasor: Phasor,
    rate: f64,
    destination: LfoDestination,
    depth: f32,
}

impl Lfo {
    /// An LFO for `settings`, or `None` when its amount is zero.
    pub fn from_settings(settings: &LfoSettings) -> Option<Self> {
        if settings.amount <= 0.0 {
            return None;
        }
        let depth = match settings.destination {
            LfoDestination::Pitch => settings.amount * PITCH_CENTS_PER_UNIT,
            LfoDestination::Filter => settings.amount * FILTER_HZ_PER_UNIT,
        };
        Some(Self {
            phasor: Phasor::new(settings.waveform),
            rate: settings.rate as f64,
            destination: settings.destination,
            depth,
        })
    }

    /// Current offset, advancing the LFO by `frames` samples.
    pub fn advance(&mut self, frames: usize, sample_rate: f64) -> LfoOffset {
        let value = self.phasor.next(self.rate * frames as f64, sample_rate) as f32 * self.depth;
        match self.destination {
            LfoDestination::Pitch => LfoOffset {
                cents: value,
                cutoff_hz: 0.0,
            },
            LfoDestination::Filter => LfoOffset {
                cents: 0.0,
                cutoff_hz: value,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::oscillator::Waveform;

    fn settings(destination: LfoDestination, amount: f32) -> LfoSettings {
        LfoSettings {
            rate: 1.0,
            waveform: Waveform::Square,
            destination,
            amount,
        }
    }

    #[test]
    fn zero_amount_is_off() {
        assert!(Lfo::from_settings(&settings(LfoDestination::Filter, 0.0)).is_none());
    }

    #[test]
    fn pitch_depth_in_cents() {
        let mut lfo = Lfo::from_settings(&settings(LfoDestination::Pitch, 10.0)).unwrap();
        let first = lfo.advance(1, 100.0);
        assert_eq!(first, LfoOffset { cents: 5.0, cutoff_hz: 0.0 });
    }

    #[test]
    fn filter_depth_in_hz_and_swings_negative() {
        let mut lfo = Lfo::from_settings(&settings(LfoDestination::Filter, 10.0)).unwrap();
        // One block per half cycle at 1 Hz, 100 Hz control rate.
        assert_eq!(lfo.advance(50, 100.0).cutoff_hz, 200.0);
        assert_eq!(lfo.advance(50, 100.0).cutoff_hz, -200.0);
    }
}
