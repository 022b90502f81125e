//! Resonant low-pass filter built on `biquad`.
//!
//! Coefficients are recomputed only when cutoff or Q move by more than a
//! small threshold, and the filter state survives coefficient changes so a
//! sweeping cutoff does not click.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type};

pub const MIN_CUTOFF: f32 = 20.0;
pub const MAX_CUTOFF: f32 = 20000.0;
const MIN_Q: f32 = 0.01;
const CUTOFF_EPSILON: f32 = 0.1;
const Q_EPSILON: f32 = 0.01;

pub struct LowPass {
    filter: DirectForm2Transposed<f32>,
    sample_rate: f32,
    cutoff: f32,
    q: f32,
}

impl LowPass {
    /// A filter at `cutoff` Hz, or a transparent pass-through if the
    /// coefficients cannot be built.
    pub fn new(sample_rate: f32, cutoff: f32, q: f32) -> Self {
        let cutoff = clamp_cutoff(cutoff, sample_rate);
        let q = q.max(MIN_Q);
        let filter = match coefficients(sample_rate, cutoff, q) {
            Some(c) => DirectForm2Transposed::<f32>::new(c),
            None => DirectForm2Transposed::<f32>::new(passthrough()),
        };
        Self {
            filter,
            sample_rate,
            cutoff,
            q,
        }
    }

    /// Retune the filter. Small changes are ignored.
    pub fn set_params(&mut self, cutoff: f32, q: f32) {
        let cutoff = clamp_cutoff(cutoff, self.sample_rate);
        let q = q.max(MIN_Q);
        if (cutoff - self.cutoff).abs() <= CUTOFF_EPSILON && (q - self.q).abs() <= Q_EPSILON {
            return;
        }
        if let Some(c) = coefficients(self.sample_rate, cutoff, q) {
            self.filter.update_coefficients(c);
            self.cutoff = cutoff;
            self.q = q;
        }
    }

    #[inline]
    pub fn run(&mut self, input: f32) -> f32 {
        self.filter.run(input)
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    pub fn q(&self) -> f32 {
        self.q
    }
}

/// Clamp a cutoff into [20 Hz, 20 kHz], and below Nyquist.
pub fn clamp_cutoff(cutoff: f32, sample_rate: f32) -> f32 {
    let ceiling = MAX_CUTOFF.min(sample_rate * 0.49);
    cutoff.max(MIN_CUTOFF).min(ceiling)
}

fn coefficients(sample_rate: f32, cutoff: f32, q: f32) -> Option<Coefficients<f32>> {
    Coefficients::<f32>::from_params(Type::LowPass, sample_rate.hz(), cutoff.hz(), q).ok()
}

fn passthrough() -> Coefficients<f32> {
    Coefficients {
        a1: 0.0,
        a2: 0.0,
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
    }
}
