//! Stereo-linked peak limiter on the master output.
//!
//! Gain drops instantly to keep the louder channel at the ceiling and
//! recovers exponentially. Both channels always share one gain.

/// Default output ceiling.
pub const CEILING: f32 = 0.95;
/// Default recovery time constant.
pub const RELEASE_MS: f32 = 50.0;

#[derive(Debug, Clone)]
pub struct Limiter {
    ceiling: f32,
    release_coeff: f32,
    gain: f32,
}

impl Limiter {
    /// `ceiling` should be in `(0.0, 1.0]`.
    pub fn new(ceiling: f32, release_ms: f32, sample_rate: u32) -> Self {
        debug_assert!(ceiling > 0.0 && ceiling <= 1.0);
        let release_frames = (release_ms.max(0.0) / 1000.0) * sample_rate as f32;
        let release_coeff = if release_frames > 0.0 {
            (-1.0 / release_frames).exp()
        } else {
            0.0
        };
        Self {
            ceiling,
            release_coeff,
            gain: 1.0,
        }
    }

    pub fn for_sample_rate(sample_rate: u32) -> Self {
        Self::new(CEILING, RELEASE_MS, sample_rate)
    }

    /// Limit one stereo frame.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let peak = left.abs().max(right.abs());
        let needed = if peak > self.ceiling { self.ceiling / peak } else { 1.0 };
        self.gain = if needed < self.gain {
            needed
        } else {
            needed + (self.gain - needed) * self.release_coeff
        };
        (
            (left * self.gain).clamp(-self.ceiling, self.ceiling),
            (right * self.gain).clamp(-self.ceiling, self.ceiling),
        )
    }

    /// Current gain reduction factor (1.0 = none).
    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    pub fn reset(&mut self) {
        self.gain = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn quiet_signal_passes_unchanged() {
        let mut limiter = Limiter::for_sample_rate(48000);
        assert_eq!(limiter.process(0.5, -0.5), (0.5, -0.5));
        assert_eq!(limiter.process(0.95, -0.95), (0.95, -0.95));
        assert_eq!(limiter.gain(), 1.0);
    }

    #[test]
    fn peak_is_held_at_ceiling() {
        let mut limiter = Limiter::for_sample_rate(48000);
        let (l, r) = limiter.process(2.0, -2.0);
        assert_approx_eq!(l, 0.95, 1e-6);
        assert_approx_eq!(r, -0.95, 1e-6);
    }

    #[test]
    fn channels_share_gain() {
        let mut limiter = Limiter::for_sample_rate(48000);
        let (l, r) = limiter.process(1.9, 0.5);
        assert_approx_eq!(l, 0.95, 1e-6);
        assert_approx_eq!(r, 0.25, 1e-6);
    }

    #[test]
    fn gain_recovers_after_peak() {
        let mut limiter = Limiter::for_sample_rate(1000);
        limiter.process(1.9, 0.0);
        assert_approx_eq!(limiter.gain(), 0.5, 1e-6);
        let (l, _) = limiter.process(0.1, 0.0);
        assert!(l < 0.1);
        for _ in 0..500 {
            limiter.process(0.1, 0.0);
        }
        assert!(limiter.gain() > 0.99);
        limiter.reset();
        assert_eq!(limiter.gain(), 1.0);
    }

    #[test]
    fn never_exceeds_ceiling_while_recovering() {
        let mut limiter = Limiter::new(0.5, 10.0, 1000);
        limiter.process(1.0, 1.0);
        for i in 0..100 {
            let x = if i % 3 == 0 { 0.9 } else { 0.2 };
            let (l, r) = limiter.process(x, -x);
            assert!(l.abs() <= 0.5 && r.abs() <= 0.5);
        }
    }
}
