//! ADSR envelopes, scheduled onto parameter timelines.

use serde::{Deserialize, Serialize};

use super::param::ParamTimeline;

/// Milliseconds a voice is kept alive after its release ramp should finish.
pub const TEARDOWN_MARGIN_MS: u64 = 50;

/// Attack-Decay-Sustain-Release envelope.
///
/// All time values are in seconds. Sustain is a level (0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    /// Schedule attack and decay from `floor` up to `peak`, settling at the
    /// sustain point between them.
    pub fn trigger_between(&self, param: &mut ParamTimeline, now: f64, floor: f32, peak: f32) {
        let attack_end = now + self.attack as f64;
        param.cancel_scheduled(now);
        param.set_value_at(floor, now);
        param.linear_ramp_to(peak, attack_end);
        param.linear_ramp_to(floor + (peak - floor) * self.sustain, attack_end + self.decay as f64);
    }

    /// Schedule a 0 → 1 → sustain gain envelope starting at `now`.
    pub fn trigger(&self, param: &mut ParamTimeline, now: f64) {
        self.trigger_between(param, now, 0.0, 1.0);
    }

    /// Cancel pending automation and ramp from wherever `param` is to `target`.
    pub fn release_to(&self, param: &mut ParamTimeline, now: f64, target: f32) {
        param.ramp_from_current(target, now, self.release as f64);
    }

    /// Delay from release to teardown: the release ramp plus a safety margin.
    pub fn teardown_delay_ms(&self) -> u64 {
        (self.release.max(0.0) as f64 * 1000.0).round() as u64 + TEARDOWN_MARGIN_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn test_env() -> Adsr {
        Adsr {
            attack: 0.01,
            decay: 0.05,
            sustain: 0.7,
            release: 0.1,
        }
    }

    #[test]
    fn gain_envelope_stages() {
        let env = test_env();
        let mut gain = ParamTimeline::new(0.0);
        let start = 3.0;
        env.trigger(&mut gain, start);
        env.release_to(&mut gain, start + 0.5, 0.0);

        let expected = [
            (0.0, 0.0),
            (0.005, 0.5),
            (0.01, 1.0),
            (0.035, 0.85),
            (0.06, 0.7),
            (0.3, 0.7),
            (0.5, 0.7),
            (0.55, 0.35),
            (0.6, 0.0),
            (2.0, 0.0),
        ];
        for (t, value) in expected {
            assert_approx_eq!(gain.value_at(start + t), value, 1e-4);
        }
    }

    #[test]
    fn zero_attack_jumps_to_peak() {
        let env = Adsr {
            attack: 0.0,
            decay: 0.0,
            ..test_env()
        };
        let mut gain = ParamTimeline::new(0.0);
        env.trigger(&mut gain, 1.0);
        assert!(gain.value_at(1.0).is_finite());
        assert_approx_eq!(gain.value_at(1.001), 0.7, 1e-4);
    }

    #[test]
    fn early_release_ramps_from_current_level() {
        let env = test_env();
        let mut gain = ParamTimeline::new(0.0);
        env.trigger(&mut gain, 0.0);
        // Half way up the attack
        env.release_to(&mut gain, 0.005, 0.0);
        assert_approx_eq!(gain.value_at(0.005), 0.5, 1e-4);
        assert_approx_eq!(gain.value_at(0.055), 0.25, 1e-4);
        assert_approx_eq!(gain.value_at(0.105), 0.0, 1e-4);
    }

    #[test]
    fn filter_sweep_between_base_and_peak() {
        let env = Adsr {
            attack: 0.01,
            decay: 0.3,
            sustain: 0.3,
            release: 0.5,
        };
        let mut cutoff = ParamTimeline::new(2000.0);
        env.trigger_between(&mut cutoff, 0.0, 2000.0, 5000.0);
        assert_approx_eq!(cutoff.value_at(0.0), 2000.0);
        assert_approx_eq!(cutoff.value_at(0.01), 5000.0, 0.1);
        assert_approx_eq!(cutoff.value_at(1.0), 2900.0, 0.1);
        env.release_to(&mut cutoff, 1.0, 2000.0);
        assert_approx_eq!(cutoff.value_at(1.25), 2450.0, 0.1);
        assert_approx_eq!(cutoff.value_at(1.5), 2000.0, 0.1);
    }

    #[test]
    fn teardown_delay() {
        assert_eq!(test_env().teardown_delay_ms(), 150);
        let slow = Adsr {
            release: 2.5,
            ..test_env()
        };
        assert_eq!(slow.teardown_delay_ms(), 2550);
    }
}
