//! Transport state: play/stop control and a drift-free sixteenth-note clock.
//!
//! Tick frames are computed from the frame playback started at, so rounding
//! never accumulates over long loops.

use crate::theory::TOTAL_STEPS;

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// What a tick did to the step counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAdvance {
    /// Moved to the next step.
    Next,
    /// Ran off the end and wrapped to step 0.
    Wrapped,
    /// Ran off the end with looping off; the transport is now stopped.
    Finished,
}

/// A tempo the clock can run at: finite and above zero.
pub fn is_valid_tempo(tempo: f64) -> bool {
    tempo.is_finite() && tempo > 0.0
}

/// Milliseconds per sixteenth note at `tempo` BPM.
pub fn step_ms(tempo: f64) -> f64 {
    60000.0 / tempo / 4.0
}

#[derive(Debug)]
pub struct Transport {
    tempo: f64,
    sample_rate: u32,
    state: PlayState,
    looping: bool,
    step: u32,
    origin_frame: u64,
    ticks: u64,
}

impl Transport {
    /// A stopped transport at step zero.
    pub fn new(tempo: f64, sample_rate: u32) -> Self {
        Self {
            tempo,
            sample_rate,
            state: PlayState::Stopped,
            looping: false,
            step: 0,
            origin_frame: 0,
            ticks: 0,
        }
    }

    /// Start from step 0; the first tick is due at `now_frame`.
    pub fn play(&mut self, now_frame: u64) {
        self.state = PlayState::Playing;
        self.step = 0;
        self.origin_frame = now_frame;
        self.ticks = 0;
    }

    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Change tempo. While playing, the next tick keeps its frame and the new
    /// step length applies from there.
    pub fn set_tempo(&mut self, tempo: f64) {
        if let Some(next) = self.next_tick_frame() {
            self.origin_frame = next;
            self.ticks = 0;
        }
        self.tempo = tempo;
    }

    pub fn step_ms(&self) -> f64 {
        step_ms(self.tempo)
    }

    pub fn step_frames(&self) -> f64 {
        self.step_ms() * self.sample_rate as f64 / 1000.0
    }

    /// The step the next tick will play.
    pub fn current_step(&self) -> u32 {
        self.step
    }

    /// Frame at which the next tick is due, or `None` when stopped.
    pub fn next_tick_frame(&self) -> Option<u64> {
        if self.state == PlayState::Stopped {
            return None;
        }
        Some(self.origin_frame + (self.ticks as f64 * self.step_frames()).round() as u64)
    }

    /// Move past the current step.
    pub fn advance(&mut self) -> StepAdvance {
        self.ticks += 1;
        self.step += 1;
        if self.step < TOTAL_STEPS {
            return StepAdvance::Next;
        }
        self.step = 0;
        if self.looping {
            StepAdvance::Wrapped
        } else {
            self.state = PlayState::Stopped;
            StepAdvance::Finished
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let t = Transport::new(120.0, 44100);
        assert_eq!(t.state(), PlayState::Stopped);
        assert_eq!(t.current_step(), 0);
        assert_eq!(t.next_tick_frame(), None);
    }

    #[test]
    fn step_length() {
        assert!((step_ms(120.0) - 125.0).abs() < 1e-9);
        assert!((step_ms(110.0) - 136.3636).abs() < 1e-3);
        let t = Transport::new(120.0, 48000);
        assert!((t.step_frames() - 6000.0).abs() < 1e-9);
    }

    #[test]
    fn tempo_validity() {
        assert!(is_valid_tempo(110.0));
        assert!(is_valid_tempo(0.5));
        for bad in [0.0, -120.0, f64::NAN, f64::INFINITY] {
            assert!(!is_valid_tempo(bad), "{bad}");
        }
    }

    #[test]
    fn ticks_land_on_exact_frames() {
        let mut t = Transport::new(120.0, 48000);
        t.play(1000);
        assert_eq!(t.next_tick_frame(), Some(1000));
        t.advance();
        assert_eq!(t.next_tick_frame(), Some(7000));
        assert_eq!(t.current_step(), 1);
    }

    #[test]
    fn no_drift_over_many_loops() {
        let mut t = Transport::new(133.0, 44100);
        t.set_looping(true);
        t.play(0);
        for _ in 0..64 * 50 {
            t.advance();
        }
        let expected = (64.0 * 50.0 * t.step_frames()).round() as u64;
        assert_eq!(t.next_tick_frame(), Some(expected));
    }

    #[test]
    fn finishes_or_wraps_at_end() {
        let mut t = Transport::new(120.0, 44100);
        t.play(0);
        for _ in 0..63 {
            assert_eq!(t.advance(), StepAdvance::Next);
        }
        assert_eq!(t.advance(), StepAdvance::Finished);
        assert!(!t.is_playing());

        t.set_looping(true);
        t.play(0);
        for _ in 0..63 {
            t.advance();
        }
        assert_eq!(t.advance(), StepAdvance::Wrapped);
        assert!(t.is_playing());
        assert_eq!(t.current_step(), 0);
    }

    #[test]
    fn tempo_change_keeps_next_tick() {
        let mut t = Transport::new(120.0, 48000);
        t.play(0);
        t.advance();
        t.set_tempo(60.0);
        assert_eq!(t.next_tick_frame(), Some(6000));
        t.advance();
        assert_eq!(t.next_tick_frame(), Some(18000));
    }
}
