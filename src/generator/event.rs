//! Generated note and rest events.

use serde::{Deserialize, Serialize};

/// One note or rest of a generated phrase. Times are in 16th-note steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch, or `None` for a rest.
    pub pitch: Option<u8>,
    pub duration_steps: u32,
    pub start_step: u32,
    pub bar: u32,
    pub step_in_bar: u32,
    /// 0 for rests.
    pub velocity: u8,
    pub is_bass: bool,
}

impl NoteEvent {
    pub fn note(pitch: u8, velocity: u8, start_step: u32, duration_steps: u32, is_bass: bool) -> Self {
        Self {
            pitch: Some(pitch),
            duration_steps,
            start_step,
            bar: start_step / crate::theory::STEPS_PER_BAR,
            step_in_bar: start_step % crate::theory::STEPS_PER_BAR,
            velocity,
            is_bass,
        }
    }

    pub fn rest(start_step: u32, duration_steps: u32, is_bass: bool) -> Self {
        Self {
            pitch: None,
            velocity: 0,
            ..Self::note(0, 0, start_step, duration_steps, is_bass)
        }
    }

    pub fn is_rest(&self) -> bool {
        self.pitch.is_none()
    }

    /// First step after the event.
    pub fn end_step(&self) -> u32 {
        self.start_step + self.duration_steps
    }

    /// Whether the event sounds at `step`.
    pub fn covers(&self, step: u32) -> bool {
        self.start_step <= step && step < self.end_step()
    }
}

/// Total duration of the melody events (notes and rests) in steps.
pub fn melody_span(events: &[NoteEvent]) -> u32 {
    events.iter().filter(|e| !e.is_bass).map(|e| e.duration_steps).sum()
}

/// Total duration of the bass events (notes and rests) in steps.
pub fn bass_span(events: &[NoteEvent]) -> u32 {
    events.iter().filter(|e| e.is_bass).map(|e| e.duration_steps).sum()
}
