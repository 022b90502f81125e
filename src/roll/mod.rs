//! Piano-roll projection of a phrase.
//!
//! Pure functions from events to rows and cells; [`text`] draws them as
//! plain text and [`terminal`] animates a playhead while a session plays.

pub mod terminal;
pub mod text;

use crate::generator::NoteEvent;
use crate::theory::{is_black_key, note_label, Scale};

pub use terminal::TerminalObserver;
pub use text::{chord_line, render_roll};

/// Semitones shown above and below the root.
const SPAN_ABOVE: i32 = 14;
const SPAN_BELOW: i32 = 14;
/// Extra room below the root when the phrase has a bass line.
const SPAN_BELOW_WITH_BASS: i32 = 29;

/// Inclusive pitch range of the roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollRange {
    pub low: i32,
    pub high: i32,
}

impl RollRange {
    pub fn for_root(root: i32, with_bass: bool) -> Self {
        let below = if with_bass { SPAN_BELOW_WITH_BASS } else { SPAN_BELOW };
        Self {
            low: root - below,
            high: root + SPAN_ABOVE,
        }
    }

    pub fn contains(&self, pitch: i32) -> bool {
        (self.low..=self.high).contains(&pitch)
    }

    /// Number of keys in the range.
    pub fn len(&self) -> usize {
        (self.high - self.low + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One key on the roll's left edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRow {
    pub pitch: i32,
    pub label: String,
    pub is_black: bool,
    pub is_root: bool,
    pub in_scale: bool,
}

/// Keys from highest to lowest, marked against the root and scale.
pub fn key_rows(range: RollRange, root: i32, scale: Option<&Scale>) -> Vec<KeyRow> {
    (range.low..=range.high)
        .rev()
        .map(|pitch| KeyRow {
            pitch,
            label: note_label(pitch),
            is_black: is_black_key(pitch),
            is_root: (pitch - root).rem_euclid(12) == 0,
            in_scale: scale.map_or(false, |s| s.contains(pitch - root)),
        })
        .collect()
}

/// Every sounding event covering `step`.
pub fn active_notes(events: &[NoteEvent], step: u32) -> Vec<&NoteEvent> {
    events.iter().filter(|e| !e.is_rest() && e.covers(step)).collect()
}

/// Whether a note with `pitch` sounds at `step`, and whether it starts there.
pub fn cell_at(events: &[NoteEvent], pitch: i32, step: u32) -> Cell {
    let mut cell = Cell::Empty;
    for event in events {
        if event.pitch.map(i32::from) != Some(pitch) || !event.covers(step) {
            continue;
        }
        if event.start_step == step {
            return if event.is_bass { Cell::BassOnset } else { Cell::Onset };
        }
        cell = if event.is_bass { Cell::BassHold } else { Cell::Hold };
    }
    cell
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Onset,
    Hold,
    BassOnset,
    BassHold,
}
