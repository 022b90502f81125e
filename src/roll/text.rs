//! Plain-text piano roll.
//!
//! ```text
//!  C5 * |#===............|................|
//!  B4   |................|................|
//! ```
//!
//! `#` starts a melody note and `=` holds it; `B`/`b` do the same for bass.
//! `*` marks root keys and `-` other scale keys.

use std::fmt::Write;

use crate::generator::{ChordInstance, NoteEvent};
use crate::theory::{BARS_PER_PHRASE, STEPS_PER_BAR, TOTAL_STEPS};

use super::{cell_at, Cell, KeyRow};

const LABEL_WIDTH: usize = 4;

fn key_marker(row: &KeyRow) -> char {
    if row.is_root {
        '*'
    } else if row.in_scale {
        '-'
    } else {
        ' '
    }
}

fn cell_char(cell: Cell, is_playhead: bool) -> char {
    match cell {
        Cell::Onset => '#',
        Cell::Hold => '=',
        Cell::BassOnset => 'B',
        Cell::BassHold => 'b',
        Cell::Empty if is_playhead => ':',
        Cell::Empty => '.',
    }
}

/// One line per key, highest first. `playhead` marks a step column.
pub fn render_roll(events: &[NoteEvent], rows: &[KeyRow], playhead: Option<u32>) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = write!(out, "{:>width$} {} |", row.label, key_marker(row), width = LABEL_WIDTH);
        for step in 0..TOTAL_STEPS {
            out.push(cell_char(cell_at(events, row.pitch, step), playhead == Some(step)));
            if (step + 1) % STEPS_PER_BAR == 0 {
                out.push('|');
            }
        }
        out.push('\n');
    }
    out
}

/// Chord names aligned under the roll's bars.
pub fn chord_line(chords: &[ChordInstance]) -> String {
    let mut out = format!("{:width$} |", "", width = LABEL_WIDTH + 2);
    for bar in 0..BARS_PER_PHRASE {
        let name = chords
            .iter()
            .find(|c| c.bar == bar)
            .map(|c| c.display_name.as_str())
            .unwrap_or("");
        let _ = write!(out, "{:<width$}|", name, width = STEPS_PER_BAR as usize);
    }
    out
}
