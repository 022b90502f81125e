//! Live playhead on a terminal line.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};
use tracing::debug;

use crate::generator::{ChordInstance, NoteEvent};
use crate::sequencer::PlaybackObserver;
use crate::theory::{note_label, STEPS_PER_BAR, TOTAL_STEPS};

use super::active_notes;

/// Redraws one status line per step: position, playhead bar, chord and the
/// notes sounding.
pub struct TerminalObserver<W: Write> {
    out: W,
    chords: Vec<ChordInstance>,
}

impl TerminalObserver<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            chords: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn status_line(&self, step: u32, events: &[NoteEvent]) -> String {
        let bar = step / STEPS_PER_BAR;
        let beat = (step % STEPS_PER_BAR) / 4;
        let playhead: String = (0..TOTAL_STEPS)
            .map(|s| match s {
                s if s == step => '|',
                s if s % STEPS_PER_BAR == 0 => ':',
                _ => '.',
            })
            .collect();
        let chord = self
            .chords
            .iter()
            .find(|c| c.bar == bar)
            .map(|c| c.display_name.as_str())
            .unwrap_or("-");
        let notes: Vec<String> = active_notes(events, step)
            .iter()
            .filter_map(|e| e.pitch)
            .map(|p| note_label(p.into()))
            .collect();
        format!("{}.{} {} {:<6} {}", bar + 1, beat + 1, playhead, chord, notes.join(" "))
    }

    fn draw(&mut self, line: &str) -> io::Result<()> {
        queue!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine), Print(line))?;
        self.out.flush()
    }
}

impl<W: Write> PlaybackObserver for TerminalObserver<W> {
    fn on_phrase(&mut self, _events: &[NoteEvent], chords: Option<&[ChordInstance]>) {
        self.chords = chords.map(<[_]>::to_vec).unwrap_or_default();
    }

    fn on_step(&mut self, step: u32, events: &[NoteEvent]) {
        let line = self.status_line(step, events);
        if let Err(e) = self.draw(&line) {
            debug!(error = %e, "status line draw failed");
        }
    }

    fn on_stop(&mut self) {
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}
