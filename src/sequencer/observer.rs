//! Visualization hooks. Observers see playback but never steer it.

use crate::generator::{ChordInstance, NoteEvent};

pub trait PlaybackObserver {
    /// A new phrase was loaded.
    fn on_phrase(&mut self, _events: &[NoteEvent], _chords: Option<&[ChordInstance]>) {}

    fn on_start(&mut self) {}

    /// Called at the start of each tick, before its events are dispatched.
    fn on_step(&mut self, _step: u32, _events: &[NoteEvent]) {}

    fn on_stop(&mut self) {}
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl PlaybackObserver for NullObserver {}

/// Records every hook call, for tests and headless runs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingObserver {
    pub phrases: usize,
    pub starts: usize,
    pub steps: Vec<u32>,
    pub stops: usize,
}

impl PlaybackObserver for RecordingObserver {
    fn on_phrase(&mut self, _events: &[NoteEvent], _chords: Option<&[ChordInstance]>) {
        self.phrases += 1;
    }

    fn on_start(&mut self) {
        self.starts += 1;
    }

    fn on_step(&mut self, step: u32, _events: &[NoteEvent]) {
        self.steps.push(step);
    }

    fn on_stop(&mut self) {
        self.stops += 1;
    }
}
