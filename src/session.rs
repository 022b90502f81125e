//! A playback session: one synth, one external output, one sequencer and the
//! observer watching them, all on the synth's frame clock.
//!
//! Sequencer ticks are frame deadlines. Rendering stops at each deadline,
//! runs the tick, and carries on, so notes start on the exact frame their
//! step begins. External note-offs run on the same clock in milliseconds.

use tracing::{debug, info, warn};

use crate::generator::{ChordInstance, NoteEvent};
use crate::midi::ExternalOutput;
use crate::sequencer::{is_valid_tempo, NullObserver, PlaybackObserver, Routing, Sequencer, StepAdvance};
use crate::synth::SynthEngine;

pub struct Session<O: PlaybackObserver = NullObserver> {
    synth: SynthEngine,
    output: Box<dyn ExternalOutput>,
    sequencer: Sequencer,
    observer: O,
    chords: Option<Vec<ChordInstance>>,
    looping: bool,
}

impl Session<NullObserver> {
    pub fn new(synth: SynthEngine, output: Box<dyn ExternalOutput>) -> Self {
        Self::with_observer(synth, output, NullObserver)
    }
}

impl<O: PlaybackObserver> Session<O> {
    pub fn with_observer(synth: SynthEngine, output: Box<dyn ExternalOutput>, observer: O) -> Self {
        let sequencer = Sequencer::new(synth.sample_rate());
        Self {
            synth,
            output,
            sequencer,
            observer,
            chords: None,
            looping: false,
        }
    }

    /// Replace the phrase. Stops playback if it was running.
    pub fn load_phrase(&mut self, events: Vec<NoteEvent>, chords: Option<Vec<ChordInstance>>) {
        if self.is_playing() {
            self.stop();
        }
        self.observer.on_phrase(&events, chords.as_deref());
        self.sequencer.load(events);
        self.chords = chords;
    }

    pub fn set_routing(&mut self, routing: Routing) {
        self.sequencer.set_routing(routing);
    }

    /// Whether `play` would start: there is a phrase, and any part routed
    /// to MIDI has a connected device.
    pub fn can_play(&self) -> bool {
        !self.sequencer.events().is_empty()
            && (!self.sequencer.routing().needs_midi() || self.output.is_connected())
    }

    /// Start the loaded phrase from step 0. Step 0 is dispatched immediately.
    /// An invalid tempo leaves any running playback alone.
    pub fn play(&mut self, tempo: f64, looping: bool) -> bool {
        if !is_valid_tempo(tempo) {
            warn!(tempo, "refusing to play at invalid tempo");
            return false;
        }
        if !self.can_play() {
            debug!(
                events = self.sequencer.events().len(),
                connected = self.output.is_connected(),
                "session cannot play"
            );
            return false;
        }
        if self.is_playing() {
            self.stop();
        }
        self.looping = looping;
        self.sequencer.set_looping(looping);
        if !self.sequencer.play(tempo, self.synth.frame()) {
            return false;
        }
        info!(tempo, looping, "playing phrase");
        self.observer.on_start();
        self.run_due_ticks();
        true
    }

    /// Play the loaded phrase again at a new tempo, keeping the loop mode.
    pub fn replay(&mut self, tempo: f64) -> bool {
        self.play(tempo, self.looping)
    }

    pub fn stop(&mut self) {
        self.sequencer
            .stop(&mut self.synth, self.output.as_mut(), &mut self.observer);
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    /// Session clock in milliseconds.
    pub fn now_ms(&self) -> f64 {
        self.synth.now() * 1000.0
    }

    /// Render interleaved stereo, running every tick that falls inside the block.
    pub fn render(&mut self, out: &mut [f32]) {
        let frames = (out.len() / 2) as u64;
        let mut done = 0u64;
        while done < frames {
            self.run_due_ticks();
            let chunk = self.frames_until_tick(frames - done);
            let start = (done * 2) as usize;
            let end = ((done + chunk) * 2) as usize;
            self.synth.render(&mut out[start..end]);
            done += chunk;
            self.output.advance_to(self.now_ms());
        }
        self.run_due_ticks();
    }

    /// Move the clock forward without producing audio, for MIDI-only or
    /// headless playback.
    pub fn advance(&mut self, frames: u64) {
        let mut done = 0u64;
        while done < frames {
            self.run_due_ticks();
            let chunk = self.frames_until_tick(frames - done);
            self.synth.advance(chunk);
            done += chunk;
            self.output.advance_to(self.now_ms());
        }
        self.run_due_ticks();
    }

    pub fn advance_ms(&mut self, ms: f64) {
        let frames = self.synth.ms_to_frames(ms);
        self.advance(frames);
    }

    fn frames_until_tick(&self, remaining: u64) -> u64 {
        match self.sequencer.next_tick_frame() {
            Some(next) if next > self.synth.frame() => (next - self.synth.frame()).min(remaining),
            _ => remaining,
        }
    }

    fn run_due_ticks(&mut self) {
        while let Some(due) = self.sequencer.next_tick_frame() {
            if due > self.synth.frame() {
                break;
            }
            self.output.advance_to(self.now_ms());
            let advance = self
                .sequencer
                .tick(&mut self.synth, self.output.as_mut(), &mut self.observer);
            if advance == StepAdvance::Finished {
                self.stop();
            }
        }
    }

    pub fn events(&self) -> &[NoteEvent] {
        self.sequencer.events()
    }

    pub fn chords(&self) -> Option<&[ChordInstance]> {
        self.chords.as_deref()
    }

    pub fn current_step(&self) -> u32 {
        self.sequencer.transport().current_step()
    }

    pub fn synth(&self) -> &SynthEngine {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut SynthEngine {
        &mut self.synth
    }

    pub fn output(&self) -> &dyn ExternalOutput {
        self.output.as_ref()
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }
}
