//! Sequencer: walks a phrase one sixteenth note at a time and dispatches
//! each note to the internal synth or the external output.
//!
//! Within a tick, events go out in phrase order (melody before bass).

pub mod observer;
pub mod routing;
pub mod step_index;
pub mod transport;

use tracing::{debug, trace, warn};

use crate::generator::NoteEvent;
use crate::midi::ExternalOutput;
use crate::synth::{PatchType, SynthEngine};

pub use observer::{NullObserver, PlaybackObserver, RecordingObserver};
pub use routing::{OutputTarget, Routing};
pub use step_index::StepIndex;
pub use transport::{is_valid_tempo, step_ms, PlayState, StepAdvance, Transport};

pub struct Sequencer {
    transport: Transport,
    events: Vec<NoteEvent>,
    index: StepIndex,
    routing: Routing,
}

impl Sequencer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            transport: Transport::new(120.0, sample_rate),
            events: Vec::new(),
            index: StepIndex::new(&[]),
            routing: Routing::default(),
        }
    }

    /// Load a phrase. Takes effect from the next `play`.
    pub fn load(&mut self, events: Vec<NoteEvent>) {
        self.index = StepIndex::new(&events);
        self.events = events;
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn routing(&self) -> &Routing {
        &self.routing
    }

    pub fn set_routing(&mut self, routing: Routing) {
        self.routing = routing;
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.transport.set_looping(looping);
    }

    /// Change tempo. Zero, negative and non-finite tempos are ignored.
    pub fn set_tempo(&mut self, tempo: f64) {
        if !is_valid_tempo(tempo) {
            warn!(tempo, "ignoring invalid tempo");
            return;
        }
        self.transport.set_tempo(tempo);
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    /// Start from step 0 at `now_frame`. An empty phrase or an invalid
    /// tempo does not start.
    pub fn play(&mut self, tempo: f64, now_frame: u64) -> bool {
        if self.events.is_empty() {
            return false;
        }
        if !is_valid_tempo(tempo) {
            warn!(tempo, "refusing to play at invalid tempo");
            return false;
        }
        self.transport.set_tempo(tempo);
        self.transport.play(now_frame);
        debug!(tempo, step_ms = self.transport.step_ms(), "playback started");
        true
    }

    pub fn next_tick_frame(&self) -> Option<u64> {
        self.transport.next_tick_frame()
    }

    /// Play the current step: notify the observer, dispatch every note
    /// starting there, and advance.
    pub fn tick(
        &mut self,
        synth: &mut SynthEngine,
        output: &mut dyn ExternalOutput,
        observer: &mut dyn PlaybackObserver,
    ) -> StepAdvance {
        let step = self.transport.current_step();
        let step_ms = self.transport.step_ms();
        observer.on_step(step, &self.events);

        for &i in self.index.at(step) {
            let event = &self.events[i];
            let Some(pitch) = event.pitch else {
                continue;
            };
            match self.routing.target(event.is_bass) {
                OutputTarget::Internal => {
                    let patch = if event.is_bass { PatchType::Bass } else { PatchType::Melody };
                    synth.play_note(pitch, event.velocity, event.duration_steps as f64 * step_ms, patch);
                }
                OutputTarget::Midi => {
                    if output.is_connected() {
                        let channel = self.routing.channel(event.is_bass);
                        output.send_note(pitch, event.velocity, event.duration_steps, channel, step_ms);
                    }
                }
            }
            trace!(step, pitch, bass = event.is_bass, "dispatch");
        }

        self.transport.advance()
    }

    /// Stop the clock and silence everything that was started.
    pub fn stop(
        &mut self,
        synth: &mut SynthEngine,
        output: &mut dyn ExternalOutput,
        observer: &mut dyn PlaybackObserver,
    ) {
        self.transport.stop();
        synth.all_notes_off();
        if output.is_connected() {
            for channel in self.routing.panic_channels() {
                output.all_notes_off(channel);
            }
        }
        observer.on_stop();
        debug!("playback stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockOutput {
        connected: bool,
        notes: Vec<(u8, u8, u32, u8)>,
        panics: Vec<u8>,
    }

    impl ExternalOutput for MockOutput {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn send_note(&mut self, pitch: u8, velocity: u8, duration_steps: u32, channel: u8, _step_ms: f64) {
            self.notes.push((pitch, velocity, duration_steps, channel));
        }

        fn all_notes_off(&mut self, channel: u8) {
            self.panics.push(channel);
        }

        fn advance_to(&mut self, _now_ms: f64) {}
    }

    fn phrase() -> Vec<NoteEvent> {
        vec![
            NoteEvent::note(60, 100, 0, 8, false),
            NoteEvent::rest(8, 56, false),
            NoteEvent::note(36, 90, 0, 64, true),
        ]
    }

    #[test]
    fn empty_phrase_does_not_start() {
        let mut seq = Sequencer::new(48000);
        assert!(!seq.play(120.0, 0));
        assert!(!seq.is_playing());
    }

    #[test]
    fn invalid_tempo_does_not_start() {
        let mut seq = Sequencer::new(48000);
        seq.load(phrase());
        for tempo in [0.0, -90.0, f64::NAN, f64::INFINITY] {
            assert!(!seq.play(tempo, 100), "{tempo}");
            assert!(!seq.is_playing());
            assert_eq!(seq.next_tick_frame(), None);
        }
    }

    #[test]
    fn invalid_tempo_change_keeps_clock() {
        let mut seq = Sequencer::new(48000);
        seq.load(phrase());
        assert!(seq.play(120.0, 0));
        seq.set_tempo(0.0);
        seq.set_tempo(f64::NAN);
        assert_eq!(seq.transport().tempo(), 120.0);
        assert!((seq.transport().step_ms() - 125.0).abs() < 1e-9);
    }

    #[test]
    fn first_tick_dispatches_internal_voices() {
        let mut seq = Sequencer::new(48000);
        let mut synth = SynthEngine::new(48000);
        let mut out = MockOutput::default();
        let mut obs = RecordingObserver::default();
        seq.load(phrase());
        assert!(seq.play(120.0, 0));
        assert_eq!(seq.tick(&mut synth, &mut out, &mut obs), StepAdvance::Next);
        assert_eq!(synth.active_voices(), 2);
        assert_eq!(obs.steps, vec![0]);
        assert!(out.notes.is_empty());
    }

    #[test]
    fn midi_routing_uses_channels() {
        let mut seq = Sequencer::new(48000);
        let mut synth = SynthEngine::new(48000);
        let mut out = MockOutput {
            connected: true,
            ..Default::default()
        };
        seq.load(phrase());
        seq.set_routing(Routing {
            melody: OutputTarget::Midi,
            bass: OutputTarget::Midi,
            melody_channel: 2,
            bass_channel: Some(9),
        });
        seq.play(120.0, 0);
        seq.tick(&mut synth, &mut out, &mut NullObserver);
        assert_eq!(out.notes, vec![(60, 100, 8, 2), (36, 90, 64, 9)]);
        assert_eq!(synth.active_voices(), 0);

        seq.stop(&mut synth, &mut out, &mut NullObserver);
        assert_eq!(out.panics, vec![2, 9]);
    }

    #[test]
    fn stop_skips_disconnected_output() {
        let mut seq = Sequencer::new(48000);
        let mut synth = SynthEngine::new(48000);
        let mut out = MockOutput::default();
        let mut obs = RecordingObserver::default();
        seq.load(phrase());
        seq.play(120.0, 0);
        seq.tick(&mut synth, &mut out, &mut obs);
        seq.stop(&mut synth, &mut out, &mut obs);
        assert!(out.panics.is_empty());
        assert_eq!(synth.active_voices(), 0);
        assert_eq!(obs.stops, 1);
        assert!(!seq.is_playing());
    }

    #[test]
    fn sixty_four_ticks_then_finished() {
        let mut seq = Sequencer::new(48000);
        let mut synth = SynthEngine::new(48000);
        let mut out = MockOutput::default();
        let mut obs = RecordingObserver::default();
        seq.load(phrase());
        seq.play(120.0, 0);
        let mut last = StepAdvance::Next;
        for _ in 0..64 {
            last = seq.tick(&mut synth, &mut out, &mut obs);
        }
        assert_eq!(last, StepAdvance::Finished);
        assert_eq!(obs.steps, (0..64).collect::<Vec<_>>());
    }
}
