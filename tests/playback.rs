//! Sequencer playback through a session, with the internal synth and a
//! captured MIDI device. No audio hardware involved.

use std::sync::{Arc, Mutex};

use melodizer::generator::{GenerationSettings, NoteEvent, PhraseGenerator};
use melodizer::midi::{ExternalOutput, MidiError, MidiOut, MidiSink};
use melodizer::sequencer::{OutputTarget, RecordingObserver, Routing};
use melodizer::session::Session;
use melodizer::synth::{PatchType, SynthEngine, VoiceKey};
use melodizer::theory::TheoryTables;

const SAMPLE_RATE: u32 = 48000;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<Vec<u8>>>>);

impl Capture {
    fn messages(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().clone()
    }
}

impl MidiSink for Capture {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
        self.0.lock().unwrap().push(message.to_vec());
        Ok(())
    }
}

fn midi_session() -> (Session<RecordingObserver>, Capture) {
    let capture = Capture::default();
    let output = MidiOut::with_sink(Box::new(capture.clone()), "capture");
    let session = Session::with_observer(SynthEngine::new(SAMPLE_RATE), Box::new(output), RecordingObserver::default());
    (session, capture)
}

fn all_midi(melody_channel: u8, bass_channel: Option<u8>) -> Routing {
    Routing {
        melody: OutputTarget::Midi,
        bass: OutputTarget::Midi,
        melody_channel,
        bass_channel,
    }
}

// =============================================================================
// MIDI dispatch order and gating

#[test]
fn same_step_events_go_out_melody_first() {
    let (mut session, capture) = midi_session();
    session.set_routing(all_midi(1, Some(2)));
    session.load_phrase(
        vec![
            NoteEvent::note(64, 100, 0, 64, false),
            NoteEvent::note(40, 90, 0, 64, true),
        ],
        None,
    );
    assert!(session.play(120.0, false));
    assert_eq!(capture.messages(), vec![vec![0x90, 64, 100], vec![0x91, 40, 90]]);
    assert_eq!(session.synth().active_voices(), 0);
}

#[test]
fn note_off_after_ninety_percent_of_the_note() {
    let (mut session, capture) = midi_session();
    session.set_routing(all_midi(3, None));
    session.load_phrase(
        vec![NoteEvent::note(60, 100, 0, 4, false), NoteEvent::rest(4, 60, false)],
        None,
    );
    session.play(120.0, false);
    // 125 ms steps: 4 steps gate at 450 ms.
    session.advance_ms(449.0);
    assert_eq!(capture.messages().len(), 1);
    session.advance_ms(1.0);
    assert_eq!(capture.messages(), vec![vec![0x92, 60, 100], vec![0x82, 60, 0]]);
}

#[test]
fn stop_sends_panic_on_both_channels() {
    let (mut session, capture) = midi_session();
    session.set_routing(all_midi(1, Some(10)));
    session.load_phrase(vec![NoteEvent::note(60, 100, 0, 64, false)], None);
    session.play(120.0, true);
    session.stop();
    let messages = capture.messages();
    // one note-on, then 128 note-offs per channel
    assert_eq!(messages.len(), 1 + 2 * 128);
    assert!(messages[1..129].iter().all(|m| m[0] == 0x80));
    assert!(messages[129..].iter().all(|m| m[0] == 0x89));
    assert_eq!(session.observer().stops, 1);
}

#[test]
fn split_routing_sends_bass_to_midi_only() {
    let (mut session, capture) = midi_session();
    session.set_routing(Routing {
        melody: OutputTarget::Internal,
        bass: OutputTarget::Midi,
        melody_channel: 1,
        bass_channel: Some(2),
    });
    session.load_phrase(
        vec![
            NoteEvent::note(72, 100, 0, 64, false),
            NoteEvent::note(36, 100, 0, 64, true),
        ],
        None,
    );
    session.play(100.0, false);
    assert_eq!(capture.messages(), vec![vec![0x91, 36, 100]]);
    assert_eq!(session.synth().active_voices(), 1);
}

#[test]
fn disconnected_midi_refuses_to_play() {
    let mut session = Session::new(SynthEngine::new(SAMPLE_RATE), Box::new(MidiOut::disconnected()));
    session.set_routing(all_midi(1, None));
    session.load_phrase(vec![NoteEvent::note(60, 100, 0, 64, false)], None);
    assert!(!session.output().is_connected());
    assert!(!session.can_play());
    assert!(!session.play(120.0, false));
}

// =============================================================================
// Whole phrase through the internal synth

#[test]
fn generated_phrase_plays_to_the_end() {
    let settings = GenerationSettings {
        use_chords: true,
        use_bass: true,
        tempo: 240.0,
        ..Default::default()
    };
    let mut generator = PhraseGenerator::with_seed(TheoryTables::default(), 5);
    let events = generator.generate(&settings);
    let chords = generator.last_progression().map(<[_]>::to_vec);
    let sounding = events.iter().filter(|e| !e.is_rest()).count();

    let mut session = Session::with_observer(
        SynthEngine::new(SAMPLE_RATE),
        Box::new(MidiOut::disconnected()),
        RecordingObserver::default(),
    );
    session.load_phrase(events, chords);
    assert!(session.chords().is_some());
    assert!(session.play(settings.tempo, false));

    let mut buf = vec![0.0f32; 2 * 512];
    let mut peak = 0.0f32;
    let mut blocks = 0;
    while session.is_playing() {
        session.render(&mut buf);
        peak = buf.iter().fold(peak, |p, s| p.max(s.abs()));
        blocks += 1;
        assert!(blocks < 1000, "phrase never finished");
    }
    assert_eq!(session.observer().steps, (0..64).collect::<Vec<_>>());
    assert_eq!(session.observer().stops, 1);
    assert!(sounding > 0);
    assert!(peak > 0.0);
    assert!(buf.iter().all(|s| s.is_finite()));
    assert_eq!(session.synth().active_voices(), 0);
}

// =============================================================================
// Voice lifecycle on the engine

#[test]
fn held_note_outlives_note_off_by_its_release() {
    let mut synth = SynthEngine::new(SAMPLE_RATE);
    let key = VoiceKey::Held {
        patch: PatchType::Melody,
        pitch: 60,
    };
    let release = synth.patch(PatchType::Melody).amp_env.release as f64;
    synth.note_on(60, 100, PatchType::Melody);
    synth.note_off(60, PatchType::Melody);
    assert!(synth.is_active(&key));

    synth.advance_ms(release * 1000.0 - 1.0);
    assert!(synth.is_active(&key));
    synth.advance_ms(60.0);
    assert!(!synth.is_active(&key));
    assert_eq!(synth.pending_timers(), 0);
}

#[test]
fn all_notes_off_clears_everything() {
    for voices in [0u8, 1, 5] {
        let mut synth = SynthEngine::new(SAMPLE_RATE);
        for i in 0..voices {
            synth.note_on(60 + i, 100, PatchType::Melody);
            synth.play_note(36 + i, 100, 500.0, PatchType::Bass);
        }
        synth.note_off(60, PatchType::Melody);
        synth.all_notes_off();
        assert_eq!(synth.active_voices(), 0);
        assert_eq!(synth.pending_timers(), 0);
        synth.advance_ms(1000.0);
        assert_eq!(synth.active_voices(), 0);
    }
}
