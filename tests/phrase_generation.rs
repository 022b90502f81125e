//! Phrase generation end to end: settings in, events and chords out.

use melodizer::generator::{bass_span, melody_span, GenerationSettings, PhraseGenerator};
use melodizer::theory::{TheoryTables, STEPS_PER_BAR, TOTAL_STEPS};

const MINOR_INTERVALS: [i32; 7] = [0, 2, 3, 5, 7, 8, 10];

fn settings(root: &str, octave: i32) -> GenerationSettings {
    GenerationSettings {
        root: root.to_string(),
        octave,
        scale: "Minor".to_string(),
        ..Default::default()
    }
}

// =============================================================================
// C minor, driving style and rhythm, melody only

#[test]
fn c_minor_driving_stays_in_scale() {
    let s = GenerationSettings {
        style: "driving".to_string(),
        rhythm: "driving".to_string(),
        use_chords: false,
        use_bass: false,
        ..settings("C", 4)
    };
    for seed in 0..32 {
        let mut generator = PhraseGenerator::with_seed(TheoryTables::default(), seed);
        let events = generator.generate(&s);
        assert_eq!(melody_span(&events), TOTAL_STEPS, "seed {seed}");
        assert!(events.iter().all(|e| !e.is_bass));
        for pitch in events.iter().filter_map(|e| e.pitch) {
            let interval = (pitch as i32 - 60).rem_euclid(12);
            assert!(MINOR_INTERVALS.contains(&interval), "seed {seed}: pitch {pitch} outside C minor");
        }
        assert!(generator.last_progression().is_none());
    }
}

// =============================================================================
// A minor over i-iv-V-i

#[test]
fn a_minor_cadence_progression() {
    let s = GenerationSettings {
        use_chords: true,
        progression: "i-iv-V-i".to_string(),
        ..settings("A", 3)
    };
    for seed in 0..8 {
        let mut generator = PhraseGenerator::with_seed(TheoryTables::default(), seed);
        generator.generate(&s);
        let chords = generator.last_progression().expect("progression");
        assert_eq!(chords.len(), 4);
        assert_eq!(chords[0].degree, 0);
        assert_eq!(chords[3].degree, 0);
        assert_eq!(chords[0].chord_type, "min");
        assert_eq!(chords[0].display_name, "Am");
        for (bar, chord) in chords.iter().enumerate() {
            assert_eq!(chord.bar, bar as u32);
        }
    }
}

#[test]
fn chord_names_follow_root_and_type() {
    let tables = TheoryTables::default();
    let s = GenerationSettings {
        use_chords: true,
        ..settings("Eb", 4)
    };
    let mut generator = PhraseGenerator::with_seed(tables.clone(), 11);
    generator.generate(&s);
    let chords = generator.last_progression().expect("progression").to_vec();
    let diatonic = tables.diatonic_chords("Minor");
    for chord in &chords {
        assert!(chord.degree < diatonic.len());
        let symbol = &tables.chord_type(&chord.chord_type).expect("chord type").symbol;
        assert_eq!(
            chord.display_name,
            melodizer::generator::ChordInstance::display_name_for(chord.root_pitch, symbol)
        );
    }
    // Reading it again does not re-roll anything.
    assert_eq!(generator.last_progression().expect("progression"), chords.as_slice());
}

// =============================================================================
// Spans across every style and rhythm

#[test]
fn every_style_and_rhythm_fills_the_phrase() {
    let tables = TheoryTables::default();
    let mut generator = PhraseGenerator::with_seed(tables.clone(), 7);
    for style in &tables.styles {
        for rhythm in &tables.rhythms {
            for (use_chords, use_bass) in [(false, false), (true, true), (false, true)] {
                let s = GenerationSettings {
                    style: style.id.clone(),
                    rhythm: rhythm.id.clone(),
                    use_chords,
                    use_bass,
                    ..settings("D", 4)
                };
                let events = generator.generate(&s);
                assert_eq!(melody_span(&events), TOTAL_STEPS, "{} / {}", style.id, rhythm.id);
                let expected_bass = if use_bass { TOTAL_STEPS } else { 0 };
                assert_eq!(bass_span(&events), expected_bass, "{} / {}", style.id, rhythm.id);
                if let Some(first_bass) = events.iter().position(|e| e.is_bass) {
                    assert!(events[first_bass..].iter().all(|e| e.is_bass), "melody before bass");
                }
            }
        }
    }
}

#[test]
fn builtin_rhythm_patterns_fill_a_bar() {
    let tables = TheoryTables::default();
    for library in &tables.rhythms {
        for pattern in &library.patterns {
            assert_eq!(pattern.iter().sum::<u32>(), STEPS_PER_BAR, "{}", library.id);
        }
    }
}

#[test]
fn seeds_are_repeatable() {
    let s = GenerationSettings {
        use_chords: true,
        use_bass: true,
        ..settings("F", 3)
    };
    let a = PhraseGenerator::with_seed(TheoryTables::default(), 99).generate(&s);
    let b = PhraseGenerator::with_seed(TheoryTables::default(), 99).generate(&s);
    assert_eq!(a, b);
}

#[test]
fn extreme_octaves_clamp_before_generation() {
    for (asked, used) in [(-3, 2), (0, 2), (12, 7)] {
        for use_chords in [false, true] {
            let s = GenerationSettings {
                use_chords,
                use_bass: true,
                ..settings("B", asked)
            };
            let clamped = GenerationSettings { octave: used, ..s.clone() };
            let events = PhraseGenerator::with_seed(TheoryTables::default(), 5).generate(&s);
            let expected = PhraseGenerator::with_seed(TheoryTables::default(), 5).generate(&clamped);
            assert_eq!(events, expected, "octave {asked}");
            for pitch in events.iter().filter_map(|e| e.pitch) {
                let interval = (pitch as i32 - 11).rem_euclid(12);
                assert!(MINOR_INTERVALS.contains(&interval), "octave {asked}: pitch {pitch} outside B minor");
            }
        }
    }
}
