//! Built-in theory tables.

use super::rhythm::{BarLabel::*, BarStructure, RhythmLibrary};
use super::scale::{ChordType, DiatonicChord, DiatonicMap, Scale};
use super::style::{ProgressionTemplate, StyleProfile};
use super::TheoryTables;

pub fn tables() -> TheoryTables {
    TheoryTables {
        scales: scales(),
        chord_types: chord_types(),
        diatonic: diatonic_maps(),
        default_diatonic: "Minor".to_string(),
        chord_tone_degrees: vec![0, 2, 4],
        progressions: progressions(),
        rhythms: rhythms(),
        bar_structures: bar_structures(),
        styles: styles(),
    }
}

fn scales() -> Vec<Scale> {
    let s = |id: &str, intervals: &[u8]| Scale {
        id: id.to_string(),
        intervals: intervals.to_vec(),
    };
    vec![
        s("Minor", &[0, 2, 3, 5, 7, 8, 10]),
        s("Major", &[0, 2, 4, 5, 7, 9, 11]),
        s("PentMinor", &[0, 3, 5, 7, 10]),
        s("PentMajor", &[0, 2, 4, 7, 9]),
        s("Dorian", &[0, 2, 3, 5, 7, 9, 10]),
        s("Phrygian", &[0, 1, 3, 5, 7, 8, 10]),
        s("Lydian", &[0, 2, 4, 6, 7, 9, 11]),
        s("Mixolydian", &[0, 2, 4, 5, 7, 9, 10]),
        s("HarmMinor", &[0, 2, 3, 5, 7, 8, 11]),
        s("MelMinor", &[0, 2, 3, 5, 7, 9, 11]),
    ]
}

fn chord_types() -> Vec<ChordType> {
    let c = |id: &str, intervals: &[u8], symbol: &str| ChordType {
        id: id.to_string(),
        intervals: intervals.to_vec(),
        symbol: symbol.to_string(),
    };
    vec![
        c("maj", &[0, 4, 7], ""),
        c("min", &[0, 3, 7], "m"),
        c("dim", &[0, 3, 6], "°"),
        c("aug", &[0, 4, 8], "+"),
        c("maj7", &[0, 4, 7, 11], "maj7"),
        c("min7", &[0, 3, 7, 10], "m7"),
        c("dom7", &[0, 4, 7, 10], "7"),
        c("dim7", &[0, 3, 6, 9], "°7"),
        c("sus4", &[0, 5, 7], "sus4"),
        c("sus2", &[0, 2, 7], "sus2"),
    ]
}

fn diatonic_maps() -> Vec<DiatonicMap> {
    let map = |scale: &str, chords: [(&str, &str); 7]| DiatonicMap {
        scale: scale.to_string(),
        chords: chords
            .iter()
            .enumerate()
            .map(|(degree, (chord_type, numeral))| DiatonicChord {
                degree,
                chord_type: chord_type.to_string(),
                numeral: numeral.to_string(),
            })
            .collect(),
    };
    vec![
        map(
            "Minor",
            [
                ("min", "i"),
                ("dim", "ii°"),
                ("maj", "III"),
                ("min", "iv"),
                ("min", "v"),
                ("maj", "VI"),
                ("maj", "VII"),
            ],
        ),
        map(
            "Major",
            [
                ("maj", "I"),
                ("min", "ii"),
                ("min", "iii"),
                ("maj", "IV"),
                ("maj", "V"),
                ("min", "vi"),
                ("dim", "vii°"),
            ],
        ),
        map(
            "HarmMinor",
            [
                ("min", "i"),
                ("dim", "ii°"),
                ("aug", "III+"),
                ("min", "iv"),
                ("maj", "V"),
                ("maj", "VI"),
                ("dim", "vii°"),
            ],
        ),
        map(
            "Dorian",
            [
                ("min", "i"),
                ("min", "ii"),
                ("maj", "III"),
                ("maj", "IV"),
                ("min", "v"),
                ("dim", "vi°"),
                ("maj", "VII"),
            ],
        ),
    ]
}

fn progressions() -> Vec<ProgressionTemplate> {
    let p = |id: &str, degrees: [usize; 4], scales: &[&str]| ProgressionTemplate {
        id: id.to_string(),
        name: id.replace('-', " - "),
        degrees,
        scales: scales.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        p(
            "i-iv-V-i",
            [0, 3, 4, 0],
            &["Minor", "HarmMinor", "Dorian", "Phrygian", "MelMinor"],
        ),
        p("i-VI-III-VII", [0, 5, 2, 6], &["Minor", "Dorian", "Phrygian"]),
        p("i-VII-VI-VII", [0, 6, 5, 6], &["Minor", "Dorian"]),
        p("i-iv-VII-III", [0, 3, 6, 2], &["Minor", "Dorian"]),
        p("i-III-VII-VI", [0, 2, 6, 5], &["Minor", "Dorian"]),
        p("i-v-VI-IV", [0, 4, 5, 3], &["Minor", "Dorian"]),
        p("I-IV-V-I", [0, 3, 4, 0], &["Major", "Lydian", "Mixolydian"]),
        p("I-V-vi-IV", [0, 4, 5, 3], &["Major", "Lydian", "Mixolydian"]),
        p("I-vi-IV-V", [0, 5, 3, 4], &["Major", "Lydian"]),
        p("I-IV-vi-V", [0, 3, 5, 4], &["Major", "Mixolydian"]),
        p("I-ii-V-I", [0, 1, 4, 0], &["Major", "Lydian"]),
        p("vi-IV-I-V", [5, 3, 0, 4], &["Major"]),
        p("I-IV-V-IV", [0, 3, 4, 3], &["PentMajor", "PentMinor"]),
    ]
}

fn rhythms() -> Vec<RhythmLibrary> {
    let r = |id: &str, patterns: &[&[u32]]| RhythmLibrary {
        id: id.to_string(),
        patterns: patterns.iter().map(|p| p.to_vec()).collect(),
    };
    vec![
        r(
            "straight16",
            &[
                &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
                &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2],
                &[2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
                &[1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 2, 1, 1],
            ],
        ),
        r(
            "straight8",
            &[
                &[2, 2, 2, 2, 2, 2, 2, 2],
                &[2, 2, 2, 2, 4, 4],
                &[4, 2, 2, 2, 2, 2, 2],
                &[2, 2, 4, 2, 2, 4],
                &[2, 4, 2, 4, 2, 2],
            ],
        ),
        r(
            "syncopated",
            &[
                &[3, 1, 2, 2, 3, 1, 2, 2],
                &[1, 3, 2, 2, 1, 3, 2, 2],
                &[3, 3, 2, 3, 3, 2],
                &[2, 1, 1, 2, 2, 1, 1, 2, 2, 2],
                &[1, 2, 1, 2, 2, 1, 2, 1, 2, 2],
            ],
        ),
        r(
            "dotted",
            &[
                &[3, 1, 3, 1, 3, 1, 3, 1],
                &[3, 1, 3, 1, 4, 4],
                &[6, 2, 6, 2],
                &[3, 1, 2, 2, 3, 1, 2, 2],
                &[4, 2, 2, 3, 1, 2, 2],
            ],
        ),
        r(
            "mixed",
            &[
                &[2, 2, 1, 1, 2, 4, 2, 2],
                &[4, 2, 2, 1, 1, 2, 2, 2],
                &[2, 1, 1, 4, 2, 2, 2, 2],
                &[3, 1, 2, 2, 4, 2, 2],
                &[1, 1, 2, 4, 4, 2, 2],
                &[2, 2, 2, 2, 1, 1, 1, 1, 2, 2],
            ],
        ),
        r(
            "sparse",
            &[
                &[4, 4, 4, 4],
                &[8, 4, 4],
                &[4, 4, 8],
                &[8, 8],
                &[6, 2, 4, 4],
                &[4, 8, 4],
                &[4, 4, 4, 2, 2],
            ],
        ),
        r(
            "driving",
            &[
                &[2, 2, 2, 2, 2, 2, 2, 2],
                &[2, 2, 2, 2, 1, 1, 2, 2, 2],
                &[1, 1, 2, 1, 1, 2, 1, 1, 2, 1, 1, 2],
                &[2, 1, 1, 2, 1, 1, 2, 1, 1, 2, 2],
            ],
        ),
    ]
}

fn bar_structures() -> Vec<BarStructure> {
    vec![
        BarStructure([A, A, B, A]),
        BarStructure([A, B, A, B]),
        BarStructure([A, A, A, B]),
        BarStructure([A, B, B, A]),
        BarStructure([A, B, C, A]),
        BarStructure([A, A, B, C]),
    ]
}

#[allow(clippy::too_many_arguments)]
fn style(
    id: &str,
    name: &str,
    description: &str,
    probs: [f64; 7],
    dir_bias: f64,
    range: u32,
    pref_rhythm: &str,
) -> StyleProfile {
    let [chord_prob, step_prob, skip_prob, leap_prob, octave_prob, rest_prob, repeat_prob] = probs;
    StyleProfile {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        chord_prob,
        step_prob,
        skip_prob,
        leap_prob,
        octave_prob,
        rest_prob,
        repeat_prob,
        dir_bias,
        range,
        pref_rhythm: pref_rhythm.to_string(),
    }
}

// probs: chord, step, skip, leap, octave, rest, repeat
fn styles() -> Vec<StyleProfile> {
    vec![
        style(
            "arpeggio",
            "Arpeggio",
            "Fast flowing arpeggios with consistent 16th note movement",
            [0.75, 0.25, 0.45, 0.25, 0.15, 0.02, 0.05],
            0.0,
            14,
            "straight16",
        ),
        style(
            "driving",
            "Driving",
            "Steady 8th note pulse with strong downbeats",
            [0.65, 0.35, 0.35, 0.2, 0.1, 0.05, 0.15],
            0.0,
            10,
            "driving",
        ),
        style(
            "lead",
            "Synth Lead",
            "Expressive melodic lines with syncopated accents",
            [0.5, 0.45, 0.3, 0.2, 0.1, 0.08, 0.12],
            0.0,
            12,
            "syncopated",
        ),
        style(
            "nightdrive",
            "Night Drive",
            "Smooth, sustained phrases with gentle movement",
            [0.6, 0.55, 0.25, 0.15, 0.05, 0.1, 0.15],
            0.0,
            8,
            "sparse",
        ),
        style(
            "pulse",
            "Neon Pulse",
            "Rhythmic patterns with repeated notes and octave jumps",
            [0.7, 0.15, 0.25, 0.35, 0.25, 0.05, 0.35],
            0.0,
            14,
            "syncopated",
        ),
        style(
            "soaring",
            "Soaring",
            "Ascending melodic lines reaching upward",
            [0.55, 0.4, 0.35, 0.2, 0.12, 0.05, 0.08],
            0.5,
            14,
            "dotted",
        ),
        style(
            "mysterious",
            "Mysterious",
            "Dark, unpredictable patterns with dramatic pauses",
            [0.4, 0.45, 0.3, 0.2, 0.1, 0.18, 0.1],
            -0.2,
            10,
            "mixed",
        ),
        style(
            "aggressive",
            "Aggressive",
            "Intense, driving patterns with wide leaps",
            [0.6, 0.2, 0.3, 0.4, 0.25, 0.03, 0.2],
            0.0,
            16,
            "driving",
        ),
        style(
            "dreamy",
            "Dreamy",
            "Floating melodies with space to breathe",
            [0.6, 0.5, 0.3, 0.15, 0.08, 0.15, 0.1],
            0.15,
            10,
            "sparse",
        ),
        style(
            "bassline",
            "Bassline",
            "Low-end patterns with root note emphasis",
            [0.8, 0.3, 0.4, 0.25, 0.2, 0.08, 0.25],
            -0.3,
            12,
            "syncopated",
        ),
    ]
}
