//! Bass lines: chord roots in harmony mode, an independent sparse line otherwise.

use rand::Rng;

use crate::theory::note::to_midi_byte;
use crate::theory::{Scale, TheoryTables, BARS_PER_PHRASE, STEPS_PER_BAR};

use super::event::NoteEvent;
use super::harmony::ChordInstance;
use super::melody::CADENCE_STEP;
use super::pool::NotePool;
use super::settings::GeneratorTuning;

const CHORD_BASS_VELOCITY: u8 = 90;
const LINE_VELOCITY: u8 = 85;
const LINE_ACCENT: u8 = 10;

/// Semitones below and above the bass root the independent line may reach.
const LINE_SPAN: (i32, i32) = (5, 7);

/// One whole-bar note per chord, on the chord's pitch class two octaves below
/// the phrase octave.
pub fn chord_bass(progression: &[ChordInstance], octave: i32) -> Vec<NoteEvent> {
    progression
        .iter()
        .take(BARS_PER_PHRASE as usize)
        .map(|chord| {
            NoteEvent::note(
                to_midi_byte(bass_root(chord.root_pitch, octave)),
                CHORD_BASS_VELOCITY,
                chord.bar * STEPS_PER_BAR,
                STEPS_PER_BAR,
                true,
            )
        })
        .collect()
}

/// A pitch class placed two octaves below the phrase octave.
pub fn bass_root(root_pitch: i32, octave: i32) -> i32 {
    root_pitch.rem_euclid(12) + (octave - 1) * 12
}

/// An independent stepwise line in the bass register.
///
/// Bar starts and the cadence usually jump to the bass root; otherwise the
/// line holds or steps and leans onto adjacent chord tones. Rests are rare
/// and never fall on a bar start.
pub fn scale_bass<R: Rng>(
    tables: &TheoryTables,
    scale: &Scale,
    root_pitch: i32,
    octave: i32,
    bar_patterns: [&[u32]; 4],
    tuning: &GeneratorTuning,
    rng: &mut R,
) -> Vec<NoteEvent> {
    let root = bass_root(root_pitch, octave);
    let pool = NotePool::scale_span(root, scale, root - LINE_SPAN.0, root + LINE_SPAN.1, tables);
    if pool.is_empty() {
        return Vec::new();
    }

    let mut events = Vec::new();
    let mut index = pool.find_index(root);
    let mut global_step = 0;

    for (bar, pattern) in bar_patterns.iter().enumerate() {
        let is_last_bar = bar == BARS_PER_PHRASE as usize - 1;
        let mut step_in_bar = 0;

        for &duration in pattern.iter() {
            let is_bar_start = step_in_bar == 0;
            let is_ending = is_last_bar && step_in_bar >= CADENCE_STEP;
            let is_rest = !is_bar_start && rng.gen::<f64>() < tuning.bass_rest_prob;

            if is_rest {
                events.push(NoteEvent::rest(global_step, duration, true));
            } else {
                let targets_root = is_bar_start || is_ending;
                if targets_root && rng.gen::<f64>() < tuning.bass_root_target_prob {
                    index = pool.find_index(root);
                } else {
                    let movement: isize = if rng.gen::<f64>() < tuning.bass_hold_prob {
                        0
                    } else if rng.gen::<f64>() < 0.5 {
                        1
                    } else {
                        -1
                    };
                    index = pool.clamp_index(index as isize + movement);
                    if rng.gen::<f64>() < tuning.bass_snap_prob {
                        if let Some(tone) = pool.first_adjacent_chord_tone(index) {
                            index = tone;
                        }
                    }
                }

                if let Some(c) = pool.get(index) {
                    let velocity = LINE_VELOCITY + if is_bar_start { LINE_ACCENT } else { 0 };
                    events.push(NoteEvent::note(to_midi_byte(c.pitch), velocity, global_step, duration, true));
                }
            }

            step_in_bar += duration;
            global_step += duration;
        }
    }
    events
}
