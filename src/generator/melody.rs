//! The melodic walk.
//!
//! The walk keeps an index into each bar's note pool and moves it by a
//! rolled interval class, pulled toward chord tones, anchored on bar roots,
//! and resolved to the phrase root over the last four steps.

use rand::Rng;
use tracing::warn;

use crate::theory::note::to_midi_byte;
use crate::theory::{Scale, StyleProfile, TheoryTables, BARS_PER_PHRASE};

use super::event::NoteEvent;
use super::harmony::ChordInstance;
use super::pool::NotePool;
use super::settings::GeneratorTuning;

/// Step within the final bar where the cadence begins.
pub const CADENCE_STEP: u32 = 12;

/// Everything the walk reads, resolved up front.
pub struct MelodyContext<'a> {
    pub tables: &'a TheoryTables,
    pub scale: &'a Scale,
    pub style: &'a StyleProfile,
    pub tuning: &'a GeneratorTuning,
    pub root_pitch: i32,
    pub progression: Option<&'a [ChordInstance]>,
    /// Rhythm pattern for each of the four bars.
    pub bar_patterns: [&'a [u32]; 4],
}

impl MelodyContext<'_> {
    fn pool_for_bar(&self, bar: usize) -> (NotePool, i32) {
        let scale_pool = || NotePool::from_scale(self.root_pitch, self.scale, self.style.range, self.tables);
        match self.progression.and_then(|p| p.get(bar)) {
            Some(chord) => {
                let pool = NotePool::from_chord(&chord.tones, self.style.range, self.root_pitch);
                if pool.is_empty() {
                    warn!(bar, chord = %chord.display_name, "no chord tones in range, using scale");
                    (scale_pool(), chord.root_pitch)
                } else {
                    (pool, chord.root_pitch)
                }
            }
            None => (scale_pool(), self.root_pitch),
        }
    }
}

/// Walk all four bars, emitting one event per rhythm slot.
pub fn generate<R: Rng>(ctx: &MelodyContext<'_>, rng: &mut R) -> Vec<NoteEvent> {
    let mut events = Vec::new();
    let mut current_pitch = ctx.root_pitch;
    let mut global_step = 0;

    for bar in 0..BARS_PER_PHRASE as usize {
        let is_last_bar = bar == BARS_PER_PHRASE as usize - 1;
        let (pool, bar_root) = ctx.pool_for_bar(bar);
        let mut index = pool.find_index(current_pitch);
        let mut step_in_bar = 0;

        for &duration in ctx.bar_patterns[bar] {
            let is_bar_start = step_in_bar == 0;
            let is_ending = is_last_bar && step_in_bar >= CADENCE_STEP;
            let is_rest = !is_bar_start && rng.gen::<f64>() < ctx.style.rest_prob;

            let picked = if is_rest {
                None
            } else {
                let mut next = if is_ending {
                    resolve_toward(&pool, index, ctx.root_pitch)
                } else {
                    next_index(&pool, index, ctx.style, ctx.tuning, rng)
                };
                if is_bar_start && rng.gen::<f64>() < ctx.tuning.bar_start_root_prob {
                    next = pool.find_index(bar_root);
                }
                pool.get(next).map(|c| (next, c.pitch))
            };

            match picked {
                Some((next, pitch)) => {
                    index = next;
                    current_pitch = pitch;
                    let mut velocity: u8 = rng.gen_range(70..100);
                    if is_bar_start {
                        velocity = (velocity + 15).min(127);
                    }
                    events.push(NoteEvent::note(
                        to_midi_byte(pitch),
                        velocity,
                        global_step,
                        duration,
                        false,
                    ));
                }
                None => events.push(NoteEvent::rest(global_step, duration, false)),
            }

            step_in_bar += duration;
            global_step += duration;
        }
    }
    events
}

/// Cadence movement: one pool step toward `target`, landing on it when adjacent.
pub fn resolve_toward(pool: &NotePool, current: usize, target: i32) -> usize {
    let target_index = pool.find_index(target) as isize;
    let current = current as isize;
    let diff = target_index - current;
    let next = if diff.abs() <= 1 {
        target_index
    } else {
        current + diff.signum()
    };
    pool.clamp_index(next)
}

/// Free movement: repeat, or an octave, leap, skip, or step with chord-tone gravity.
pub fn next_index<R: Rng>(
    pool: &NotePool,
    current: usize,
    style: &StyleProfile,
    tuning: &GeneratorTuning,
    rng: &mut R,
) -> usize {
    if rng.gen::<f64>() < style.repeat_prob {
        return current;
    }

    let roll: f64 = rng.gen();
    let direction: isize = if rng.gen::<f64>() < style.upward_probability() { 1 } else { -1 };
    let magnitude: isize = if roll < style.octave_prob {
        7
    } else if roll < style.octave_prob + style.leap_prob {
        rng.gen_range(3..=4)
    } else if roll < style.octave_prob + style.leap_prob + style.skip_prob {
        2
    } else {
        1
    };
    let mut next = current as isize + direction * magnitude;

    if rng.gen::<f64>() < style.chord_prob {
        if let Some(tone) = pool.nearest_chord_tone(next, tuning.gravity_radius) {
            next = tone as isize;
        }
    }

    pool.clamp_index(next)
}
