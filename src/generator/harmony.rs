//! Chord progressions: resolving a template or synthesizing one, and
//! materializing each bar's chord.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::theory::{Scale, TheoryTables, NOTE_NAMES, RANDOM_PROGRESSION};

use super::settings::GeneratorTuning;

/// The chord sounding in one bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordInstance {
    pub bar: u32,
    pub degree: usize,
    pub numeral: String,
    pub chord_type: String,
    pub root_pitch: i32,
    pub tones: Vec<i32>,
    pub display_name: String,
}

impl ChordInstance {
    /// Label such as `"Am"` or `"Bb°"`: the root's pitch-class name plus the type symbol.
    pub fn display_name_for(root_pitch: i32, symbol: &str) -> String {
        format!("{}{}", NOTE_NAMES[root_pitch.rem_euclid(12) as usize], symbol)
    }
}

/// Four scale degrees: a named template valid for `scale_id`, or a fresh random one.
///
/// Template ids not offered for the scale are treated like `"random"`.
pub fn resolve_degrees<R: Rng>(
    tables: &TheoryTables,
    scale_id: &str,
    progression_id: &str,
    tuning: &GeneratorTuning,
    rng: &mut R,
) -> [usize; 4] {
    if progression_id != RANDOM_PROGRESSION {
        if let Some(template) = tables
            .progressions_for_scale(scale_id)
            .into_iter()
            .find(|p| p.id == progression_id)
        {
            return template.degrees;
        }
        warn!(progression = progression_id, scale = scale_id, "progression not available, using random");
    }
    random_degrees(tuning, rng)
}

/// Tonic, two free degrees, then tonic or dominant.
pub fn random_degrees<R: Rng>(tuning: &GeneratorTuning, rng: &mut R) -> [usize; 4] {
    let second = rng.gen_range(0..7);
    let third = rng.gen_range(0..7);
    let last = if rng.gen::<f64>() < tuning.tonic_ending_prob { 0 } else { 4 };
    [0, second, third, last]
}

/// Build the four chords for `degrees` over `root_pitch` in `scale`.
pub fn build_progression(
    tables: &TheoryTables,
    scale_id: &str,
    scale: &Scale,
    root_pitch: i32,
    degrees: [usize; 4],
) -> Vec<ChordInstance> {
    let diatonic = tables.diatonic_chords(scale_id);
    let fallback_type = tables.chord_type("min");

    degrees
        .iter()
        .enumerate()
        .map(|(bar, &raw_degree)| {
            let degree = if diatonic.is_empty() { 0 } else { raw_degree % diatonic.len() };
            let (type_id, numeral) = diatonic
                .get(degree)
                .or_else(|| diatonic.first())
                .map(|c| (c.chord_type.as_str(), c.numeral.as_str()))
                .unwrap_or(("min", "i"));

            let chord_root = root_pitch + scale.intervals.get(degree).copied().unwrap_or(0) as i32;
            let (chord_type, intervals, symbol) = match tables.chord_type(type_id).or(fallback_type) {
                Some(ct) => (ct.id.clone(), ct.intervals.clone(), ct.symbol.as_str()),
                None => ("min".to_string(), vec![0, 3, 7], "m"),
            };
            let display_name = ChordInstance::display_name_for(chord_root, symbol);

            ChordInstance {
                bar: bar as u32,
                degree,
                numeral: numeral.to_string(),
                chord_type,
                root_pitch: chord_root,
                tones: intervals.iter().map(|&i| chord_root + i as i32).collect(),
                display_name,
            }
        })
        .collect()
}
