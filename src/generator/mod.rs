//! Phrase generator: four-bar melodies and bass lines from theory tables.
//!
//! Generation picks a chord progression (optional), a bar structure with one
//! rhythm pattern per label, then walks each bar's note pool. Unknown ids in
//! the settings fall back to defaults with a warning; generation itself never
//! fails.

pub mod bass;
pub mod event;
pub mod harmony;
pub mod melody;
pub mod pool;
pub mod settings;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};

use crate::theory::{midi_of, pitch_class, BarLabel, BarStructure, TheoryTables};

pub use event::{bass_span, melody_span, NoteEvent};
pub use harmony::ChordInstance;
pub use settings::{GenerationSettings, GeneratorTuning, OCTAVE_RANGE};

const FALLBACK_SCALE: &str = "Minor";
const FALLBACK_STYLE: &str = "lead";
const BASS_RHYTHM: &str = "sparse";
const QUARTER_NOTES: [u32; 4] = [4, 4, 4, 4];

/// MIDI pitch of the settings' root, falling back to C for unknown names.
pub fn root_pitch(settings: &GenerationSettings) -> i32 {
    let pc = pitch_class(&settings.root).unwrap_or_else(|| {
        warn!(root = %settings.root, "unknown root note, using C");
        0
    });
    midi_of(pc, settings.clamped_octave())
}

/// Generates phrases and remembers the last chord progression.
pub struct PhraseGenerator {
    tables: TheoryTables,
    tuning: GeneratorTuning,
    rng: ChaCha8Rng,
    last_progression: Option<Vec<ChordInstance>>,
}

impl PhraseGenerator {
    /// A generator seeded from OS entropy.
    pub fn new(tables: TheoryTables) -> Self {
        Self::with_rng(tables, ChaCha8Rng::from_entropy())
    }

    /// A deterministic generator.
    pub fn with_seed(tables: TheoryTables, seed: u64) -> Self {
        Self::with_rng(tables, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(tables: TheoryTables, rng: ChaCha8Rng) -> Self {
        Self {
            tables,
            tuning: GeneratorTuning::default(),
            rng,
            last_progression: None,
        }
    }

    pub fn with_tuning(mut self, tuning: GeneratorTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn tables(&self) -> &TheoryTables {
        &self.tables
    }

    pub fn tuning(&self) -> &GeneratorTuning {
        &self.tuning
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// The progression of the most recent `generate`, or `None` if harmony was off.
    pub fn last_progression(&self) -> Option<&[ChordInstance]> {
        self.last_progression.as_deref()
    }

    /// Generate one phrase: melody events, then bass events when enabled.
    pub fn generate(&mut self, settings: &GenerationSettings) -> Vec<NoteEvent> {
        let tables = &self.tables;
        let rng = &mut self.rng;
        self.last_progression = None;

        let octave = settings.clamped_octave();
        if octave != settings.octave {
            warn!(octave = settings.octave, using = octave, "octave out of range");
        }
        let root = root_pitch(settings);
        let Some((scale_id, scale)) = lookup_or_fallback(&settings.scale, FALLBACK_SCALE, "scale", |id| {
            tables.scale(id).map(|s| (s.id.as_str(), s))
        })
        .or_else(|| tables.scales.first().map(|s| (s.id.as_str(), s))) else {
            error!("theory tables define no scales");
            return Vec::new();
        };
        let Some(style) = lookup_or_fallback(&settings.style, FALLBACK_STYLE, "style", |id| tables.style(id))
            .or_else(|| tables.styles.first())
        else {
            error!("theory tables define no styles");
            return Vec::new();
        };
        let library = tables
            .rhythm(&settings.rhythm)
            .or_else(|| {
                warn!(rhythm = %settings.rhythm, preferred = %style.pref_rhythm, "unknown rhythm, using style's");
                tables.rhythm(&style.pref_rhythm)
            })
            .or_else(|| tables.rhythms.first());
        let melody_patterns: &[Vec<u32>] = library.map(|l| l.patterns.as_slice()).unwrap_or(&[]);

        let progression = settings.use_chords.then(|| {
            let degrees = harmony::resolve_degrees(tables, scale_id, &settings.progression, &self.tuning, rng);
            harmony::build_progression(tables, scale_id, scale, root, degrees)
        });

        let structure = pick_structure(tables, rng);
        let ctx = melody::MelodyContext {
            tables,
            scale,
            style,
            tuning: &self.tuning,
            root_pitch: root,
            progression: progression.as_deref(),
            bar_patterns: bar_patterns(&structure, melody_patterns, rng),
        };
        let mut events = melody::generate(&ctx, rng);

        if settings.use_bass {
            let bass = match progression.as_deref() {
                Some(chords) => bass::chord_bass(chords, octave),
                None => {
                    let bass_patterns: &[Vec<u32>] =
                        tables.rhythm(BASS_RHYTHM).map(|l| l.patterns.as_slice()).unwrap_or(&[]);
                    let structure = pick_structure(tables, rng);
                    let patterns = bar_patterns(&structure, bass_patterns, rng);
                    bass::scale_bass(tables, scale, root, octave, patterns, &self.tuning, rng)
                }
            };
            events.extend(bass);
        }

        info!(events = events.len(), "generated phrase");
        if let Some(chords) = &progression {
            let names: Vec<_> = chords.iter().map(|c| c.display_name.as_str()).collect();
            info!(progression = %names.join(" - "), "chord progression");
        }
        self.last_progression = progression;
        events
    }
}

fn lookup_or_fallback<T>(
    id: &str,
    fallback: &str,
    kind: &str,
    lookup: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    lookup(id).or_else(|| {
        warn!(id, fallback, "unknown {kind}");
        lookup(fallback)
    })
}

fn pick_structure<R: Rng>(tables: &TheoryTables, rng: &mut R) -> BarStructure {
    tables
        .bar_structures
        .choose(rng)
        .copied()
        .unwrap_or(BarStructure([BarLabel::A; 4]))
}

/// One pattern per label used by `structure`, expanded to the four bars.
fn bar_patterns<'a, R: Rng>(structure: &BarStructure, patterns: &'a [Vec<u32>], rng: &mut R) -> [&'a [u32]; 4] {
    let fallback: &'a [u32] = &QUARTER_NOTES;
    let mut chosen = [fallback; 3];
    for label in structure.labels() {
        if let Some(p) = patterns.choose(rng) {
            chosen[label.index()] = p.as_slice();
        }
    }
    structure.0.map(|label| chosen[label.index()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u64) -> PhraseGenerator {
        PhraseGenerator::with_seed(TheoryTables::default(), seed)
    }

    #[test]
    fn same_seed_same_phrase() {
        let settings = GenerationSettings::default();
        let a = generator(42).generate(&settings);
        let b = generator(42).generate(&settings);
        assert_eq!(a, b);
    }

    #[test]
    fn melody_covers_sixty_four_steps() {
        let mut gen = generator(1);
        for style in ["arpeggio", "driving", "lead", "nightdrive", "pulse", "soaring", "mysterious", "aggressive", "dreamy", "bassline"] {
            let settings = GenerationSettings {
                style: style.to_string(),
                rhythm: "unknown".to_string(),
                ..Default::default()
            };
            let events = gen.generate(&settings);
            assert_eq!(melody_span(&events), 64, "{style}");
            assert_eq!(bass_span(&events), 0);
        }
    }

    #[test]
    fn events_are_contiguous() {
        let mut gen = generator(2);
        let events = gen.generate(&GenerationSettings::default());
        let mut step = 0;
        for e in &events {
            assert_eq!(e.start_step, step);
            step += e.duration_steps;
        }
    }

    #[test]
    fn bass_follows_melody_in_order() {
        let mut gen = generator(3);
        let settings = GenerationSettings {
            use_bass: true,
            ..Default::default()
        };
        let events = gen.generate(&settings);
        let first_bass = events.iter().position(|e| e.is_bass).unwrap();
        assert!(events[first_bass..].iter().all(|e| e.is_bass));
        assert_eq!(bass_span(&events), 64);
    }

    #[test]
    fn harmony_off_clears_last_progression() {
        let mut gen = generator(4);
        let on = GenerationSettings {
            use_chords: true,
            ..Default::default()
        };
        gen.generate(&on);
        assert_eq!(gen.last_progression().map(|p| p.len()), Some(4));
        gen.generate(&GenerationSettings::default());
        assert!(gen.last_progression().is_none());
    }

    #[test]
    fn unknown_ids_fall_back() {
        let mut gen = generator(5);
        let settings = GenerationSettings {
            root: "H".to_string(),
            scale: "Klingon".to_string(),
            style: "polka".to_string(),
            rhythm: "waltz".to_string(),
            ..Default::default()
        };
        let events = gen.generate(&settings);
        assert_eq!(melody_span(&events), 64);
        let minor = [0, 2, 3, 5, 7, 8, 10];
        for p in events.iter().filter_map(|e| e.pitch) {
            assert!(minor.contains(&((p as i32 - 60).rem_euclid(12))));
        }
    }

    #[test]
    fn chord_mode_bass_is_one_note_per_bar() {
        let mut gen = generator(6);
        let settings = GenerationSettings {
            use_chords: true,
            use_bass: true,
            progression: "i-VI-III-VII".to_string(),
            ..Default::default()
        };
        let events = gen.generate(&settings);
        let bass: Vec<_> = events.iter().filter(|e| e.is_bass).collect();
        assert_eq!(bass.len(), 4);
        let chords = gen.last_progression().unwrap();
        for (b, c) in bass.iter().zip(chords) {
            assert_eq!(b.pitch.unwrap() as i32 % 12, c.root_pitch % 12);
        }
    }

    #[test]
    fn shared_labels_share_patterns() {
        let t = TheoryTables::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let lib = t.rhythm("mixed").unwrap();
        let structure = BarStructure([BarLabel::A, BarLabel::B, BarLabel::B, BarLabel::A]);
        for _ in 0..20 {
            let bars = bar_patterns(&structure, &lib.patterns, &mut rng);
            assert_eq!(bars[0], bars[3]);
            assert_eq!(bars[1], bars[2]);
        }
    }

    #[test]
    fn empty_library_uses_quarter_notes() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let bars = bar_patterns(&BarStructure([BarLabel::A; 4]), &[], &mut rng);
        assert!(bars.iter().all(|b| *b == QUARTER_NOTES));
    }
}
