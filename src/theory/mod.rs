//! Music theory tables: scales, chords, progressions, rhythms and styles.
//!
//! The tables are read-only input to the phrase generator. The built-in set
//! can be replaced wholesale by a YAML file with the same shape.

pub mod builtin;
pub mod note;
pub mod rhythm;
pub mod scale;
pub mod style;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use note::{is_black_key, midi_of, note_label, pitch_class, pitch_class_name, NOTE_NAMES};
pub use rhythm::{BarLabel, BarStructure, RhythmLibrary, BARS_PER_PHRASE, STEPS_PER_BAR, TOTAL_STEPS};
pub use scale::{ChordType, DiatonicChord, DiatonicMap, Scale};
pub use style::{ProgressionTemplate, StyleProfile};

/// Id of the pseudo-progression that asks for a freshly synthesized one.
pub const RANDOM_PROGRESSION: &str = "random";

/// Progressions offered for scales that no template is tagged with.
const GENERIC_PROGRESSIONS: [&str; 2] = ["I-IV-V-I", "i-iv-V-i"];

/// Errors from loading or validating theory tables.
#[derive(Debug, Error)]
pub enum TablesError {
    #[error("scale '{id}': {reason}")]
    InvalidScale { id: String, reason: String },
    #[error("chord type '{id}': {reason}")]
    InvalidChordType { id: String, reason: String },
    #[error("rhythm library '{library}' pattern {index}: {reason}")]
    InvalidRhythm {
        library: String,
        index: usize,
        reason: String,
    },
    #[error("style '{id}': {reason}")]
    InvalidStyle { id: String, reason: String },
    #[error("diatonic map '{scale}': {reason}")]
    InvalidDiatonic { scale: String, reason: String },
    #[error("default diatonic map '{0}' is not defined")]
    MissingDefaultDiatonic(String),
    #[error("no bar structures defined")]
    NoBarStructures,
    #[error("tables file I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("tables file YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Every table the generator reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TheoryTables {
    pub scales: Vec<Scale>,
    pub chord_types: Vec<ChordType>,
    pub diatonic: Vec<DiatonicMap>,
    /// Scale whose diatonic map is used for scales without their own.
    pub default_diatonic: String,
    /// Scale-degree indices counted as chord tones in scale mode.
    pub chord_tone_degrees: Vec<usize>,
    pub progressions: Vec<ProgressionTemplate>,
    pub rhythms: Vec<RhythmLibrary>,
    pub bar_structures: Vec<BarStructure>,
    pub styles: Vec<StyleProfile>,
}

impl Default for TheoryTables {
    fn default() -> Self {
        builtin::tables()
    }
}

impl TheoryTables {
    /// Parse and validate tables from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TablesError> {
        let tables: TheoryTables = serde_yaml::from_str(yaml)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Load and validate tables from a YAML file.
    pub fn load(path: &Path) -> Result<Self, TablesError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn scale(&self, id: &str) -> Option<&Scale> {
        self.scales.iter().find(|s| s.id == id)
    }

    pub fn chord_type(&self, id: &str) -> Option<&ChordType> {
        self.chord_types.iter().find(|c| c.id == id)
    }

    pub fn style(&self, id: &str) -> Option<&StyleProfile> {
        self.styles.iter().find(|s| s.id == id)
    }

    pub fn rhythm(&self, id: &str) -> Option<&RhythmLibrary> {
        self.rhythms.iter().find(|r| r.id == id)
    }

    pub fn progression(&self, id: &str) -> Option<&ProgressionTemplate> {
        self.progressions.iter().find(|p| p.id == id)
    }

    /// Diatonic chords of a scale, or of the default scale when it has none.
    pub fn diatonic_chords(&self, scale_id: &str) -> &[DiatonicChord] {
        self.diatonic
            .iter()
            .find(|m| m.scale == scale_id)
            .or_else(|| self.diatonic.iter().find(|m| m.scale == self.default_diatonic))
            .map(|m| m.chords.as_slice())
            .unwrap_or(&[])
    }

    /// Templates selectable for a scale (not counting "random").
    ///
    /// Scales no template is tagged with get the generic major and minor
    /// cadences instead.
    pub fn progressions_for_scale(&self, scale_id: &str) -> Vec<&ProgressionTemplate> {
        let tagged: Vec<_> = self.progressions.iter().filter(|p| p.suits(scale_id)).collect();
        if !tagged.is_empty() {
            return tagged;
        }
        GENERIC_PROGRESSIONS
            .iter()
            .filter_map(|id| self.progression(id))
            .collect()
    }

    /// Whether scale degree `degree` is a chord tone in scale mode.
    pub fn is_chord_tone_degree(&self, degree: usize, scale_len: usize) -> bool {
        scale_len > 0 && self.chord_tone_degrees.contains(&(degree % scale_len))
    }

    /// Check every table invariant.
    pub fn validate(&self) -> Result<(), TablesError> {
        for scale in &self.scales {
            scale.validate()?;
        }
        for chord in &self.chord_types {
            chord.validate()?;
        }
        for lib in &self.rhythms {
            lib.validate()?;
        }
        for style in &self.styles {
            style.validate()?;
        }
        for map in &self.diatonic {
            if map.chords.is_empty() {
                return Err(TablesError::InvalidDiatonic {
                    scale: map.scale.clone(),
                    reason: "no chords".to_string(),
                });
            }
            for (i, chord) in map.chords.iter().enumerate() {
                if chord.degree != i {
                    return Err(TablesError::InvalidDiatonic {
                        scale: map.scale.clone(),
                        reason: format!("entry {i} has degree {}", chord.degree),
                    });
                }
                if self.chord_type(&chord.chord_type).is_none() {
                    return Err(TablesError::InvalidDiatonic {
                        scale: map.scale.clone(),
                        reason: format!("unknown chord type '{}'", chord.chord_type),
                    });
                }
            }
        }
        if !self.diatonic.iter().any(|m| m.scale == self.default_diatonic) {
            return Err(TablesError::MissingDefaultDiatonic(self.default_diatonic.clone()));
        }
        if self.bar_structures.is_empty() {
            return Err(TablesError::NoBarStructures);
        }
        Ok(())
    }
}
