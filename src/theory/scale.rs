//! Scales, chord types, and diatonic chord maps.

use serde::{Deserialize, Serialize};

use super::TablesError;

/// A scale: ascending semitone intervals from the root, within one octave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    pub id: String,
    pub intervals: Vec<u8>,
}

impl Scale {
    /// Number of tones in the scale.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether the scale has no tones (never true for a validated scale).
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Scale degree of an interval (0-11), if the interval belongs to the scale.
    pub fn degree_of(&self, interval: u8) -> Option<usize> {
        self.intervals.iter().position(|&i| i == interval)
    }

    /// Whether `interval` (taken mod 12) is a member of the scale.
    pub fn contains(&self, interval: i32) -> bool {
        self.degree_of(interval.rem_euclid(12) as u8).is_some()
    }

    /// Check that intervals start at 0, are strictly ascending, and stay below 12.
    pub fn validate(&self) -> Result<(), TablesError> {
        let invalid = |reason: &str| TablesError::InvalidScale {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        match self.intervals.first() {
            None => return Err(invalid("no intervals")),
            Some(0) => {}
            Some(_) => return Err(invalid("first interval must be 0")),
        }
        if self.intervals.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid("intervals must be unique and ascending"));
        }
        if self.intervals.iter().any(|&i| i > 11) {
            return Err(invalid("intervals must lie within one octave"));
        }
        Ok(())
    }
}

/// A chord quality: intervals from the chord root plus a display symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordType {
    pub id: String,
    pub intervals: Vec<u8>,
    pub symbol: String,
}

impl ChordType {
    pub fn validate(&self) -> Result<(), TablesError> {
        if !(3..=4).contains(&self.intervals.len()) || self.intervals[0] != 0 {
            return Err(TablesError::InvalidChordType {
                id: self.id.clone(),
                reason: "chords need 3 or 4 tones starting at 0".to_string(),
            });
        }
        Ok(())
    }
}

/// One diatonic chord of a scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiatonicChord {
    pub degree: usize,
    pub chord_type: String,
    pub numeral: String,
}

/// The diatonic chords of one scale, indexed by degree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiatonicMap {
    pub scale: String,
    pub chords: Vec<DiatonicChord>,
}
