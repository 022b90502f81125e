//! Rhythm patterns and bar structures.
//!
//! A rhythm pattern is a list of note durations in 16th-note steps that fills
//! exactly one bar. A bar structure assigns a pattern label to each of the
//! four bars of a phrase so that bars sharing a label share a rhythm.

use serde::{Deserialize, Serialize};

use super::TablesError;

/// Steps in one bar (16th notes in 4/4).
pub const STEPS_PER_BAR: u32 = 16;

/// Bars in one generated phrase.
pub const BARS_PER_PHRASE: u32 = 4;

/// Steps in one generated phrase.
pub const TOTAL_STEPS: u32 = STEPS_PER_BAR * BARS_PER_PHRASE;

/// A named group of one-bar rhythm patterns sharing a feel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhythmLibrary {
    pub id: String,
    pub patterns: Vec<Vec<u32>>,
}

impl RhythmLibrary {
    pub fn validate(&self) -> Result<(), TablesError> {
        if self.patterns.is_empty() {
            return Err(TablesError::InvalidRhythm {
                library: self.id.clone(),
                index: 0,
                reason: "library has no patterns".to_string(),
            });
        }
        for (index, pattern) in self.patterns.iter().enumerate() {
            if pattern.iter().any(|&d| d == 0) {
                return Err(TablesError::InvalidRhythm {
                    library: self.id.clone(),
                    index,
                    reason: "durations must be positive".to_string(),
                });
            }
            let sum: u32 = pattern.iter().sum();
            if sum != STEPS_PER_BAR {
                return Err(TablesError::InvalidRhythm {
                    library: self.id.clone(),
                    index,
                    reason: format!("durations sum to {sum}, expected {STEPS_PER_BAR}"),
                });
            }
        }
        Ok(())
    }
}

/// Label of a rhythm pattern slot within a bar structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BarLabel {
    A,
    B,
    C,
}

impl BarLabel {
    pub const ALL: [BarLabel; 3] = [BarLabel::A, BarLabel::B, BarLabel::C];

    pub fn index(self) -> usize {
        match self {
            BarLabel::A => 0,
            BarLabel::B => 1,
            BarLabel::C => 2,
        }
    }
}

/// Which labelled pattern plays in each of the four bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarStructure(pub [BarLabel; 4]);

impl BarStructure {
    /// Labels that appear in the structure, in A, B, C order.
    pub fn labels(&self) -> Vec<BarLabel> {
        BarLabel::ALL
            .into_iter()
            .filter(|l| self.0.contains(l))
            .collect()
    }

    pub fn label(&self, bar: usize) -> BarLabel {
        self.0[bar]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BarLabel::*;

    #[test]
    fn pattern_must_fill_bar() {
        let lib = RhythmLibrary {
            id: "x".to_string(),
            patterns: vec![vec![4, 4, 4, 4], vec![8, 4]],
        };
        let err = lib.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 12"));
    }

    #[test]
    fn zero_duration_rejected() {
        let lib = RhythmLibrary {
            id: "x".to_string(),
            patterns: vec![vec![0, 8, 8]],
        };
        assert!(lib.validate().is_err());
    }

    #[test]
    fn empty_library_rejected() {
        let lib = RhythmLibrary {
            id: "x".to_string(),
            patterns: vec![],
        };
        assert!(lib.validate().is_err());
    }

    #[test]
    fn structure_labels_in_order() {
        assert_eq!(BarStructure([A, B, C, A]).labels(), vec![A, B, C]);
        assert_eq!(BarStructure([A, A, A, B]).labels(), vec![A, B]);
        assert_eq!(BarStructure([A, B, B, A]).label(2), B);
    }

    #[test]
    fn total_steps_is_four_bars() {
        assert_eq!(TOTAL_STEPS, 64);
    }
}
