//! Melody style profiles and chord-progression templates.

use serde::{Deserialize, Serialize};

use super::TablesError;

/// Probabilities and range that shape the melodic walk.
///
/// Movement classes are rolled against cumulative thresholds
/// `octave_prob`, `+ leap_prob`, `+ skip_prob`; the remainder is stepwise.
/// `step_prob` is informational and not consulted by the walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub chord_prob: f64,
    pub step_prob: f64,
    pub skip_prob: f64,
    pub leap_prob: f64,
    pub octave_prob: f64,
    pub rest_prob: f64,
    pub repeat_prob: f64,
    /// Direction bias in [-1, 1]; positive favours upward motion.
    pub dir_bias: f64,
    /// Melodic range in semitones, centred on the phrase root.
    pub range: u32,
    /// Rhythm library this style is designed around.
    pub pref_rhythm: String,
}

impl StyleProfile {
    /// Probability that a movement goes upward.
    pub fn upward_probability(&self) -> f64 {
        0.5 + self.dir_bias * 0.3
    }

    pub fn validate(&self) -> Result<(), TablesError> {
        let invalid = |reason: String| TablesError::InvalidStyle {
            id: self.id.clone(),
            reason,
        };
        let probs = [
            ("chord_prob", self.chord_prob),
            ("step_prob", self.step_prob),
            ("skip_prob", self.skip_prob),
            ("leap_prob", self.leap_prob),
            ("octave_prob", self.octave_prob),
            ("rest_prob", self.rest_prob),
            ("repeat_prob", self.repeat_prob),
        ];
        for (field, p) in probs {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!("{field} = {p} is not a probability")));
            }
        }
        if self.octave_prob + self.leap_prob + self.skip_prob > 1.0 {
            return Err(invalid("octave + leap + skip probabilities exceed 1".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.dir_bias) {
            return Err(invalid(format!("dir_bias {} outside [-1, 1]", self.dir_bias)));
        }
        Ok(())
    }
}

/// A named four-chord progression, as scale degrees, tagged with the scales it suits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionTemplate {
    pub id: String,
    pub name: String,
    pub degrees: [usize; 4],
    pub scales: Vec<String>,
}

impl ProgressionTemplate {
    pub fn suits(&self, scale_id: &str) -> bool {
        self.scales.iter().any(|s| s == scale_id)
    }
}
