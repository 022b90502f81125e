//! Generation settings and the tunable constants of the melodic walk.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::theory::RANDOM_PROGRESSION;

/// Octaves whose melody and bass pitches stay inside the MIDI note range.
pub const OCTAVE_RANGE: RangeInclusive<i32> = 2..=7;

/// User-facing settings for one phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Root pitch-class name, e.g. `"C"` or `"Eb"`.
    pub root: String,
    /// Octave of the root; octave 4 holds middle C.
    pub octave: i32,
    pub scale: String,
    pub style: String,
    /// Rhythm library id. Unknown ids fall back to the style's preferred library.
    pub rhythm: String,
    /// Tempo in BPM. Only the sequencer reads it.
    pub tempo: f64,
    /// Melody MIDI channel, 1-16.
    pub channel: u8,
    pub use_chords: bool,
    /// Progression template id, or `"random"`.
    pub progression: String,
    pub use_bass: bool,
    /// Bass MIDI channel, 1-16. `None` means the melody channel.
    pub bass_channel: Option<u8>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            root: "C".to_string(),
            octave: 4,
            scale: "Minor".to_string(),
            style: "lead".to_string(),
            rhythm: "syncopated".to_string(),
            tempo: 110.0,
            channel: 1,
            use_chords: false,
            progression: RANDOM_PROGRESSION.to_string(),
            use_bass: false,
            bass_channel: None,
        }
    }
}

impl GenerationSettings {
    /// The octave, clamped into [`OCTAVE_RANGE`].
    pub fn clamped_octave(&self) -> i32 {
        self.octave.clamp(*OCTAVE_RANGE.start(), *OCTAVE_RANGE.end())
    }

    /// The channel bass notes go out on.
    pub fn effective_bass_channel(&self) -> u8 {
        self.bass_channel.unwrap_or(self.channel)
    }
}

/// Constants of the walk that have no musical derivation, exposed for tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorTuning {
    /// Max index distance for chord-tone gravity to snap.
    pub gravity_radius: usize,
    /// Probability a bar's first note is forced onto the bar root.
    pub bar_start_root_prob: f64,
    /// Probability a synthesized progression ends on the tonic rather than the dominant.
    pub tonic_ending_prob: f64,
    /// Probability the bass jumps to its root on bar starts and in the cadence.
    pub bass_root_target_prob: f64,
    /// Probability the bass holds its note instead of stepping.
    pub bass_hold_prob: f64,
    /// Probability the bass snaps to an adjacent chord tone.
    pub bass_snap_prob: f64,
    /// Probability of an off-beat bass rest.
    pub bass_rest_prob: f64,
}

impl Default for GeneratorTuning {
    fn default() -> Self {
        Self {
            gravity_radius: 2,
            bar_start_root_prob: 0.6,
            tonic_ending_prob: 0.7,
            bass_root_target_prob: 0.7,
            bass_hold_prob: 0.4,
            bass_snap_prob: 0.6,
            bass_rest_prob: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bass_channel_defaults_to_melody_channel() {
        let mut s = GenerationSettings {
            channel: 3,
            ..Default::default()
        };
        assert_eq!(s.effective_bass_channel(), 3);
        s.bass_channel = Some(10);
        assert_eq!(s.effective_bass_channel(), 10);
    }

    #[test]
    fn octave_clamps_to_midi_safe_range() {
        let mut s = GenerationSettings::default();
        assert_eq!(s.clamped_octave(), 4);
        s.octave = -1;
        assert_eq!(s.clamped_octave(), 2);
        s.octave = 9;
        assert_eq!(s.clamped_octave(), 7);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let s: GenerationSettings = serde_yaml::from_str("root: A\noctave: 3\nuse_chords: true\n").unwrap();
        assert_eq!(s.root, "A");
        assert_eq!(s.octave, 3);
        assert!(s.use_chords);
        assert_eq!(s.scale, "Minor");
        assert_eq!(s.progression, "random");
    }
}
