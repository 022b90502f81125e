//! Patches: typed instrument configuration for the melody and bass voices.
//!
//! The engine reads patches as plain data and never validates them. Values
//! coming from an editing surface or a config file go through
//! [`Patch::validated`], which clamps each field into the editor's range.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::envelope::Adsr;
use super::oscillator::Waveform;

/// Patch validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("patch field `{0}` is not a finite number")]
    NotFinite(&'static str),
}

/// Which of the two instrument slots a patch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchType {
    Melody,
    Bass,
}

impl PatchType {
    pub const ALL: [PatchType; 2] = [PatchType::Melody, PatchType::Bass];
}

impl fmt::Display for PatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchType::Melody => write!(f, "melody"),
            PatchType::Bass => write!(f, "bass"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorSlot {
    pub enabled: bool,
    pub waveform: Waveform,
    /// Octave offset from the note's pitch.
    pub octave: i32,
    /// Detune in cents.
    pub detune: f32,
    pub level: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Base cutoff in Hz.
    pub cutoff: f32,
    /// Resonance as a biquad Q.
    pub resonance: f32,
    /// Hz added to the cutoff at the filter envelope's peak.
    pub env_amount: f32,
    /// 0 = fixed cutoff, 1 = +50 Hz per semitone above middle C.
    pub key_track: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LfoDestination {
    Pitch,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LfoSettings {
    pub rate: f32,
    pub waveform: Waveform,
    pub destination: LfoDestination,
    /// 0 disables the LFO.
    pub amount: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbSend {
    pub wet: f32,
    /// Impulse length in seconds, also the decay exponent.
    pub decay: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelaySend {
    /// Delay time in seconds.
    pub time: f32,
    pub feedback: f32,
    pub wet: f32,
}

/// A complete instrument configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub name: String,
    pub osc1: OscillatorSlot,
    pub osc2: OscillatorSlot,
    pub osc3: OscillatorSlot,
    pub filter: FilterSettings,
    pub amp_env: Adsr,
    pub filter_env: Adsr,
    pub lfo: LfoSettings,
    pub reverb: ReverbSend,
    pub delay: DelaySend,
    pub volume: f32,
}

impl Patch {
    /// The default lead patch.
    pub fn init_synth() -> Self {
        Self {
            name: "Init Synth".to_string(),
            osc1: OscillatorSlot {
                enabled: true,
                waveform: Waveform::Sawtooth,
                octave: 0,
                detune: 0.0,
                level: 0.7,
            },
            osc2: OscillatorSlot {
                enabled: true,
                waveform: Waveform::Sawtooth,
                octave: 0,
                detune: 7.0,
                level: 0.5,
            },
            osc3: OscillatorSlot {
                enabled: false,
                waveform: Waveform::Square,
                octave: -1,
                detune: 0.0,
                level: 0.3,
            },
            filter: FilterSettings {
                cutoff: 2000.0,
                resonance: 2.0,
                env_amount: 3000.0,
                key_track: 0.5,
            },
            amp_env: Adsr {
                attack: 0.01,
                decay: 0.2,
                sustain: 0.7,
                release: 0.3,
            },
            filter_env: Adsr {
                attack: 0.01,
                decay: 0.3,
                sustain: 0.3,
                release: 0.5,
            },
            lfo: LfoSettings {
                rate: 5.0,
                waveform: Waveform::Sine,
                destination: LfoDestination::Filter,
                amount: 0.0,
            },
            reverb: ReverbSend { wet: 0.2, decay: 2.0 },
            delay: DelaySend {
                time: 0.3,
                feedback: 0.3,
                wet: 0.2,
            },
            volume: 0.7,
        }
    }

    /// The default bass patch: the lead patch dropped an octave, darker and tighter.
    pub fn init_bass() -> Self {
        let mut patch = Self::init_synth();
        patch.name = "Init Bass".to_string();
        patch.osc1.octave = -1;
        patch.osc2.octave = -1;
        patch.osc3.octave = -2;
        patch.filter.cutoff = 800.0;
        patch.filter.env_amount = 1500.0;
        patch.amp_env.attack = 0.005;
        patch.amp_env.decay = 0.1;
        patch.amp_env.sustain = 0.8;
        patch.reverb.wet = 0.1;
        patch
    }

    pub fn default_for(patch_type: PatchType) -> Self {
        match patch_type {
            PatchType::Melody => Self::init_synth(),
            PatchType::Bass => Self::init_bass(),
        }
    }

    /// Restore the default for `patch_type`.
    pub fn reset(&mut self, patch_type: PatchType) {
        *self = Self::default_for(patch_type);
    }

    pub fn oscillators(&self) -> [&OscillatorSlot; 3] {
        [&self.osc1, &self.osc2, &self.osc3]
    }

    /// Clamp every field into its editable range.
    ///
    /// Returns the clamped patch and the names of the fields that changed.
    /// Non-finite values are rejected rather than clamped.
    pub fn validated(mut self) -> Result<(Self, Vec<&'static str>), PatchError> {
        let mut changed = Vec::new();
        {
            let mut c = Clamp { changed: &mut changed };
            for (slot, [octave, detune, level]) in [
                (&mut self.osc1, ["osc1.octave", "osc1.detune", "osc1.level"]),
                (&mut self.osc2, ["osc2.octave", "osc2.detune", "osc2.level"]),
                (&mut self.osc3, ["osc3.octave", "osc3.detune", "osc3.level"]),
            ] {
                c.int(octave, &mut slot.octave, -2, 2);
                c.float(detune, &mut slot.detune, -50.0, 50.0)?;
                c.float(level, &mut slot.level, 0.0, 1.0)?;
            }

            c.float("filter.cutoff", &mut self.filter.cutoff, 20.0, 20000.0)?;
            c.float("filter.resonance", &mut self.filter.resonance, 0.1, 20.0)?;
            c.float("filter.env_amount", &mut self.filter.env_amount, 0.0, 8000.0)?;
            c.float("filter.key_track", &mut self.filter.key_track, 0.0, 1.0)?;

            for (env, [a, d, s, r]) in [
                (
                    &mut self.amp_env,
                    ["amp_env.attack", "amp_env.decay", "amp_env.sustain", "amp_env.release"],
                ),
                (
                    &mut self.filter_env,
                    ["filter_env.attack", "filter_env.decay", "filter_env.sustain", "filter_env.release"],
                ),
            ] {
                c.float(a, &mut env.attack, 0.001, 10.0)?;
                c.float(d, &mut env.decay, 0.001, 10.0)?;
                c.float(s, &mut env.sustain, 0.0, 1.0)?;
                c.float(r, &mut env.release, 0.001, 10.0)?;
            }

            c.float("lfo.rate", &mut self.lfo.rate, 0.1, 20.0)?;
            c.float("lfo.amount", &mut self.lfo.amount, 0.0, 100.0)?;
            c.float("reverb.wet", &mut self.reverb.wet, 0.0, 1.0)?;
            c.float("reverb.decay", &mut self.reverb.decay, 0.1, 10.0)?;
            c.float("delay.time", &mut self.delay.time, 0.01, 2.0)?;
            c.float("delay.feedback", &mut self.delay.feedback, 0.0, 0.95)?;
            c.float("delay.wet", &mut self.delay.wet, 0.0, 1.0)?;
            c.float("volume", &mut self.volume, 0.0, 1.0)?;
        }
        Ok((self, changed))
    }
}

struct Clamp<'a> {
    changed: &'a mut Vec<&'static str>,
}

impl Clamp<'_> {
    fn float(&mut self, name: &'static str, value: &mut f32, min: f32, max: f32) -> Result<(), PatchError> {
        if !value.is_finite() {
            return Err(PatchError::NotFinite(name));
        }
        let clamped = value.clamp(min, max);
        if clamped != *value {
            *value = clamped;
            self.changed.push(name);
        }
        Ok(())
    }

    fn int(&mut self, name: &'static str, value: &mut i32, min: i32, max: i32) {
        let clamped = (*value).clamp(min, max);
        if clamped != *value {
            *value = clamped;
            self.changed.push(name);
        }
    }
}

/// The melody and bass patches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchBank {
    pub melody: Patch,
    pub bass: Patch,
}

impl PatchBank {
    pub fn get(&self, patch_type: PatchType) -> &Patch {
        match patch_type {
            PatchType::Melody => &self.melody,
            PatchType::Bass => &self.bass,
        }
    }

    pub fn get_mut(&mut self, patch_type: PatchType) -> &mut Patch {
        match patch_type {
            PatchType::Melody => &mut self.melody,
            PatchType::Bass => &mut self.bass,
        }
    }
}

impl Default for PatchBank {
    fn default() -> Self {
        Self {
            melody: Patch::init_synth(),
            bass: Patch::init_bass(),
        }
    }
}
