//! One sounding note: oscillator bank, amplitude envelope, enveloped
//! low-pass filter and output gain.

use super::envelope::Adsr;
use super::filter::{clamp_cutoff, LowPass, MAX_CUTOFF};
use super::lfo::{Lfo, LfoOffset};
use super::oscillator::{cents_to_ratio, midi_to_freq, Phasor};
use super::param::ParamTimeline;
use super::patch::{Patch, PatchType};
use super::timer::TimerHandle;

/// Frames between filter and LFO updates.
pub const CONTROL_BLOCK: usize = 32;

/// Cutoff shift per semitone from middle C at full key tracking.
const KEY_TRACK_HZ_PER_SEMITONE: f32 = 50.0;

struct VoiceOscillator {
    phasor: Phasor,
    freq: f64,
    level: f32,
}

pub struct Voice {
    id: u64,
    patch_type: PatchType,
    pitch: u8,
    oscillators: Vec<VoiceOscillator>,
    gain: ParamTimeline,
    cutoff: ParamTimeline,
    filter: LowPass,
    lfo: Option<Lfo>,
    output_gain: f32,
    amp_env: Adsr,
    base_cutoff: f32,
    released: bool,
    pub(crate) timer: Option<TimerHandle>,
}

impl Voice {
    /// Build the signal chain for `pitch` from `patch` and schedule its
    /// attack and decay from `now` (engine seconds).
    pub fn start(
        id: u64,
        patch_type: PatchType,
        pitch: u8,
        velocity: u8,
        patch: &Patch,
        now: f64,
        sample_rate: f64,
    ) -> Self {
        let base_freq = midi_to_freq(pitch as f64);
        let oscillators = patch
            .oscillators()
            .into_iter()
            .filter(|slot| slot.enabled)
            .map(|slot| VoiceOscillator {
                phasor: Phasor::new(slot.waveform),
                freq: base_freq * 2.0f64.powi(slot.octave) * cents_to_ratio(slot.detune as f64),
                level: slot.level,
            })
            .collect();

        let base_cutoff = key_tracked_cutoff(patch, pitch);
        let peak = (base_cutoff + patch.filter.env_amount).min(MAX_CUTOFF);
        let mut cutoff = ParamTimeline::new(base_cutoff);
        patch.filter_env.trigger_between(&mut cutoff, now, base_cutoff, peak);

        let mut gain = ParamTimeline::new(0.0);
        patch.amp_env.trigger(&mut gain, now);

        Self {
            id,
            patch_type,
            pitch,
            oscillators,
            gain,
            cutoff,
            filter: LowPass::new(sample_rate as f32, base_cutoff, patch.filter.resonance),
            lfo: Lfo::from_settings(&patch.lfo),
            output_gain: patch.volume * velocity as f32 / 127.0,
            amp_env: patch.amp_env,
            base_cutoff,
            released: false,
            timer: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn patch_type(&self) -> PatchType {
        self.patch_type
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn oscillator_count(&self) -> usize {
        self.oscillators.len()
    }

    /// Envelope gain at `time`.
    pub fn gain_at(&self, time: f64) -> f32 {
        self.gain.value_at(time)
    }

    /// Enveloped cutoff at `time`, before LFO.
    pub fn cutoff_at(&self, time: f64) -> f32 {
        self.cutoff.value_at(time)
    }

    pub fn base_cutoff(&self) -> f32 {
        self.base_cutoff
    }

    pub fn output_gain(&self) -> f32 {
        self.output_gain
    }

    /// Ramp gain to silence and the cutoff back to its base, both over the
    /// amp release captured at note-on. Returns the delay in ms until the
    /// tail is done.
    pub fn release(&mut self, now: f64) -> u64 {
        self.amp_env.release_to(&mut self.gain, now, 0.0);
        self.amp_env.release_to(&mut self.cutoff, now, self.base_cutoff);
        self.released = true;
        self.amp_env.teardown_delay_ms()
    }

    /// Add this voice's output for `out.len()` frames starting at `start`.
    pub fn render_add(&mut self, out: &mut [f32], start: f64, sample_rate: f64) {
        let dt = 1.0 / sample_rate;
        let mut t = start;
        for block in out.chunks_mut(CONTROL_BLOCK) {
            let offset = match self.lfo.as_mut() {
                Some(lfo) => lfo.advance(block.len(), sample_rate),
                None => LfoOffset::default(),
            };
            let cutoff = clamp_cutoff(self.cutoff.value_at(t) + offset.cutoff_hz, sample_rate as f32);
            let q = self.filter.q();
            self.filter.set_params(cutoff, q);
            let ratio = cents_to_ratio(offset.cents as f64);

            for sample in block.iter_mut() {
                let mut sum = 0.0f32;
                for osc in &mut self.oscillators {
                    sum += osc.phasor.next(osc.freq * ratio, sample_rate) as f32 * osc.level;
                }
                let enveloped = sum * self.gain.value_at(t);
                *sample += self.filter.run(enveloped) * self.output_gain;
                t += dt;
            }
        }
    }
}

/// The filter's resting cutoff for `pitch`: the patch cutoff shifted by key tracking.
pub fn key_tracked_cutoff(patch: &Patch, pitch: u8) -> f32 {
    let shift = (pitch as f32 - 60.0) * KEY_TRACK_HZ_PER_SEMITONE * patch.filter.key_track;
    (patch.filter.cutoff + shift).clamp(20.0, MAX_CUTOFF)
}
