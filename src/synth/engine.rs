//! The polyphonic synth engine.
//!
//! The engine owns the active-voice registry, the voice timers and the
//! effects bus, and keeps its own clock in rendered frames. Every change to
//! what is sounding goes through the registry: note-on, note-off, timed
//! release, cleanup and panic. Timers carry the identity of the voice they
//! were set for, so a timer that outlives its voice does nothing.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::effects::{EffectSends, EffectsBus};
use super::patch::{Patch, PatchBank, PatchType};
use super::timer::TimerQueue;
use super::voice::Voice;

/// Longest stretch rendered without checking timers.
const MAX_RENDER_BLOCK: usize = 64;
const REVERB_SEED: u64 = 0x5eed;

/// Registry key of an active voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceKey {
    /// A sustained note, replaced by the next note-on of the same pitch.
    Held { patch: PatchType, pitch: u8 },
    /// A self-releasing note; `id` keeps overlapping notes apart.
    Timed { patch: PatchType, pitch: u8, id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum VoiceTimer {
    Release { key: VoiceKey, voice: u64 },
    Cleanup { key: VoiceKey, voice: u64 },
}

pub struct SynthEngine {
    sample_rate: u32,
    frame: u64,
    patches: PatchBank,
    voices: HashMap<VoiceKey, Voice>,
    timers: TimerQueue<VoiceTimer>,
    bus: EffectsBus,
    next_voice_id: u64,
    next_note_id: u64,
    mix: Vec<f32>,
}

impl SynthEngine {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_patches(sample_rate, PatchBank::default())
    }

    pub fn with_patches(sample_rate: u32, patches: PatchBank) -> Self {
        let sends = EffectSends {
            reverb: patches.melody.reverb,
            delay: patches.melody.delay,
        };
        Self {
            sample_rate,
            frame: 0,
            bus: EffectsBus::new(sample_rate as f32, sends, REVERB_SEED),
            patches,
            voices: HashMap::new(),
            timers: TimerQueue::new(),
            next_voice_id: 0,
            next_note_id: 0,
            mix: vec![0.0; MAX_RENDER_BLOCK],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Engine time in seconds.
    pub fn now(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn ms_to_frames(&self, ms: f64) -> u64 {
        ms_to_frames(self.sample_rate, ms)
    }

    pub fn patch(&self, patch_type: PatchType) -> &Patch {
        self.patches.get(patch_type)
    }

    pub fn patches(&self) -> &PatchBank {
        &self.patches
    }

    /// Replace a patch. New voices pick it up at note-on; the shared effect
    /// sends change immediately.
    pub fn set_patch(&mut self, patch_type: PatchType, patch: Patch) {
        debug!(%patch_type, name = %patch.name, "patch changed");
        self.bus.set_sends(patch.reverb, patch.delay);
        *self.patches.get_mut(patch_type) = patch;
    }

    pub fn effect_sends(&self) -> EffectSends {
        self.bus.sends()
    }

    /// Start a sustained note. An existing note on the same key is torn down first.
    pub fn note_on(&mut self, pitch: u8, velocity: u8, patch_type: PatchType) {
        let key = VoiceKey::Held {
            patch: patch_type,
            pitch,
        };
        self.teardown(key);
        let voice = self.start_voice(pitch, velocity, patch_type);
        trace!(?key, voice = voice.id(), "note on");
        self.voices.insert(key, voice);
    }

    /// Release a sustained note. Absent or already-releasing notes are ignored.
    pub fn note_off(&mut self, pitch: u8, patch_type: PatchType) {
        let key = VoiceKey::Held {
            patch: patch_type,
            pitch,
        };
        match self.voices.get(&key) {
            Some(voice) if !voice.is_released() => {
                let id = voice.id();
                self.release(key, id);
            }
            _ => trace!(?key, "note off for silent key"),
        }
    }

    /// Start a note that releases itself after `duration_ms`.
    pub fn play_note(&mut self, pitch: u8, velocity: u8, duration_ms: f64, patch_type: PatchType) -> VoiceKey {
        let id = self.next_note_id;
        self.next_note_id += 1;
        let key = VoiceKey::Timed {
            patch: patch_type,
            pitch,
            id,
        };
        let mut voice = self.start_voice(pitch, velocity, patch_type);
        let deadline = self.frame.saturating_add(self.ms_to_frames(duration_ms));
        voice.timer = Some(self.timers.schedule(
            deadline,
            VoiceTimer::Release {
                key,
                voice: voice.id(),
            },
        ));
        trace!(?key, voice = voice.id(), duration_ms, "timed note");
        self.voices.insert(key, voice);
        key
    }

    /// Silence everything now: cancel every timer and drop every voice.
    pub fn all_notes_off(&mut self) {
        if !self.voices.is_empty() {
            debug!(voices = self.voices.len(), "all notes off");
        }
        self.timers.clear();
        self.voices.clear();
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn voice(&self, key: &VoiceKey) -> Option<&Voice> {
        self.voices.get(key)
    }

    pub fn is_active(&self, key: &VoiceKey) -> bool {
        self.voices.contains_key(key)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Render interleaved stereo frames into `out`, firing voice timers at
    /// their exact frames.
    pub fn render(&mut self, out: &mut [f32]) {
        for frame in out.chunks_mut(2 * MAX_RENDER_BLOCK) {
            let mut done = 0;
            let frames = frame.len() / 2;
            while done < frames {
                self.fire_due_timers();
                let mut n = frames - done;
                if let Some(deadline) = self.timers.next_deadline() {
                    n = n.min(deadline.saturating_sub(self.frame).max(1) as usize);
                }
                self.render_block(&mut frame[2 * done..2 * (done + n)]);
                done += n;
            }
        }
        self.fire_due_timers();
    }

    /// Run the clock forward `frames` without keeping the output.
    pub fn advance(&mut self, frames: u64) {
        let mut buf = [0.0f32; 2 * MAX_RENDER_BLOCK];
        let mut left = frames;
        while left > 0 {
            let n = left.min(MAX_RENDER_BLOCK as u64) as usize;
            self.render(&mut buf[..2 * n]);
            left -= n as u64;
        }
    }

    pub fn advance_ms(&mut self, ms: f64) {
        let frames = self.ms_to_frames(ms);
        self.advance(frames);
    }

    fn render_block(&mut self, out: &mut [f32]) {
        let frames = out.len() / 2;
        let start = self.now();
        let sample_rate = self.sample_rate as f64;
        let mix = &mut self.mix[..frames];
        mix.fill(0.0);
        for voice in self.voices.values_mut() {
            voice.render_add(mix, start, sample_rate);
        }
        for (frame, &x) in out.chunks_exact_mut(2).zip(mix.iter()) {
            let [l, r] = self.bus.process(x);
            frame[0] = l;
            frame[1] = r;
        }
        self.frame += frames as u64;
    }

    fn start_voice(&mut self, pitch: u8, velocity: u8, patch_type: PatchType) -> Voice {
        let id = self.next_voice_id;
        self.next_voice_id += 1;
        let patch = self.patches.get(patch_type);
        self.bus.set_sends(patch.reverb, patch.delay);
        Voice::start(
            id,
            patch_type,
            pitch,
            velocity,
            patch,
            self.now(),
            self.sample_rate as f64,
        )
    }

    fn release(&mut self, key: VoiceKey, id: u64) {
        let now = self.now();
        let Some(voice) = self.voices.get_mut(&key) else {
            return;
        };
        if let Some(handle) = voice.timer.take() {
            self.timers.cancel(handle);
        }
        let tail_ms = voice.release(now);
        let deadline = self.frame.saturating_add(ms_to_frames(self.sample_rate, tail_ms as f64));
        voice.timer = Some(self.timers.schedule(deadline, VoiceTimer::Cleanup { key, voice: id }));
        trace!(?key, voice = id, tail_ms, "release");
    }

    fn teardown(&mut self, key: VoiceKey) {
        if let Some(voice) = self.voices.remove(&key) {
            if let Some(handle) = voice.timer {
                self.timers.cancel(handle);
            }
            trace!(?key, voice = voice.id(), "teardown");
        }
    }

    fn fire_due_timers(&mut self) {
        while let Some((_, timer)) = self.timers.pop_due(self.frame) {
            match timer {
                VoiceTimer::Release { key, voice } => {
                    if self.voices.get(&key).is_some_and(|v| v.id() == voice) {
                        self.release(key, voice);
                    }
                }
                VoiceTimer::Cleanup { key, voice } => {
                    if self.voices.get(&key).is_some_and(|v| v.id() == voice) {
                        self.voices.remove(&key);
                        trace!(?key, voice, "cleanup");
                    }
                }
            }
        }
    }
}

fn ms_to_frames(sample_rate: u32, ms: f64) -> u64 {
    (ms.max(0.0) * sample_rate as f64 / 1000.0).round() as u64
}
