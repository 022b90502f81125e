//! Subtractive voice synthesis.
//!
//! Each note gets its own voice: up to three oscillators, an amplitude
//! envelope, a resonant low-pass filter swept by its own envelope, and an
//! output gain. Voices mix into one shared effects bus. [`SynthEngine`] owns
//! the voices and renders them on its own frame clock.

pub mod effects;
pub mod engine;
pub mod envelope;
pub mod filter;
pub mod lfo;
pub mod oscillator;
pub mod param;
pub mod patch;
pub mod timer;
pub mod voice;

pub use effects::{EffectSends, EffectsBus};
pub use engine::{SynthEngine, VoiceKey};
pub use envelope::Adsr;
pub use oscillator::Waveform;
pub use patch::{
    DelaySend, FilterSettings, LfoDestination, LfoSettings, OscillatorSlot, Patch, PatchBank, PatchError, PatchType,
    ReverbSend,
};
