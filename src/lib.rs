//! Melodizer: generative 4-bar synth phrases, a subtractive synthesizer to
//! play them, and a step sequencer that drives the synth or a MIDI device.

pub mod audio;
pub mod config;
pub mod generator;
pub mod midi;
pub mod roll;
pub mod sequencer;
pub mod session;
pub mod synth;
pub mod theory;
