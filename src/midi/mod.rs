//! MIDI output to external hardware or software instruments.

pub mod config;
pub mod messages;
pub mod output;

use thiserror::Error;

pub use config::MidiOutputConfig;
pub use output::{ExternalOutput, MidiOut, MidiSink};

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("MIDI init: {0}")]
    Init(String),
    #[error("no MIDI output ports available")]
    NoPorts,
    #[error("MIDI device matching '{0}' not found")]
    DeviceNotFound(String),
    #[error("MIDI connect: {0}")]
    Connect(String),
    #[error("MIDI send: {0}")]
    Send(String),
}
