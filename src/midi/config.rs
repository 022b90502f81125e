//! MIDI output configuration: device selection and part routing.

use serde::{Deserialize, Serialize};

use crate::sequencer::OutputTarget;

/// MIDI output section of `~/.melodizer/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MidiOutputConfig {
    /// Preferred MIDI device name (substring match). None = first available.
    pub device_name: Option<String>,
    /// Where melody notes go.
    pub melody: OutputTarget,
    /// Where bass notes go.
    pub bass: OutputTarget,
}
