//! Where melody and bass events are sent.

use serde::{Deserialize, Serialize};

use crate::generator::GenerationSettings;

/// Sound source for one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    #[default]
    Internal,
    Midi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Routing {
    pub melody: OutputTarget,
    pub bass: OutputTarget,
    /// 1-16.
    pub melody_channel: u8,
    /// `None` = same as the melody.
    pub bass_channel: Option<u8>,
}

impl Default for Routing {
    fn default() -> Self {
        Self {
            melody: OutputTarget::Internal,
            bass: OutputTarget::Internal,
            melody_channel: 1,
            bass_channel: None,
        }
    }
}

impl Routing {
    /// Internal/MIDI targets with the channels from `settings`.
    pub fn from_settings(settings: &GenerationSettings, melody: OutputTarget, bass: OutputTarget) -> Self {
        Self {
            melody,
            bass,
            melody_channel: settings.channel,
            bass_channel: settings.bass_channel,
        }
    }

    pub fn target(&self, is_bass: bool) -> OutputTarget {
        if is_bass {
            self.bass
        } else {
            self.melody
        }
    }

    pub fn channel(&self, is_bass: bool) -> u8 {
        if is_bass {
            self.bass_channel()
        } else {
            self.melody_channel
        }
    }

    pub fn bass_channel(&self) -> u8 {
        self.bass_channel.unwrap_or(self.melody_channel)
    }

    pub fn needs_midi(&self) -> bool {
        self.melody == OutputTarget::Midi || self.bass == OutputTarget::Midi
    }

    /// Channels to silence on stop: the melody channel, then the bass
    /// channel if it differs.
    pub fn panic_channels(&self) -> Vec<u8> {
        let mut channels = vec![self.melody_channel];
        if self.bass_channel() != self.melody_channel {
            channels.push(self.bass_channel());
        }
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bass_channel_defaults_to_melody() {
        let r = Routing {
            melody_channel: 3,
            ..Default::default()
        };
        assert_eq!(r.channel(true), 3);
        assert_eq!(r.panic_channels(), vec![3]);
    }

    #[test]
    fn separate_bass_channel() {
        let r = Routing {
            bass: OutputTarget::Midi,
            melody_channel: 1,
            bass_channel: Some(2),
            ..Default::default()
        };
        assert_eq!(r.target(true), OutputTarget::Midi);
        assert_eq!(r.target(false), OutputTarget::Internal);
        assert!(r.needs_midi());
        assert_eq!(r.panic_channels(), vec![1, 2]);
    }

    #[test]
    fn from_settings_copies_channels() {
        let settings = GenerationSettings {
            channel: 5,
            bass_channel: Some(6),
            ..Default::default()
        };
        let r = Routing::from_settings(&settings, OutputTarget::Midi, OutputTarget::Internal);
        assert_eq!((r.melody_channel, r.bass_channel()), (5, 6));
        assert!(r.needs_midi());
        assert!(!Routing::default().needs_midi());
    }
}
