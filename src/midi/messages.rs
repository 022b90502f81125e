//! Channel voice messages on the wire.
//!
//! Channels are 1-16 at this boundary and 0-15 in the status byte.

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;

/// Status-byte channel nibble for a 1-based channel. Out-of-range channels clamp.
pub fn wire_channel(channel: u8) -> u8 {
    channel.clamp(1, 16) - 1
}

pub fn note_on(channel: u8, pitch: u8, velocity: u8) -> [u8; 3] {
    [NOTE_ON | wire_channel(channel), pitch & 0x7f, velocity & 0x7f]
}

pub fn note_off(channel: u8, pitch: u8) -> [u8; 3] {
    [NOTE_OFF | wire_channel(channel), pitch & 0x7f, 0]
}
