//! External device output.
//!
//! [`ExternalOutput`] is what the sequencer talks to. [`MidiOut`] implements
//! it over any [`MidiSink`]: note-ons go out at once, note-offs wait on a
//! timer queue driven by the session clock. With no sink attached the output
//! is simply disconnected, which is a normal state and not an error.

use midir::{MidiOutput as MidirOutput, MidiOutputConnection};
use tracing::{debug, info, warn};

use super::config::MidiOutputConfig;
use super::messages::{note_off, note_on};
use super::MidiError;
use crate::synth::timer::TimerQueue;

/// Fraction of a note's length after which its note-off is sent.
pub const GATE: f64 = 0.9;

/// An external sound source driven by the sequencer.
pub trait ExternalOutput {
    fn is_connected(&self) -> bool;

    /// Send a note-on now and schedule its note-off after
    /// `GATE × step_ms × duration_steps`. `channel` is 1-16.
    fn send_note(&mut self, pitch: u8, velocity: u8, duration_steps: u32, channel: u8, step_ms: f64);

    /// Drop every pending note-off and send a note-off for all 128 pitches on `channel`.
    fn all_notes_off(&mut self, channel: u8);

    /// Move the output's clock to `now_ms`, sending note-offs that fall due.
    fn advance_to(&mut self, now_ms: f64);
}

/// Raw MIDI byte sink.
pub trait MidiSink {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError>;
}

impl MidiSink for MidiOutputConnection {
    fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
        MidiOutputConnection::send(self, message).map_err(|e| MidiError::Send(e.to_string()))
    }
}

pub struct MidiOut {
    sink: Option<Box<dyn MidiSink>>,
    port_name: Option<String>,
    pending: TimerQueue<[u8; 3]>,
    /// Microseconds on the session clock.
    now_us: u64,
}

impl MidiOut {
    pub fn disconnected() -> Self {
        Self {
            sink: None,
            port_name: None,
            pending: TimerQueue::new(),
            now_us: 0,
        }
    }

    pub fn with_sink(sink: Box<dyn MidiSink>, port_name: impl Into<String>) -> Self {
        Self {
            sink: Some(sink),
            port_name: Some(port_name.into()),
            ..Self::disconnected()
        }
    }

    /// Open the port matching the config's device name, or the first port.
    pub fn connect(config: &MidiOutputConfig) -> Result<Self, MidiError> {
        let midi_out = MidirOutput::new("melodizer").map_err(|e| MidiError::Init(e.to_string()))?;

        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err(MidiError::NoPorts);
        }

        let (port, port_name) = if let Some(ref name_filter) = config.device_name {
            ports
                .iter()
                .find_map(|p| {
                    let name = midi_out.port_name(p).unwrap_or_default();
                    name.contains(name_filter.as_str()).then(|| (p.clone(), name))
                })
                .ok_or_else(|| MidiError::DeviceNotFound(name_filter.clone()))?
        } else {
            let p = ports[0].clone();
            let name = midi_out.port_name(&p).unwrap_or_else(|_| "unknown".to_string());
            (p, name)
        };

        let connection = midi_out
            .connect(&port, "melodizer-output")
            .map_err(|e| MidiError::Connect(e.to_string()))?;
        info!(port = %port_name, "MIDI output connected");
        Ok(Self::with_sink(Box::new(connection), port_name))
    }

    /// Try to connect; a missing device leaves the output disconnected.
    pub fn connect_or_disconnected(config: &MidiOutputConfig) -> Self {
        Self::connect(config).unwrap_or_else(|e| {
            info!(error = %e, "no MIDI output");
            Self::disconnected()
        })
    }

    /// Names of the available MIDI output ports.
    pub fn list_ports() -> Vec<String> {
        let Ok(midi_out) = MidirOutput::new("melodizer-list") else {
            return Vec::new();
        };
        midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect()
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    pub fn pending_note_offs(&self) -> usize {
        self.pending.len()
    }

    fn send(&mut self, message: &[u8]) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.send(message) {
                warn!(error = %e, "MIDI send failed");
            }
        }
    }
}

impl ExternalOutput for MidiOut {
    fn is_connected(&self) -> bool {
        self.sink.is_some()
    }

    fn send_note(&mut self, pitch: u8, velocity: u8, duration_steps: u32, channel: u8, step_ms: f64) {
        if self.sink.is_none() {
            return;
        }
        self.send(&note_on(channel, pitch, velocity));
        let gate_us = (step_ms * duration_steps as f64 * GATE * 1000.0).max(0.0).round() as u64;
        self.pending.schedule(self.now_us.saturating_add(gate_us), note_off(channel, pitch));
    }

    fn all_notes_off(&mut self, channel: u8) {
        self.pending.clear();
        if self.sink.is_none() {
            return;
        }
        debug!(channel, "MIDI all notes off");
        for pitch in 0..128u8 {
            self.send(&note_off(channel, pitch));
        }
    }

    fn advance_to(&mut self, now_ms: f64) {
        self.now_us = self.now_us.max((now_ms * 1000.0).round() as u64);
        while let Some((_, message)) = self.pending.pop_due(self.now_us) {
            self.send(&message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<Vec<u8>>>>);

    impl Capture {
        fn take(&self) -> Vec<Vec<u8>> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl MidiSink for Capture {
        fn send(&mut self, message: &[u8]) -> Result<(), MidiError> {
            self.0.lock().unwrap().push(message.to_vec());
            Ok(())
        }
    }

    fn connected() -> (MidiOut, Capture) {
        let capture = Capture::default();
        (MidiOut::with_sink(Box::new(capture.clone()), "test"), capture)
    }

    #[test]
    fn note_off_after_ninety_percent() {
        let (mut out, capture) = connected();
        out.advance_to(1000.0);
        out.send_note(60, 100, 4, 2, 125.0);
        assert_eq!(capture.take(), vec![vec![0x91, 60, 100]]);
        // 0.9 × 125 × 4 = 450 ms
        out.advance_to(1449.0);
        assert!(capture.take().is_empty());
        out.advance_to(1450.0);
        assert_eq!(capture.take(), vec![vec![0x81, 60, 0]]);
        assert_eq!(out.pending_note_offs(), 0);
    }

    #[test]
    fn unbounded_gate_waits_for_panic() {
        let (mut out, capture) = connected();
        out.advance_to(500.0);
        out.send_note(60, 100, 4, 0, f64::INFINITY);
        capture.take();
        out.advance_to(1e9);
        assert!(capture.take().is_empty());
        assert_eq!(out.pending_note_offs(), 1);
        out.all_notes_off(0);
        assert_eq!(out.pending_note_offs(), 0);
    }

    #[test]
    fn all_notes_off_sweeps_channel_and_clears_pending() {
        let (mut out, capture) = connected();
        out.send_note(60, 100, 16, 1, 100.0);
        capture.take();
        out.all_notes_off(3);
        let sent = capture.take();
        assert_eq!(sent.len(), 128);
        assert!(sent.iter().enumerate().all(|(i, m)| m == &vec![0x82, i as u8, 0]));
        assert_eq!(out.pending_note_offs(), 0);
        out.advance_to(10_000.0);
        assert!(capture.take().is_empty());
    }

    #[test]
    fn disconnected_is_silent() {
        let mut out = MidiOut::disconnected();
        assert!(!out.is_connected());
        out.send_note(60, 100, 4, 1, 125.0);
        assert_eq!(out.pending_note_offs(), 0);
        out.all_notes_off(1);
        out.advance_to(1000.0);
    }

    #[test]
    fn list_ports_does_not_panic() {
        let _ = MidiOut::list_ports();
    }
}
