//! MIDI output backend.
//!
//! Renders note triggers as General MIDI on a port: one channel and program
//! per instrument, note-on/note-off pairs timed by a worker thread.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use midir::MidiOutput;
use tracing::{debug, info, warn};

use super::backend::{AudioBackend, AudioError, NoteTrigger};
use crate::mapping::{Instrument, Note};

/// Pan controller
const CC_PAN: u8 = 10;
/// Reverb send controller
const CC_REVERB: u8 = 91;
/// All notes off
const CC_ALL_NOTES_OFF: u8 = 123;

/// Channel messages the backend sends; channel first, data bytes after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn(u8, u8, u8),
    NoteOff(u8, u8, u8),
    /// Channel, controller number, value
    ControlChange(u8, u8, u8),
    ProgramChange(u8, u8),
}

impl MidiMessage {
    /// Status byte plus data bytes, each masked into range.
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOn(ch, note, vel) => vec![0x90 | (ch & 0x0F), note & 0x7F, vel & 0x7F],
            MidiMessage::NoteOff(ch, note, vel) => {
                vec![0x80 | (ch & 0x0F), note & 0x7F, vel & 0x7F]
            }
            MidiMessage::ControlChange(ch, ctrl, val) => {
                vec![0xB0 | (ch & 0x0F), ctrl & 0x7F, val & 0x7F]
            }
            MidiMessage::ProgramChange(ch, prog) => vec![0xC0 | (ch & 0x0F), prog & 0x7F],
        }
    }
}

/// Note velocity for a trigger
///
/// Velocity and gain combine into a linear amplitude; the square root keeps
/// quiet notes audible. `scale` is the configured velocity multiplier.
pub fn velocity_byte(velocity: f64, gain_db: Option<f64>, scale: f64) -> u8 {
    let amplitude = velocity.max(0.0) * 10f64.powf(gain_db.unwrap_or(0.0) / 20.0);
    (100.0 * amplitude.sqrt() * scale).round().clamp(1.0, 127.0) as u8
}

/// Map `-1..1` onto a 7-bit controller value
fn bipolar_cc(value: f64) -> u8 {
    ((value.clamp(-1.0, 1.0) + 1.0) * 63.5).round().min(127.0) as u8
}

/// Messages waiting for their send time, earliest first
#[derive(Debug, Default)]
struct PendingQueue {
    heap: BinaryHeap<Reverse<(Instant, u64, [u8; 3])>>,
    seq: u64,
}

impl PendingQueue {
    fn push(&mut self, at: Instant, msg: MidiMessage) {
        let mut raw = [0u8; 3];
        let bytes = msg.to_bytes();
        raw[..bytes.len()].copy_from_slice(&bytes);
        // the sequence number keeps equal timestamps in submission order
        self.heap.push(Reverse((at, self.seq, raw)));
        self.seq += 1;
    }

    /// Remove and return every message due at `now`
    fn pop_due(&mut self, now: Instant) -> Vec<[u8; 3]> {
        let mut due = Vec::new();
        while let Some(Reverse((at, _, _))) = self.heap.peek() {
            if *at > now {
                break;
            }
            if let Some(Reverse((_, _, raw))) = self.heap.pop() {
                due.push(raw);
            }
        }
        due
    }

    fn next_due(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse((at, _, _))| *at)
    }

    fn clear(&mut self) {
        self.heap.clear();
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Length of a raw message by its status byte
fn message_len(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 2,
        _ => 3,
    }
}

enum WorkerCommand {
    Schedule(Instant, MidiMessage),
    StopAll,
    Stop,
}

/// Audio backend writing General MIDI to an output port.
pub struct MidiBackend {
    sender: Sender<WorkerCommand>,
    started: Instant,
    velocity_scale: f64,
}

impl MidiBackend {
    /// Connect to the first port whose name contains `port_name`, or the
    /// first port when none is given.
    pub fn new(port_name: Option<&str>, velocity_scale: f64) -> Result<Self> {
        let midi_out = MidiOutput::new("mapsonic MIDI Output")?;
        let ports = midi_out.ports();

        if ports.is_empty() {
            return Err(anyhow!("No MIDI output ports available"));
        }

        let port = if let Some(name) = port_name {
            ports
                .iter()
                .find(|p| {
                    midi_out
                        .port_name(p)
                        .map(|n| n.contains(name))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("MIDI port '{}' not found", name))?
                .clone()
        } else {
            ports[0].clone()
        };

        let port_name_actual = midi_out.port_name(&port)?;
        let conn = midi_out
            .connect(&port, "mapsonic-output")
            .map_err(|e| anyhow!("failed to connect to MIDI port: {}", e))?;

        let (sender, receiver) = mpsc::channel::<WorkerCommand>();

        thread::spawn(move || {
            let mut conn = conn;
            let mut pending = PendingQueue::default();
            loop {
                let now = Instant::now();
                for raw in pending.pop_due(now) {
                    if let Err(e) = conn.send(&raw[..message_len(raw[0])]) {
                        warn!("MIDI send failed: {}", e);
                    }
                }

                let cmd = match pending.next_due() {
                    Some(at) => receiver.recv_timeout(at.saturating_duration_since(Instant::now())),
                    None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
                };
                match cmd {
                    Ok(WorkerCommand::Schedule(at, msg)) => pending.push(at, msg),
                    Ok(WorkerCommand::StopAll) => {
                        debug!(dropped = pending.len(), "stopping all MIDI notes");
                        pending.clear();
                        for ch in 0..16u8 {
                            let off = MidiMessage::ControlChange(ch, CC_ALL_NOTES_OFF, 0);
                            let _ = conn.send(&off.to_bytes());
                        }
                    }
                    Ok(WorkerCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
            }
        });

        info!("MIDI output connected to: {}", port_name_actual);

        let backend = Self {
            sender,
            started: Instant::now(),
            velocity_scale,
        };
        for instrument in Instrument::ALL {
            backend.send_now(MidiMessage::ProgramChange(
                instrument.midi_channel(),
                instrument.gm_program(),
            ))?;
        }
        Ok(backend)
    }

    fn instant_at(&self, secs: f64) -> Instant {
        self.started + Duration::from_secs_f64(secs.max(0.0))
    }

    fn schedule(&self, at: Instant, msg: MidiMessage) -> Result<(), AudioError> {
        self.sender
            .send(WorkerCommand::Schedule(at, msg))
            .map_err(|_| AudioError::Midi("MIDI worker has stopped".to_string()))
    }

    fn send_now(&self, msg: MidiMessage) -> Result<(), AudioError> {
        self.schedule(Instant::now(), msg)
    }

    /// Silence the port and stop the worker thread.
    pub fn stop(&self) {
        let _ = self.sender.send(WorkerCommand::StopAll);
        let _ = self.sender.send(WorkerCommand::Stop);
    }
}

impl AudioBackend for MidiBackend {
    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn is_ready(&self) -> bool {
        true
    }

    /// General MIDI programs need no loading
    fn is_loaded(&self, _instrument: Instrument) -> bool {
        true
    }

    fn trigger(&mut self, note: &NoteTrigger) -> Result<(), AudioError> {
        let channel = note.instrument.midi_channel();
        let velocity = velocity_byte(note.velocity, note.gain_db, self.velocity_scale);
        let on_at = self.instant_at(note.at.unwrap_or_else(|| self.now()));
        let off_at = on_at + Duration::from_secs_f64(note.duration.max(0.0));

        let mut keys = Vec::with_capacity(note.notes.len());
        for token in &note.notes {
            let key = token
                .parse::<Note>()
                .ok()
                .and_then(|n| n.midi_number())
                .ok_or_else(|| AudioError::Trigger {
                    instrument: note.instrument,
                    note: token.clone(),
                    reason: "not a playable MIDI note".to_string(),
                })?;
            keys.push(key);
        }

        for key in keys {
            self.schedule(on_at, MidiMessage::NoteOn(channel, key, velocity))?;
            self.schedule(off_at, MidiMessage::NoteOff(channel, key, 0))?;
        }
        Ok(())
    }

    /// The height synth is the only panned voice
    fn set_panning(&mut self, y: f64) -> Result<(), AudioError> {
        let channel = Instrument::Fm.midi_channel();
        self.send_now(MidiMessage::ControlChange(channel, CC_PAN, bipolar_cc(y)))
    }

    fn set_reverb_wet(&mut self, wet: f64) -> Result<(), AudioError> {
        let channel = Instrument::Melodic.midi_channel();
        let value = (wet.clamp(0.0, 1.0) * 127.0).round() as u8;
        self.send_now(MidiMessage::ControlChange(channel, CC_REVERB, value))
    }

    /// Tempo only affects note lengths, which the dispatcher resolves
    fn set_tempo(&mut self, bpm: f64) -> Result<(), AudioError> {
        debug!(bpm, "tempo change");
        Ok(())
    }

    fn stop_all(&mut self) {
        let _ = self.sender.send(WorkerCommand::StopAll);
    }
}

impl Drop for MidiBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Names of the MIDI output ports on this host.
pub fn list_midi_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("mapsonic MIDI List")?;
    let ports = midi_out.ports();

    let names: Vec<String> = ports
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok(names)
}

/// Port `MidiBackend::new(None, ..)` would connect to.
pub fn default_port_name() -> Option<String> {
    let midi_out = MidiOutput::new("mapsonic MIDI Default").ok()?;
    let ports = midi_out.ports();
    ports.first().and_then(|p| midi_out.port_name(p).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_message_note_on_channel() {
        let msg = MidiMessage::NoteOn(5, 72, 80);
        assert_eq!(msg.to_bytes(), vec![0x95, 72, 80]);
    }

    #[test]
    fn test_midi_message_cc() {
        let msg = MidiMessage::ControlChange(9, CC_ALL_NOTES_OFF, 0);
        assert_eq!(msg.to_bytes(), vec![0xB9, 123, 0]);
    }

    #[test]
    fn test_midi_message_program_change() {
        let msg = MidiMessage::ProgramChange(0, 73);
        assert_eq!(msg.to_bytes(), vec![0xC0, 73]);
        assert_eq!(message_len(0xC0), 2);
        assert_eq!(message_len(0x90), 3);
    }

    #[test]
    fn test_velocity_byte() {
        assert_eq!(velocity_byte(1.0, None, 1.0), 100);
        assert_eq!(velocity_byte(3.0, None, 1.0), 127);
        assert_eq!(velocity_byte(0.0, None, 1.0), 1);
        // -20 dB is a tenth of the amplitude
        assert_eq!(velocity_byte(1.0, Some(-20.0), 1.0), 32);
        assert_eq!(velocity_byte(1.0, None, 0.5), 50);
    }

    #[test]
    fn test_bipolar_cc() {
        assert_eq!(bipolar_cc(-1.0), 0);
        assert_eq!(bipolar_cc(0.0), 64);
        assert_eq!(bipolar_cc(1.0), 127);
        assert_eq!(bipolar_cc(5.0), 127);
    }

    #[test]
    fn test_pending_queue_orders_by_time() {
        let base = Instant::now();
        let mut q = PendingQueue::default();
        q.push(base + Duration::from_millis(20), MidiMessage::NoteOff(0, 60, 0));
        q.push(base, MidiMessage::NoteOn(0, 60, 100));
        q.push(base, MidiMessage::NoteOn(0, 64, 100));

        assert_eq!(q.next_due(), Some(base));
        let due = q.pop_due(base);
        assert_eq!(due, vec![[0x90, 60, 100], [0x90, 64, 100]]);
        assert_eq!(q.len(), 1);

        assert!(q.pop_due(base + Duration::from_millis(10)).is_empty());
        assert_eq!(q.pop_due(base + Duration::from_millis(20)), vec![[0x80, 60, 0]]);
        assert_eq!(q.next_due(), None);
    }
}
