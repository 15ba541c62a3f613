use crate::midi::{MidiEngine, MidiError, MidiMessage, Result};
use log::warn;
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::sync::mpsc::{channel, Receiver};

/// MIDI engine backed by real devices via midir.
///
/// Input and output ports are optional and independent: a capture session
/// needs only an input, a replay session only an output.
pub struct MidirEngine {
    #[allow(dead_code)]
    input: Option<MidiInputConnection<()>>,
    output: Option<MidiOutputConnection>,
    rx: Option<Receiver<Vec<u8>>>,
}

impl MidirEngine {
    pub fn new(input_device: Option<String>, output_device: Option<String>) -> Result<Self> {
        let (input, rx) = if let Some(name) = &input_device {
            let mut midi_in = MidiInput::new("miditape-in")?;
            // Deliver everything, including timing clock and active sensing;
            // the recorder decides what qualifies.
            midi_in.ignore(Ignore::None);

            let in_ports = midi_in.ports();
            let in_port = in_ports
                .iter()
                .find(|p| midi_in.port_name(p).unwrap_or_default().contains(name))
                .ok_or_else(|| {
                    MidiError::ConnectionError(format!("input device '{}' not found", name))
                })?;

            let (tx, rx) = channel();
            let input = midi_in.connect(
                in_port,
                "miditape-capture",
                move |_stamp, message, _| {
                    let _ = tx.send(message.to_vec());
                },
                (),
            )?;
            (Some(input), Some(rx))
        } else {
            (None, None)
        };

        let output = if let Some(name) = &output_device {
            let midi_out = MidiOutput::new("miditape-out")?;

            let out_ports = midi_out.ports();
            let out_port = out_ports
                .iter()
                .find(|p| midi_out.port_name(p).unwrap_or_default().contains(name))
                .ok_or_else(|| {
                    MidiError::ConnectionError(format!("output device '{}' not found", name))
                })?;
            Some(midi_out.connect(out_port, "miditape-replay")?)
        } else {
            None
        };

        Ok(MidirEngine { input, output, rx })
    }

    pub fn parse_midi_message(data: &[u8]) -> Option<MidiMessage> {
        if data.is_empty() {
            return None;
        }

        match data[0] {
            0xF8 => return Some(MidiMessage::Clock),
            0xFA => return Some(MidiMessage::Start),
            0xFB => return Some(MidiMessage::Continue),
            0xFC => return Some(MidiMessage::Stop),
            0xFE => return Some(MidiMessage::ActiveSensing),
            _ => {}
        }

        match data[0] & 0xF0 {
            0x90 if data.len() >= 3 => Some(MidiMessage::NoteOn {
                channel: data[0] & 0x0F,
                note: data[1],
                velocity: data[2],
            }),
            0x80 if data.len() >= 3 => Some(MidiMessage::NoteOff {
                channel: data[0] & 0x0F,
                note: data[1],
                velocity: data[2],
            }),
            0xB0 if data.len() >= 3 => Some(MidiMessage::ControlChange {
                channel: data[0] & 0x0F,
                controller: data[1],
                value: data[2],
            }),
            0xC0 if data.len() >= 2 => Some(MidiMessage::ProgramChange {
                channel: data[0] & 0x0F,
                program: data[1],
            }),
            _ => None,
        }
    }

    pub fn message_to_bytes(msg: &MidiMessage) -> Vec<u8> {
        match msg {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => vec![0x90 | (channel & 0x0F), *note, *velocity],
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => vec![0x80 | (channel & 0x0F), *note, *velocity],
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => vec![0xB0 | (channel & 0x0F), *controller, *value],
            MidiMessage::ProgramChange { channel, program } => {
                vec![0xC0 | (channel & 0x0F), *program]
            }
            MidiMessage::Clock => vec![0xF8],
            MidiMessage::ActiveSensing => vec![0xFE],
            MidiMessage::Start => vec![0xFA],
            MidiMessage::Stop => vec![0xFC],
            MidiMessage::Continue => vec![0xFB],
        }
    }

    pub fn list_input_devices() -> Vec<String> {
        let mut devices = Vec::new();

        if let Ok(midi_in) = MidiInput::new("miditape-list") {
            for port in midi_in.ports() {
                if let Ok(name) = midi_in.port_name(&port) {
                    devices.push(name);
                }
            }
        }

        devices
    }

    pub fn list_output_devices() -> Vec<String> {
        let mut devices = Vec::new();

        if let Ok(midi_out) = MidiOutput::new("miditape-list") {
            for port in midi_out.ports() {
                if let Ok(name) = midi_out.port_name(&port) {
                    devices.push(name);
                }
            }
        }

        devices
    }
}

impl MidiEngine for MidirEngine {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        if let Some(output) = &mut self.output {
            let bytes = Self::message_to_bytes(&msg);
            output.send(&bytes)?;
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<MidiMessage> {
        let rx = self
            .rx
            .as_ref()
            .ok_or_else(|| MidiError::RecvError("no input connection".to_string()))?;

        // Malformed data must not halt the stream; skip it and keep reading.
        loop {
            let data = rx
                .recv()
                .map_err(|_| MidiError::RecvError("input connection closed".to_string()))?;
            match Self::parse_midi_message(&data) {
                Some(msg) => return Ok(msg),
                None => warn!("Ignoring unrecognized MIDI data: {:02X?}", data),
            }
        }
    }
}
