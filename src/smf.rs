//! Standard MIDI File import and export.
//!
//! The byte layout is midly's business; this module only maps between the
//! crate's event model and midly's, re-encoding absolute times as deltas on
//! export and accumulating deltas back to absolute times on import.

use crate::midi::MidiMessage;
use crate::sequence::{EventKind, EventSequence, SequenceError, SequencedEvent};
use log::debug;
use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub enum SmfError {
    /// The bytes are not a readable Standard MIDI File
    Parse(midly::Error),
    /// SMPTE-timecode files have no tick resolution to map onto
    UnsupportedTiming,
    /// Export requires a sealed sequence
    Unsealed,
    /// The file decodes into an invalid sequence
    Sequence(SequenceError),
    Io(std::io::Error),
}

impl fmt::Display for SmfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmfError::Parse(e) => write!(f, "MIDI file parse error: {}", e),
            SmfError::UnsupportedTiming => {
                write!(f, "SMPTE-timecode files are not supported")
            }
            SmfError::Unsealed => write!(f, "sequence must be sealed before export"),
            SmfError::Sequence(e) => write!(f, "MIDI file contents rejected: {}", e),
            SmfError::Io(e) => write!(f, "MIDI file I/O error: {}", e),
        }
    }
}

impl Error for SmfError {}

impl From<midly::Error> for SmfError {
    fn from(err: midly::Error) -> Self {
        SmfError::Parse(err)
    }
}

impl From<SequenceError> for SmfError {
    fn from(err: SequenceError) -> Self {
        SmfError::Sequence(err)
    }
}

impl From<std::io::Error> for SmfError {
    fn from(err: std::io::Error) -> Self {
        SmfError::Io(err)
    }
}

/// Serializes a sealed sequence to SMF bytes.
pub fn export(sequence: &EventSequence) -> Result<Vec<u8>, SmfError> {
    if !sequence.is_sealed() {
        return Err(SmfError::Unsealed);
    }
    // Metrical timing is a 15-bit field.
    if sequence.resolution() > 0x7FFF {
        return Err(SmfError::Sequence(SequenceError::Configuration(
            "resolution exceeds the SMF metrical range".to_string(),
        )));
    }

    let format = if sequence.tracks().len() == 1 {
        Format::SingleTrack
    } else {
        Format::Parallel
    };
    let header = Header::new(format, Timing::Metrical(u15::from(sequence.resolution())));
    let mut smf = Smf::new(header);

    for track in sequence.tracks() {
        let mut events: Vec<TrackEvent> = Vec::with_capacity(track.len() + 1);
        let mut previous = 0u64;
        for event in track {
            match encode_event(event) {
                Some(kind) => {
                    // Sealed sequences are non-decreasing, so this cannot
                    // underflow.
                    let delta = event.absolute_time - previous;
                    previous = event.absolute_time;
                    events.push(TrackEvent {
                        delta: u28::from(delta as u32),
                        kind,
                    });
                }
                None => debug!("No SMF mapping for {}, skipped", event),
            }
        }
        events.push(TrackEvent {
            delta: u28::from(0u32),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(events);
    }

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

pub fn export_to_path(sequence: &EventSequence, path: &Path) -> Result<(), SmfError> {
    let bytes = export(sequence)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Parses SMF bytes into a sealed sequence.
///
/// Channel voice messages and time-signature metas are retained; other meta
/// and sysex events have no counterpart in the event model and are dropped.
pub fn import(bytes: &[u8]) -> Result<EventSequence, SmfError> {
    let smf = Smf::parse(bytes)?;
    let resolution = match smf.header.timing {
        Timing::Metrical(ticks_per_beat) => ticks_per_beat.as_int(),
        Timing::Timecode(..) => return Err(SmfError::UnsupportedTiming),
    };

    let mut sequence = EventSequence::new(resolution)?;
    for (index, track) in smf.tracks.iter().enumerate() {
        if index > 0 {
            sequence.add_track();
        }
        let mut absolute_time = 0u64;
        for event in track {
            absolute_time += u64::from(event.delta.as_int());
            if let Some((channel, kind)) = decode_event(&event.kind) {
                sequence.append(
                    index,
                    SequencedEvent {
                        absolute_time,
                        channel,
                        kind,
                    },
                )?;
            }
        }
    }
    sequence.seal()?;
    Ok(sequence)
}

pub fn import_from_path(path: &Path) -> Result<EventSequence, SmfError> {
    let bytes = fs::read(path)?;
    import(&bytes)
}

fn encode_event(event: &SequencedEvent) -> Option<TrackEventKind<'static>> {
    let channel = u4::from(event.channel);
    match &event.kind {
        EventKind::NoteOn { note, velocity } => Some(TrackEventKind::Midi {
            channel,
            message: midly::MidiMessage::NoteOn {
                key: u7::from(*note),
                vel: u7::from(*velocity),
            },
        }),
        EventKind::NoteOff { note, velocity } => Some(TrackEventKind::Midi {
            channel,
            message: midly::MidiMessage::NoteOff {
                key: u7::from(*note),
                vel: u7::from(*velocity),
            },
        }),
        EventKind::TimeSignature {
            numerator,
            denominator_exp,
        } => Some(TrackEventKind::Meta(MetaMessage::TimeSignature(
            *numerator,
            *denominator_exp,
            24,
            8,
        ))),
        EventKind::Other(msg) => match msg {
            MidiMessage::ControlChange {
                controller, value, ..
            } => Some(TrackEventKind::Midi {
                channel,
                message: midly::MidiMessage::Controller {
                    controller: u7::from(*controller),
                    value: u7::from(*value),
                },
            }),
            MidiMessage::ProgramChange { program, .. } => Some(TrackEventKind::Midi {
                channel,
                message: midly::MidiMessage::ProgramChange {
                    program: u7::from(*program),
                },
            }),
            _ => None,
        },
    }
}

fn decode_event(kind: &TrackEventKind) -> Option<(u8, EventKind)> {
    match kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            match message {
                midly::MidiMessage::NoteOn { key, vel } => Some((
                    channel,
                    EventKind::NoteOn {
                        note: key.as_int(),
                        velocity: vel.as_int(),
                    },
                )),
                midly::MidiMessage::NoteOff { key, vel } => Some((
                    channel,
                    EventKind::NoteOff {
                        note: key.as_int(),
                        velocity: vel.as_int(),
                    },
                )),
                midly::MidiMessage::Controller { controller, value } => Some((
                    channel,
                    EventKind::Other(MidiMessage::ControlChange {
                        channel,
                        controller: controller.as_int(),
                        value: value.as_int(),
                    }),
                )),
                midly::MidiMessage::ProgramChange { program } => Some((
                    channel,
                    EventKind::Other(MidiMessage::ProgramChange {
                        channel,
                        program: program.as_int(),
                    }),
                )),
                _ => None,
            }
        }
        TrackEventKind::Meta(MetaMessage::TimeSignature(
            numerator,
            denominator_exp,
            _clocks_per_click,
            _notated_32nds,
        )) => Some((
            0,
            EventKind::TimeSignature {
                numerator: *numerator,
                denominator_exp: *denominator_exp,
            },
        )),
        _ => None,
    }
}
