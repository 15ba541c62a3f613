//! The recorded event model: ordered, absolute-time-stamped MIDI events
//! grouped into tracks.
//!
//! An [`EventSequence`] is created empty, populated append-only (by the
//! capture recorder or by SMF import) and sealed before it can be exported or
//! played back. Sealing validates the one structural invariant everything
//! else relies on: within a track, absolute times never decrease.

use crate::midi::MidiMessage;
use crate::position::TimeSignature;
use std::error::Error;
use std::fmt;

/// Errors raised while building or sealing a sequence
#[derive(Debug)]
pub enum SequenceError {
    /// Invalid construction parameters (non-positive resolution, bad track)
    Configuration(String),
    /// Structural invariant violation caught at seal time or on append
    Integrity(String),
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::Configuration(msg) => write!(f, "sequence configuration error: {}", msg),
            SequenceError::Integrity(msg) => write!(f, "sequence integrity error: {}", msg),
        }
    }
}

impl Error for SequenceError {}

/// The kind-specific payload of a sequenced event
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    TimeSignature { numerator: u8, denominator_exp: u8 },
    /// Any other channel voice message that survives import
    Other(MidiMessage),
}

impl EventKind {
    pub fn is_note_off(&self) -> bool {
        matches!(self, EventKind::NoteOff { .. })
    }

    /// The wire form of this event, if it has one. Time signatures are meta
    /// events with no short-message encoding and are display-only.
    pub fn to_message(&self, channel: u8) -> Option<MidiMessage> {
        match self {
            EventKind::NoteOn { note, velocity } => Some(MidiMessage::NoteOn {
                channel,
                note: *note,
                velocity: *velocity,
            }),
            EventKind::NoteOff { note, velocity } => Some(MidiMessage::NoteOff {
                channel,
                note: *note,
                velocity: *velocity,
            }),
            EventKind::TimeSignature { .. } => None,
            EventKind::Other(msg) => Some(msg.clone()),
        }
    }
}

/// One event in a track: an absolute tick timestamp, a channel, and a payload.
/// Immutable once appended to a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedEvent {
    pub absolute_time: u64,
    pub channel: u8,
    pub kind: EventKind,
}

impl fmt::Display for SequencedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EventKind::NoteOn { note, velocity } => {
                write!(
                    f,
                    "NoteOn ch={} note={} vel={}",
                    self.channel, note, velocity
                )
            }
            EventKind::NoteOff { note, velocity } => {
                write!(
                    f,
                    "NoteOff ch={} note={} vel={}",
                    self.channel, note, velocity
                )
            }
            EventKind::TimeSignature {
                numerator,
                denominator_exp,
            } => {
                let sig = TimeSignature {
                    numerator: *numerator,
                    denominator_exp: *denominator_exp,
                };
                write!(f, "TimeSignature {}", sig)
            }
            EventKind::Other(msg) => write!(f, "{:?}", msg),
        }
    }
}

/// An ordered sequence of MIDI events at a fixed resolution.
pub struct EventSequence {
    resolution: u16,
    tracks: Vec<Vec<SequencedEvent>>,
    sealed: bool,
}

impl EventSequence {
    /// Creates an empty sequence with a single track.
    pub fn new(resolution: u16) -> Result<Self, SequenceError> {
        if resolution == 0 {
            return Err(SequenceError::Configuration(
                "ticks per quarter note must be positive".to_string(),
            ));
        }
        Ok(EventSequence {
            resolution,
            tracks: vec![Vec::new()],
            sealed: false,
        })
    }

    pub fn resolution(&self) -> u16 {
        self.resolution
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn tracks(&self) -> &[Vec<SequencedEvent>] {
        &self.tracks
    }

    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(Vec::len).sum()
    }

    /// Adds an empty track and returns its index.
    pub fn add_track(&mut self) -> usize {
        self.tracks.push(Vec::new());
        self.tracks.len() - 1
    }

    /// Appends an event to a track. Events are immutable once appended; the
    /// time ordering invariant is enforced later, at seal time.
    pub fn append(&mut self, track: usize, event: SequencedEvent) -> Result<(), SequenceError> {
        if self.sealed {
            return Err(SequenceError::Integrity(
                "cannot append to a sealed sequence".to_string(),
            ));
        }
        let track = self.tracks.get_mut(track).ok_or_else(|| {
            SequenceError::Configuration(format!("no such track: {}", track))
        })?;
        track.push(event);
        Ok(())
    }

    /// Seals the sequence, validating that absolute times are non-decreasing
    /// within each track. A sealed sequence can be exported or played back
    /// but no longer appended to.
    pub fn seal(&mut self) -> Result<(), SequenceError> {
        for (index, track) in self.tracks.iter().enumerate() {
            for pair in track.windows(2) {
                if pair[1].absolute_time < pair[0].absolute_time {
                    return Err(SequenceError::Integrity(format!(
                        "track {}: absolute time {} follows {}",
                        index, pair[1].absolute_time, pair[0].absolute_time
                    )));
                }
            }
        }
        self.sealed = true;
        Ok(())
    }

    /// The sequence-wide time signature: the first signature event found in
    /// the first track, applied uniformly regardless of its own tick
    /// position. Multi-signature performances would need a per-range lookup;
    /// this matches the single-signature files the tool deals with.
    pub fn initial_time_signature(&self) -> Option<TimeSignature> {
        self.tracks.first()?.iter().find_map(|event| match event.kind {
            EventKind::TimeSignature {
                numerator,
                denominator_exp,
            } => Some(TimeSignature {
                numerator,
                denominator_exp,
            }),
            _ => None,
        })
    }
}
