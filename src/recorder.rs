//! Live event capture.
//!
//! A [`CaptureSession`] timestamps qualifying incoming messages against a
//! monotonic clock: each recorded event's absolute time is the cumulative
//! elapsed wall-clock time (in milliseconds, stored as ticks) since the
//! session started, accumulated as deltas between recorded events.
//!
//! [`run_recorder`] wires a session to a [`MidiEngine`]: a reader thread
//! pushes (message, arrival instant) pairs into a bounded queue and the
//! recorder loop is its single consumer, so state updates happen one at a
//! time in arrival order.

use crate::config::{DEFAULT_NOTE_LENGTH_TICKS, EVENT_QUEUE_CAPACITY, NOTE_OFF_VELOCITY};
use crate::midi::{MidiEngine, MidiMessage};
use crate::position::musical_position;
use crate::sequence::{EventKind, EventSequence, SequenceError, SequencedEvent};
use crate::SharedSession;
use crossbeam::channel::{bounded, Receiver};
use crossbeam::select;
use log::{debug, error, info, trace};
use std::thread;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Stopped,
}

/// Transient capture state: the running absolute-time accumulator, the last
/// arrival instant, and the sequence under construction. Lives for one
/// capture session and is consumed by [`CaptureSession::stop`].
pub struct CaptureSession {
    state: RecorderState,
    accumulator: u64,
    last_arrival: Option<Instant>,
    sequence: EventSequence,
    note_length: u64,
    pending_offs: Vec<SequencedEvent>,
}

impl CaptureSession {
    pub fn new(resolution: u16) -> Result<Self, SequenceError> {
        Ok(CaptureSession {
            state: RecorderState::Idle,
            accumulator: 0,
            last_arrival: None,
            sequence: EventSequence::new(resolution)?,
            note_length: DEFAULT_NOTE_LENGTH_TICKS,
            pending_offs: Vec::new(),
        })
    }

    pub fn with_note_length(mut self, ticks: u64) -> Self {
        self.note_length = ticks;
        self
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn resolution(&self) -> u16 {
        self.sequence.resolution()
    }

    /// Current value of the absolute-time accumulator, in ticks.
    pub fn absolute_time(&self) -> u64 {
        self.accumulator
    }

    pub fn events_recorded(&self) -> usize {
        self.sequence.event_count()
    }

    /// Arms the clock and enters Recording.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        if self.state != RecorderState::Idle {
            debug!("Ignoring start on a {:?} session", self.state);
            return;
        }
        self.accumulator = 0;
        self.last_arrival = Some(now);
        self.state = RecorderState::Recording;
        info!("Capture session started");
    }

    /// Processes one incoming message, stamping it against the current
    /// instant. Returns the assigned absolute time if the message was
    /// recorded.
    pub fn handle_message(&mut self, msg: &MidiMessage) -> Option<u64> {
        self.handle_message_at(msg, Instant::now())
    }

    /// Clock-injectable variant of [`handle_message`](Self::handle_message);
    /// tests drive it with synthetic instants.
    pub fn handle_message_at(&mut self, msg: &MidiMessage, now: Instant) -> Option<u64> {
        if self.state != RecorderState::Recording {
            return None;
        }

        if msg.is_system_chatter() {
            trace!("Filtered {:?}", msg);
            return None;
        }

        match msg {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => {
                let delta = self
                    .last_arrival
                    .map(|last| now.saturating_duration_since(last))
                    .unwrap_or_default();
                self.accumulator += delta.as_millis() as u64;
                self.last_arrival = Some(now);

                let at = self.accumulator;
                self.flush_pending(at);
                self.append(SequencedEvent {
                    absolute_time: at,
                    channel: *channel,
                    kind: EventKind::NoteOn {
                        note: *note,
                        velocity: *velocity,
                    },
                });
                // Live input only reports the key-down; schedule the matching
                // note-off a fixed length later.
                self.pending_offs.push(SequencedEvent {
                    absolute_time: at + self.note_length,
                    channel: *channel,
                    kind: EventKind::NoteOff {
                        note: *note,
                        velocity: NOTE_OFF_VELOCITY,
                    },
                });
                debug!("Recorded NoteOn note={} at {}", note, at);
                Some(at)
            }
            other => {
                debug!("Ignoring non-recordable message: {:?}", other);
                None
            }
        }
    }

    /// Stops the session, flushes buffered note-offs and seals the sequence.
    pub fn stop(mut self) -> Result<EventSequence, SequenceError> {
        self.state = RecorderState::Stopped;
        self.pending_offs.sort_by_key(|event| event.absolute_time);
        let remaining: Vec<_> = self.pending_offs.drain(..).collect();
        for event in remaining {
            self.append(event);
        }
        self.sequence.seal()?;
        info!(
            "Capture session stopped with {} events",
            self.sequence.event_count()
        );
        Ok(self.sequence)
    }

    /// Appends buffered note-offs due at or before `up_to`, keeping the
    /// track's append order non-decreasing.
    fn flush_pending(&mut self, up_to: u64) {
        if self.pending_offs.is_empty() {
            return;
        }
        self.pending_offs.sort_by_key(|event| event.absolute_time);
        while let Some(first) = self.pending_offs.first() {
            if first.absolute_time > up_to {
                break;
            }
            let event = self.pending_offs.remove(0);
            self.append(event);
        }
    }

    fn append(&mut self, event: SequencedEvent) {
        // The session owns its unsealed sequence and always appends to track
        // 0, so this cannot fail while Recording.
        if let Err(e) = self.sequence.append(0, event) {
            error!("Dropping event: {}", e);
        }
    }
}

/// Runs a capture session against a MIDI engine until a stop signal arrives
/// or the device fails.
///
/// A reader thread stamps each message with its arrival instant and forwards
/// it over a bounded channel; this loop is the single consumer. On device
/// error the loop ends gracefully and the session keeps whatever was
/// accumulated.
pub fn run_recorder<T>(
    mut engine: T,
    session: &mut CaptureSession,
    status: SharedSession,
    stop_rx: Receiver<()>,
) where
    T: MidiEngine + 'static,
{
    let (tx, messages) = bounded::<(MidiMessage, Instant)>(EVENT_QUEUE_CAPACITY);

    thread::spawn(move || loop {
        match engine.recv() {
            Ok(msg) => {
                let arrival = Instant::now();
                if tx.send((msg, arrival)).is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("MIDI engine receive error: {}", e);
                break;
            }
        }
    });

    session.start();
    status.set_active(true);

    loop {
        select! {
            recv(stop_rx) -> _ => {
                info!("Capture stop requested");
                break;
            }
            recv(messages) -> incoming => match incoming {
                Ok((msg, arrival)) => {
                    if let Some(at) = session.handle_message_at(&msg, arrival) {
                        if let Ok(pos) =
                            musical_position(at, u32::from(session.resolution()), None)
                        {
                            status.note_event(pos.to_string());
                        }
                    }
                }
                Err(_) => {
                    info!("MIDI input ended, stopping capture");
                    break;
                }
            }
        }
    }

    status.set_active(false);
}
