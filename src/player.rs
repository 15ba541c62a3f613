//! Paced replay of a sealed event sequence.
//!
//! Each event is dispatched no earlier than `absolute_time` milliseconds
//! after playback start, measured against a monotonic clock so system time
//! adjustments cannot skew pacing. Waits are cancellable: a stop signal
//! received mid-wait aborts playback without dispatching the pending event.

use crate::config::UNDERRUN_TOLERANCE_MS;
use crate::midi::{MidiEngine, MidiError};
use crate::position::{musical_position, PositionError};
use crate::sequence::EventSequence;
use crossbeam::channel::{never, Receiver, RecvTimeoutError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};

/// What to do when the output sink rejects a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPolicy {
    /// Log the failure and keep going; later waits are unaffected.
    Skip,
    /// Abort playback on the first failed send.
    Abort,
}

pub struct PlaybackOptions {
    pub policy: SendPolicy,
    /// Print each non-NoteOff event's musical position to stdout.
    pub announce: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        PlaybackOptions {
            policy: SendPolicy::Skip,
            announce: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct PlaybackSummary {
    pub dispatched: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

#[derive(Debug)]
pub enum PlaybackError {
    /// The sequence was not sealed before playback
    Unsealed,
    /// The sequence's resolution or signature cannot produce positions
    Position(PositionError),
    /// A send failed under [`SendPolicy::Abort`]
    Device(MidiError),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::Unsealed => write!(f, "sequence must be sealed before playback"),
            PlaybackError::Position(e) => write!(f, "cannot render positions: {}", e),
            PlaybackError::Device(e) => write!(f, "playback aborted: {}", e),
        }
    }
}

impl Error for PlaybackError {}

impl From<PositionError> for PlaybackError {
    fn from(err: PositionError) -> Self {
        PlaybackError::Position(err)
    }
}

/// Waits until `target`, returning true if a stop signal arrived first.
fn wait_until(target: Instant, stop_rx: &mut Receiver<()>) -> bool {
    loop {
        let now = Instant::now();
        let remaining = match target.checked_duration_since(now) {
            Some(remaining) => remaining,
            None => return false,
        };
        match stop_rx.recv_timeout(remaining) {
            Ok(()) => return true,
            Err(RecvTimeoutError::Timeout) => return false,
            // No controller is attached; fall back to plain timed waiting.
            Err(RecvTimeoutError::Disconnected) => *stop_rx = never(),
        }
    }
}

/// Replays a sealed sequence into a MIDI engine.
///
/// Tracks are iterated in order against a single pacing baseline, which is
/// musically correct for pre-merged (type 0) sequences; events of a later
/// track whose deadline already passed are dispatched immediately.
pub fn run_playback<T: MidiEngine>(
    engine: &mut T,
    sequence: &EventSequence,
    options: &PlaybackOptions,
    stop_rx: Receiver<()>,
) -> Result<PlaybackSummary, PlaybackError> {
    if !sequence.is_sealed() {
        return Err(PlaybackError::Unsealed);
    }

    let resolution = u32::from(sequence.resolution());
    let signature = sequence.initial_time_signature();
    // Surface degenerate resolution/signature combinations before the first
    // dispatch rather than mid-playback.
    musical_position(0, resolution, signature)?;

    let mut stop_rx = stop_rx;
    let mut summary = PlaybackSummary::default();
    let start = Instant::now();
    info!(
        "Playback started: {} events across {} tracks at {} tpqn",
        sequence.event_count(),
        sequence.tracks().len(),
        resolution
    );

    for track in sequence.tracks() {
        for event in track {
            let target = start + Duration::from_millis(event.absolute_time);
            if wait_until(target, &mut stop_rx) {
                info!("Playback cancelled");
                summary.cancelled = true;
                return Ok(summary);
            }

            let lateness = Instant::now().saturating_duration_since(target);
            if lateness.as_millis() as u64 > UNDERRUN_TOLERANCE_MS {
                warn!(
                    "Dispatching {} ms late at tick {}",
                    lateness.as_millis(),
                    event.absolute_time
                );
            }

            if !event.kind.is_note_off() {
                let position = musical_position(event.absolute_time, resolution, signature)?;
                info!("{} {}", position, event);
                if options.announce {
                    println!("{} {}", position, event);
                }
            }

            if let Some(msg) = event.kind.to_message(event.channel) {
                match engine.send(msg) {
                    Ok(()) => summary.dispatched += 1,
                    Err(e) => match options.policy {
                        SendPolicy::Skip => {
                            error!("Send failed, skipping event: {}", e);
                            summary.skipped += 1;
                        }
                        SendPolicy::Abort => return Err(PlaybackError::Device(e)),
                    },
                }
            }
        }
    }

    info!(
        "Playback finished: {} dispatched, {} skipped",
        summary.dispatched, summary.skipped
    );
    Ok(summary)
}
