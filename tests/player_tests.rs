use crossbeam::channel::bounded;
use miditape::midi::{MidiEngine, MidiError, MidiMessage, MockMidiEngine};
use miditape::player::{run_playback, PlaybackError, PlaybackOptions, SendPolicy};
use miditape::sequence::{EventKind, EventSequence, SequencedEvent};
use std::thread;
use std::time::{Duration, Instant};

fn sealed_sequence(times: &[u64]) -> EventSequence {
    let mut sequence = EventSequence::new(120).unwrap();
    for &t in times {
        sequence
            .append(
                0,
                SequencedEvent {
                    absolute_time: t,
                    channel: 0,
                    kind: EventKind::NoteOn {
                        note: 60,
                        velocity: 100,
                    },
                },
            )
            .unwrap();
    }
    sequence.seal().unwrap();
    sequence
}

#[test]
fn test_pacing_matches_absolute_times() {
    let sequence = sealed_sequence(&[0, 100, 100, 250]);
    let mut engine = MockMidiEngine::new();
    let (_stop_tx, stop_rx) = bounded(1);

    let start = Instant::now();
    let summary =
        run_playback(&mut engine, &sequence, &PlaybackOptions::default(), stop_rx).unwrap();
    let span = start.elapsed();

    assert_eq!(summary.dispatched, 4);
    assert_eq!(summary.skipped, 0);
    assert!(!summary.cancelled);

    // Total span tracks the last event's offset, within scheduler tolerance.
    assert!(span >= Duration::from_millis(250), "span was {:?}", span);
    assert!(span < Duration::from_millis(450), "span was {:?}", span);

    let sent = engine.sent();
    assert_eq!(sent.len(), 4);
    // Events sharing a timestamp dispatch back to back.
    let same_time_gap = sent[2].0.duration_since(sent[1].0);
    assert!(
        same_time_gap < Duration::from_millis(50),
        "gap was {:?}",
        same_time_gap
    );
    // The 100 → 250 step waits ~150 ms.
    let paced_gap = sent[3].0.duration_since(sent[2].0);
    assert!(
        paced_gap >= Duration::from_millis(100),
        "gap was {:?}",
        paced_gap
    );
}

#[test]
fn test_cancellation_mid_wait() {
    let sequence = sealed_sequence(&[0, 500]);
    let mut engine = MockMidiEngine::new();
    let (stop_tx, stop_rx) = bounded(1);

    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let _ = stop_tx.send(());
    });

    let start = Instant::now();
    let summary =
        run_playback(&mut engine, &sequence, &PlaybackOptions::default(), stop_rx).unwrap();
    let span = start.elapsed();

    // The pending event is never dispatched and the remaining wait is
    // abandoned.
    assert!(summary.cancelled);
    assert_eq!(summary.dispatched, 1);
    assert!(span < Duration::from_millis(400), "span was {:?}", span);
}

#[test]
fn test_unsealed_sequence_rejected() {
    let sequence = EventSequence::new(120).unwrap();
    let mut engine = MockMidiEngine::new();
    let (_stop_tx, stop_rx) = bounded(1);

    let result = run_playback(&mut engine, &sequence, &PlaybackOptions::default(), stop_rx);
    assert!(matches!(result, Err(PlaybackError::Unsealed)));
}

struct FailingEngine;

impl MidiEngine for FailingEngine {
    fn send(&mut self, _msg: MidiMessage) -> miditape::midi::Result<()> {
        Err(MidiError::SendError("no devices available".to_string()))
    }

    fn recv(&mut self) -> miditape::midi::Result<MidiMessage> {
        Err(MidiError::RecvError("no devices available".to_string()))
    }
}

#[test]
fn test_skip_policy_keeps_going() {
    let sequence = sealed_sequence(&[0, 10]);
    let mut engine = FailingEngine;
    let (_stop_tx, stop_rx) = bounded(1);

    let summary =
        run_playback(&mut engine, &sequence, &PlaybackOptions::default(), stop_rx).unwrap();
    assert_eq!(summary.dispatched, 0);
    assert_eq!(summary.skipped, 2);
}

#[test]
fn test_abort_policy_stops_on_first_failure() {
    let sequence = sealed_sequence(&[0, 10]);
    let mut engine = FailingEngine;
    let (_stop_tx, stop_rx) = bounded(1);

    let options = PlaybackOptions {
        policy: SendPolicy::Abort,
        announce: false,
    };
    let result = run_playback(&mut engine, &sequence, &options, stop_rx);
    assert!(matches!(result, Err(PlaybackError::Device(_))));
}

#[test]
fn test_dropped_stop_channel_still_paces() {
    let sequence = sealed_sequence(&[0, 100]);
    let mut engine = MockMidiEngine::new();
    let (stop_tx, stop_rx) = bounded(1);
    drop(stop_tx);

    let start = Instant::now();
    let summary =
        run_playback(&mut engine, &sequence, &PlaybackOptions::default(), stop_rx).unwrap();

    assert_eq!(summary.dispatched, 2);
    assert!(!summary.cancelled);
    assert!(start.elapsed() >= Duration::from_millis(100));
}
