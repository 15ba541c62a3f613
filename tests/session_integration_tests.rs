//! Full session lifecycle: capture with an injected clock, export to SMF
//! bytes, import them back and replay into a mock engine.

use crossbeam::channel::bounded;
use miditape::midi::{MidiMessage, MockMidiEngine};
use miditape::player::{run_playback, PlaybackOptions};
use miditape::position::musical_position;
use miditape::recorder::CaptureSession;
use miditape::smf::{export, import};
use std::time::{Duration, Instant};

#[test]
fn test_capture_export_import_replay() {
    let mut session = CaptureSession::new(120).unwrap().with_note_length(40);
    let t0 = Instant::now();
    session.start_at(t0);

    let performance = [
        (100, 60),
        (150, 64),
        (220, 67),
    ];
    for (ms, note) in performance {
        let msg = MidiMessage::NoteOn {
            channel: 0,
            note,
            velocity: 100,
        };
        session.handle_message_at(&msg, t0 + Duration::from_millis(ms));
    }

    let captured = session.stop().unwrap();
    assert_eq!(captured.event_count(), 6);

    let restored = import(&export(&captured).unwrap()).unwrap();
    assert_eq!(restored.resolution(), 120);
    assert_eq!(restored.event_count(), 6);

    // Positions render against the default 4/4 bar of 480 ticks.
    let first = &restored.tracks()[0][0];
    let position = musical_position(
        first.absolute_time,
        u32::from(restored.resolution()),
        restored.initial_time_signature(),
    )
    .unwrap();
    assert_eq!(position.to_string(), "1:1:100");

    let mut engine = MockMidiEngine::new();
    let (_stop_tx, stop_rx) = bounded(1);
    let summary =
        run_playback(&mut engine, &restored, &PlaybackOptions::default(), stop_rx).unwrap();

    assert_eq!(summary.dispatched, 6);
    assert!(!summary.cancelled);

    // The replayed stream opens with the captured notes in order.
    let sent = engine.sent_messages();
    let first_notes: Vec<u8> = sent
        .iter()
        .filter_map(|msg| match msg {
            MidiMessage::NoteOn { note, .. } => Some(*note),
            _ => None,
        })
        .collect();
    assert_eq!(first_notes, vec![60, 64, 67]);
}

#[test]
fn test_captured_times_are_valid_for_replay() {
    // A capture with overlapping synthesized note-offs still seals cleanly.
    let mut session = CaptureSession::new(120).unwrap().with_note_length(100);
    let t0 = Instant::now();
    session.start_at(t0);

    for ms in [10, 20, 30, 40] {
        let msg = MidiMessage::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100,
        };
        session.handle_message_at(&msg, t0 + Duration::from_millis(ms));
    }

    let captured = session.stop().unwrap();
    let track = &captured.tracks()[0];
    for pair in track.windows(2) {
        assert!(pair[0].absolute_time <= pair[1].absolute_time);
    }
    assert_eq!(
        track
            .iter()
            .filter(|event| event.kind.is_note_off())
            .count(),
        4
    );
}
