use miditape::midi::{midir_engine::MidirEngine, MidiEngine, MidiError, MidiMessage, MockMidiEngine};
use std::error::Error;

#[test]
fn test_system_message_parsing() {
    assert_eq!(
        MidirEngine::parse_midi_message(&[0xF8]),
        Some(MidiMessage::Clock)
    );
    assert_eq!(
        MidirEngine::parse_midi_message(&[0xFA]),
        Some(MidiMessage::Start)
    );
    assert_eq!(
        MidirEngine::parse_midi_message(&[0xFC]),
        Some(MidiMessage::Stop)
    );
    assert_eq!(
        MidirEngine::parse_midi_message(&[0xFB]),
        Some(MidiMessage::Continue)
    );
    assert_eq!(
        MidirEngine::parse_midi_message(&[0xFE]),
        Some(MidiMessage::ActiveSensing)
    );
}

#[test]
fn test_channel_message_parsing() {
    assert_eq!(
        MidirEngine::parse_midi_message(&[0x90, 60, 100]),
        Some(MidiMessage::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100
        })
    );
    assert_eq!(
        MidirEngine::parse_midi_message(&[0x83, 60, 0]),
        Some(MidiMessage::NoteOff {
            channel: 3,
            note: 60,
            velocity: 0
        })
    );
    assert_eq!(
        MidirEngine::parse_midi_message(&[0xB0, 7, 100]),
        Some(MidiMessage::ControlChange {
            channel: 0,
            controller: 7,
            value: 100
        })
    );
    assert_eq!(
        MidirEngine::parse_midi_message(&[0xC1, 42]),
        Some(MidiMessage::ProgramChange {
            channel: 1,
            program: 42
        })
    );

    // Truncated and unknown data is unparseable, not a panic.
    assert_eq!(MidirEngine::parse_midi_message(&[]), None);
    assert_eq!(MidirEngine::parse_midi_message(&[0x90, 60]), None);
    assert_eq!(MidirEngine::parse_midi_message(&[0xF0]), None);
}

#[test]
fn test_message_byte_round_trip() {
    let messages = [
        MidiMessage::NoteOn {
            channel: 2,
            note: 50,
            velocity: 100,
        },
        MidiMessage::NoteOff {
            channel: 2,
            note: 50,
            velocity: 0,
        },
        MidiMessage::ControlChange {
            channel: 5,
            controller: 1,
            value: 64,
        },
        MidiMessage::ProgramChange {
            channel: 9,
            program: 12,
        },
        MidiMessage::Clock,
        MidiMessage::ActiveSensing,
        MidiMessage::Start,
        MidiMessage::Stop,
        MidiMessage::Continue,
    ];

    for msg in messages {
        let bytes = MidirEngine::message_to_bytes(&msg);
        assert_eq!(MidirEngine::parse_midi_message(&bytes), Some(msg));
    }
}

#[test]
fn test_system_chatter_classification() {
    assert!(MidiMessage::Clock.is_system_chatter());
    assert!(MidiMessage::ActiveSensing.is_system_chatter());
    assert!(!MidiMessage::Start.is_system_chatter());
    assert!(!MidiMessage::NoteOn {
        channel: 0,
        note: 60,
        velocity: 100
    }
    .is_system_chatter());
}

#[test]
fn test_midi_error_display() {
    let send_error = MidiError::SendError("Failed to send".to_string());
    let recv_error = MidiError::RecvError("Failed to receive".to_string());
    let conn_error = MidiError::ConnectionError("Failed to connect".to_string());

    assert_eq!(send_error.to_string(), "MIDI send error: Failed to send");
    assert_eq!(
        recv_error.to_string(),
        "MIDI receive error: Failed to receive"
    );
    assert_eq!(
        conn_error.to_string(),
        "MIDI connection error: Failed to connect"
    );
}

#[test]
fn test_midi_error_as_error() {
    let error = MidiError::SendError("test error".to_string());
    let _: &dyn Error = &error; // Verify it implements Error trait
}

#[test]
fn test_mock_engine_drains_script_then_errors() {
    let mut engine = MockMidiEngine::with_script(vec![MidiMessage::Clock, MidiMessage::Start]);

    assert_eq!(engine.recv().unwrap(), MidiMessage::Clock);
    assert_eq!(engine.recv().unwrap(), MidiMessage::Start);
    assert!(matches!(engine.recv(), Err(MidiError::RecvError(_))));
}

#[test]
fn test_mock_engine_records_sends() {
    let mut engine = MockMidiEngine::new();
    let msg = MidiMessage::NoteOn {
        channel: 0,
        note: 60,
        velocity: 100,
    };
    engine.send(msg.clone()).unwrap();
    assert_eq!(engine.sent_messages(), vec![msg]);
}

#[test]
fn test_mock_device_listing() {
    let devices = MockMidiEngine::list_input_devices();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0], "Mock Device 1");
    assert_eq!(devices[1], "Mock Device 2");
}
