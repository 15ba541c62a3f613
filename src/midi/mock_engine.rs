use crate::midi::{MidiEngine, MidiError, MidiMessage, Result};
use std::collections::VecDeque;
use std::time::Instant;

/// Scripted in-memory engine for tests.
///
/// `recv` drains a prepared script of incoming messages and errors once it is
/// exhausted, which ends a capture loop the same way a disconnected device
/// would. `send` records every dispatched message with the instant it was
/// sent, so playback tests can assert on pacing.
pub struct MockMidiEngine {
    incoming: VecDeque<MidiMessage>,
    sent: Vec<(Instant, MidiMessage)>,
}

impl MockMidiEngine {
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    pub fn with_script(messages: Vec<MidiMessage>) -> Self {
        MockMidiEngine {
            incoming: messages.into(),
            sent: Vec::new(),
        }
    }

    pub fn sent(&self) -> &[(Instant, MidiMessage)] {
        &self.sent
    }

    pub fn sent_messages(&self) -> Vec<MidiMessage> {
        self.sent.iter().map(|(_, msg)| msg.clone()).collect()
    }

    pub fn list_input_devices() -> Vec<String> {
        vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()]
    }

    pub fn list_output_devices() -> Vec<String> {
        vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()]
    }
}

impl Default for MockMidiEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiEngine for MockMidiEngine {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        self.sent.push((Instant::now(), msg));
        Ok(())
    }

    fn recv(&mut self) -> Result<MidiMessage> {
        self.incoming
            .pop_front()
            .ok_or_else(|| MidiError::RecvError("mock script exhausted".to_string()))
    }
}
