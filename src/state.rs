//! Shared session status read by the UI inspector while a capture or replay
//! loop runs on another thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

pub struct SessionState {
    events_recorded: AtomicU64,
    is_active: AtomicBool,
    last_position: Mutex<Option<String>>,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            events_recorded: AtomicU64::new(0),
            is_active: AtomicBool::new(false),
            last_position: Mutex::new(None),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, active: bool) {
        self.is_active.store(active, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    /// Bumps the recorded-event counter and remembers the rendered position
    /// for display.
    pub fn note_event(&self, position: String) {
        self.events_recorded.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_position.lock() {
            *last = Some(position);
        }
    }

    pub fn events_recorded(&self) -> u64 {
        self.events_recorded.load(Ordering::SeqCst)
    }

    pub fn last_position(&self) -> Option<String> {
        match self.last_position.lock() {
            Ok(last) => last.clone(),
            Err(_) => None,
        }
    }
}
