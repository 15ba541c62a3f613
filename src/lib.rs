pub mod cli;
pub mod config;
pub mod logging;
pub mod midi;
pub mod player;
pub mod position;
pub mod recorder;
pub mod scheduler;
pub mod sequence;
pub mod smf;
pub mod state;
pub mod ui;

pub use scheduler::{Scheduler, ThreadScheduler};
pub use state::SessionState;

use std::sync::Arc;

/// Session status shared between a capture/replay loop and the UI inspector.
pub type SharedSession = Arc<SessionState>;

pub fn create_session_state() -> SharedSession {
    Arc::new(SessionState::new())
}

pub fn create_scheduler() -> ThreadScheduler {
    ThreadScheduler::new()
}

pub fn handle_input_device_list() -> Vec<String> {
    #[cfg(feature = "test-mock")]
    {
        midi::MockMidiEngine::list_input_devices()
    }
    #[cfg(not(feature = "test-mock"))]
    {
        midi::MidirEngine::list_input_devices()
    }
}

pub fn handle_output_device_list() -> Vec<String> {
    #[cfg(feature = "test-mock")]
    {
        midi::MockMidiEngine::list_output_devices()
    }
    #[cfg(not(feature = "test-mock"))]
    {
        midi::MidirEngine::list_output_devices()
    }
}
