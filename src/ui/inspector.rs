use super::progress::create_session_spinner;
use crate::config::INSPECTOR_REFRESH_MS;
use crate::SharedSession;
use crossbeam::channel::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Refreshes a status spinner from shared session state until told to stop.
pub fn run_session_inspector(state: SharedSession, stop_rx: Receiver<()>) {
    let spinner = create_session_spinner("Capture");
    let refresh = Duration::from_millis(INSPECTOR_REFRESH_MS);

    loop {
        match stop_rx.recv_timeout(refresh) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                let count = state.events_recorded();
                let message = match state.last_position() {
                    Some(position) => format!("{} events, last at {}", count, position),
                    None => format!("{} events", count),
                };
                spinner.set_message(message);
                spinner.tick();
            }
        }
    }

    spinner.finish_and_clear();
}
