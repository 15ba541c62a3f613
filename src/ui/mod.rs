//! Terminal status display
//!
//! This module provides the terminal-side view of a running session:
//! - A capture status spinner (event count plus last recorded position)
//! - The inspector loop that refreshes it from shared session state
//!
//! The display is built using the indicatif library.

mod inspector;
mod progress;

pub use inspector::run_session_inspector;
pub use progress::create_session_spinner;
