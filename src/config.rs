//! Compiled defaults shared by the capture and replay paths.

/// Capture resolution in ticks per quarter note. Captured deltas are
/// measured in milliseconds and stored as ticks one for one.
pub const DEFAULT_RESOLUTION: u16 = 120;

/// Length assigned to captured notes, in ticks. Live input only tells us
/// when a key went down; the matching note-off is synthesized this far after.
pub const DEFAULT_NOTE_LENGTH_TICKS: u64 = 100;

/// Velocity for synthesized note-offs.
pub const NOTE_OFF_VELOCITY: u8 = 0;

/// Capacity of the queue between the device reader thread and the recorder.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// A dispatch later than its deadline by more than this is logged as an
/// overrun.
pub const UNDERRUN_TOLERANCE_MS: u64 = 10;

/// Refresh interval for the capture status spinner, in milliseconds.
pub const INSPECTOR_REFRESH_MS: u64 = 100;
