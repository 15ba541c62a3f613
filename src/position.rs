//! Conversion from absolute tick counts to bar:beat:tick positions.
//!
//! The conversion is a pure function of the tick count, the sequence
//! resolution (ticks per quarter note) and the active time signature. With no
//! signature the sequence is assumed to be in common time (4/4).

use std::error::Error;
use std::fmt;

/// A time signature: beats per bar plus the bar unit as a power of two.
///
/// `denominator_exp` follows the MIDI file convention of storing the
/// denominator as an exponent, so 3/4 is `numerator: 3, denominator_exp: 2`
/// and 6/8 is `numerator: 6, denominator_exp: 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator_exp: u8,
}

impl TimeSignature {
    /// Common time, the fallback when a sequence carries no signature event.
    pub const COMMON_TIME: TimeSignature = TimeSignature {
        numerator: 4,
        denominator_exp: 2,
    };
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON_TIME
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match 1u64.checked_shl(u32::from(self.denominator_exp)) {
            Some(denominator) => write!(f, "{}/{}", self.numerator, denominator),
            None => write!(f, "{}/2^{}", self.numerator, self.denominator_exp),
        }
    }
}

/// A musical position derived from an absolute tick count.
///
/// `bar` and `beat` are 1-indexed, `tick` is the 0-indexed remainder within
/// the beat. Positions are derived on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicalPosition {
    pub bar: u64,
    pub beat: u64,
    pub tick: u64,
}

impl fmt::Display for MusicalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.bar, self.beat, self.tick)
    }
}

/// Precondition violations for position conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    /// Resolution (ticks per quarter note) must be positive
    ZeroResolution,
    /// Signature declares zero beats per bar
    ZeroBeatSignature,
    /// Signature and resolution combine into a bar or beat of zero ticks
    DegenerateSignature,
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionError::ZeroResolution => {
                write!(f, "ticks per quarter note must be positive")
            }
            PositionError::ZeroBeatSignature => {
                write!(f, "time signature has zero beats per bar")
            }
            PositionError::DegenerateSignature => {
                write!(f, "time signature yields a bar or beat of zero ticks")
            }
        }
    }
}

impl Error for PositionError {}

/// Converts an absolute tick count to a bar:beat:tick position.
///
/// All divisions are integer divisions on non-negative operands. When
/// `ticks_per_bar` is not evenly divisible by the beat count the quotient is
/// truncated; positions computed against such odd signatures drift by the
/// truncated remainder within each bar.
pub fn musical_position(
    event_time: u64,
    ticks_per_quarter_note: u32,
    signature: Option<TimeSignature>,
) -> Result<MusicalPosition, PositionError> {
    if ticks_per_quarter_note == 0 {
        return Err(PositionError::ZeroResolution);
    }

    let sig = signature.unwrap_or_default();
    if sig.numerator == 0 {
        return Err(PositionError::ZeroBeatSignature);
    }

    let whole_note_ticks = u64::from(ticks_per_quarter_note) * 4;
    let beats_per_bar = u64::from(sig.numerator);
    let ticks_per_bar = (beats_per_bar * whole_note_ticks)
        .checked_shr(u32::from(sig.denominator_exp))
        .unwrap_or(0);

    if ticks_per_bar == 0 {
        return Err(PositionError::DegenerateSignature);
    }
    let ticks_per_beat = ticks_per_bar / beats_per_bar;
    if ticks_per_beat == 0 {
        return Err(PositionError::DegenerateSignature);
    }

    Ok(MusicalPosition {
        bar: 1 + event_time / ticks_per_bar,
        beat: 1 + (event_time % ticks_per_bar) / ticks_per_beat,
        tick: event_time % ticks_per_beat,
    })
}
