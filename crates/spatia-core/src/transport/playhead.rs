//! Host transport values consumed once per block.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn validated(numerator: u32, denominator: u32) -> Result<Self> {
        if numerator == 0 || denominator == 0 || !denominator.is_power_of_two() {
            return Err(Error::InvalidTimeSignature {
                numerator,
                denominator,
            });
        }
        Ok(Self::new(numerator, denominator))
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::new(4, 4)
    }
}

/// Snapshot of the host's playhead for the current block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostPlayhead {
    /// Host timeline position at the first sample of the block.
    pub time_secs: f64,
    pub is_playing: bool,
    pub bpm: f64,
    pub time_signature: TimeSignature,
    /// Host is bouncing faster than real time.
    pub is_offline: bool,
}

impl HostPlayhead {
    pub fn playing_at(time_secs: f64) -> Self {
        Self {
            time_secs,
            is_playing: true,
            ..Self::default()
        }
    }

    pub fn stopped_at(time_secs: f64) -> Self {
        Self {
            time_secs,
            is_playing: false,
            ..Self::default()
        }
    }
}

impl Default for HostPlayhead {
    fn default() -> Self {
        Self {
            time_secs: 0.0,
            is_playing: false,
            bpm: 120.0,
            time_signature: TimeSignature::default(),
            is_offline: false,
        }
    }
}

/// Bar / beat / fraction display of a time in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MusicalTime {
    /// 1-based measure.
    pub measure: i64,
    /// 1-based beat within the measure.
    pub beat: u32,
    /// Progress through the current beat, in `[0, 1)`.
    pub fraction: f64,
}

impl MusicalTime {
    pub fn from_seconds(secs: f64, bpm: f64, time_signature: TimeSignature) -> Result<Self> {
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(Error::InvalidTempo(bpm));
        }
        let numerator = time_signature.numerator.max(1) as f64;
        let beat_unit = time_signature.denominator as f64 * 0.25;
        let beats = bpm / 60.0 * secs * beat_unit;

        let measure = (beats / numerator).floor() as i64 + 1;
        let beat_in_measure = beats.rem_euclid(numerator);
        Ok(Self {
            measure,
            beat: beat_in_measure.floor() as u32 + 1,
            fraction: beat_in_measure - beat_in_measure.floor(),
        })
    }
}
