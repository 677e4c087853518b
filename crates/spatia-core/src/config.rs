//! Engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum number of simultaneously rendered sources.
pub const MAX_SOURCES: usize = 8;

/// Rate at which the impulse response dataset was measured.
pub const HRIR_SAMPLE_RATE: f64 = 44100.0;

pub const DEFAULT_SPEED_OF_SOUND: f32 = 343.0;
pub const MIN_SPEED_OF_SOUND: f32 = 0.1;
pub const MAX_SPEED_OF_SOUND: f32 = 500.0;

/// Filter interpolation quality.
///
/// `Realtime` snaps to the nearest distance step, `Offline` interpolates
/// between the two bracketing steps. `AutoDetect` follows the host's
/// offline-render flag each block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingMode {
    Realtime,
    Offline,
    #[default]
    AutoDetect,
}

impl ProcessingMode {
    /// Resolves `AutoDetect` against the host's render state.
    pub fn resolve(self, host_is_offline: bool) -> ProcessingMode {
        match self {
            ProcessingMode::AutoDetect if host_is_offline => ProcessingMode::Offline,
            ProcessingMode::AutoDetect => ProcessingMode::Realtime,
            mode => mode,
        }
    }

    pub fn as_index(self) -> u32 {
        match self {
            ProcessingMode::Realtime => 0,
            ProcessingMode::Offline => 1,
            ProcessingMode::AutoDetect => 2,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(ProcessingMode::Realtime),
            1 => Some(ProcessingMode::Offline),
            2 => Some(ProcessingMode::AutoDetect),
            _ => None,
        }
    }
}

/// Configuration for the rendering engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Host sample rate in Hz.
    pub sample_rate: f64,
    /// Largest block the host will deliver.
    pub max_block_size: usize,
    /// Number of render slots allocated up front.
    pub max_sources: usize,
    /// Gain applied to the summed wet signal.
    pub output_gain: f32,
    pub speed_of_sound: f32,
    /// Longest propagation delay the doppler line can represent.
    pub max_doppler_delay_secs: f32,
    pub max_undo_steps: usize,
    pub processing_mode: ProcessingMode,
    /// Impulse response file. `None` renders with a silent dataset.
    pub dataset_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            max_block_size: 512,
            max_sources: MAX_SOURCES,
            output_gain: 0.18,
            speed_of_sound: DEFAULT_SPEED_OF_SOUND,
            max_doppler_delay_secs: 1.0,
            max_undo_steps: 100,
            processing_mode: ProcessingMode::default(),
            dataset_path: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate < 8000.0 || self.sample_rate > 384000.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.max_block_size == 0 {
            return Err(Error::InvalidConfig("max_block_size must be non-zero".into()));
        }
        if self.max_sources == 0 || self.max_sources > MAX_SOURCES {
            return Err(Error::InvalidConfig(format!(
                "max_sources {} out of range (1-{})",
                self.max_sources, MAX_SOURCES
            )));
        }
        if !(MIN_SPEED_OF_SOUND..=MAX_SPEED_OF_SOUND).contains(&self.speed_of_sound) {
            return Err(Error::InvalidConfig(format!(
                "speed_of_sound {} out of range ({}-{})",
                self.speed_of_sound, MIN_SPEED_OF_SOUND, MAX_SPEED_OF_SOUND
            )));
        }
        if !(self.max_doppler_delay_secs > 0.0 && self.max_doppler_delay_secs <= 10.0) {
            return Err(Error::InvalidConfig(format!(
                "max_doppler_delay_secs {} out of range (0-10 s]",
                self.max_doppler_delay_secs
            )));
        }
        if !self.output_gain.is_finite() || self.output_gain < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "output_gain {} must be finite and non-negative",
                self.output_gain
            )));
        }
        Ok(())
    }
}

/// Clamps a requested speed of sound into the supported range.
pub fn clamp_speed_of_sound(value: f32) -> f32 {
    if value.is_nan() {
        return DEFAULT_SPEED_OF_SOUND;
    }
    value.clamp(MIN_SPEED_OF_SOUND, MAX_SPEED_OF_SOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.max_sources, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_sample_rate() {
        let config = EngineConfig {
            sample_rate: 1000.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_too_many_sources() {
        let config = EngineConfig {
            max_sources: 9,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_speed_of_sound_clamp() {
        assert_eq!(clamp_speed_of_sound(1000.0), MAX_SPEED_OF_SOUND);
        assert_eq!(clamp_speed_of_sound(0.0), MIN_SPEED_OF_SOUND);
        assert_eq!(clamp_speed_of_sound(f32::NAN), DEFAULT_SPEED_OF_SOUND);
    }

    #[test]
    fn test_processing_mode_resolve() {
        assert_eq!(
            ProcessingMode::AutoDetect.resolve(true),
            ProcessingMode::Offline
        );
        assert_eq!(
            ProcessingMode::AutoDetect.resolve(false),
            ProcessingMode::Realtime
        );
        assert_eq!(ProcessingMode::Offline.resolve(false), ProcessingMode::Offline);
        assert_eq!(ProcessingMode::from_index(3), None);
    }
}
