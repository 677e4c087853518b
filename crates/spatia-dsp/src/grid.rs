//! Measurement grid of the impulse response dataset.

use crate::error::{Error, Result};
use std::f32::consts::{PI, TAU};

/// Dimensions of the measured grid.
///
/// Azimuth is sampled over the full circle in `azimuth_steps` equal steps.
/// Elevation is sampled from straight up to straight down in
/// `elevation_steps` equal steps, giving `elevation_steps + 1` rows where the
/// first and last rows are the poles. Distance steps are spaced evenly over
/// `[min_distance, max_distance]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridShape {
    pub distance_steps: usize,
    pub azimuth_steps: usize,
    pub elevation_steps: usize,
    /// Samples per impulse response.
    pub impulse_length: usize,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for GridShape {
    fn default() -> Self {
        Self {
            distance_steps: 10,
            azimuth_steps: 72,
            elevation_steps: 36,
            impulse_length: 128,
            min_distance: 0.25,
            max_distance: 5.0,
        }
    }
}

impl GridShape {
    pub fn validate(&self) -> Result<()> {
        if self.distance_steps == 0 {
            return Err(Error::InvalidGrid("distance_steps must be non-zero".into()));
        }
        if self.azimuth_steps < 2 || self.azimuth_steps % 2 != 0 {
            return Err(Error::InvalidGrid(format!(
                "azimuth_steps {} must be even and at least 2",
                self.azimuth_steps
            )));
        }
        if self.elevation_steps < 2 {
            return Err(Error::InvalidGrid(format!(
                "elevation_steps {} must be at least 2",
                self.elevation_steps
            )));
        }
        if self.impulse_length == 0 {
            return Err(Error::InvalidGrid("impulse_length must be non-zero".into()));
        }
        if !(self.min_distance > 0.0 && self.max_distance >= self.min_distance) {
            return Err(Error::InvalidGrid(format!(
                "distance range [{}, {}] is invalid",
                self.min_distance, self.max_distance
            )));
        }
        Ok(())
    }

    /// Stored azimuth columns in the mirrored layout (`0..=π`).
    #[inline]
    pub fn mirrored_columns(&self) -> usize {
        self.azimuth_steps / 2 + 1
    }

    /// Elevation rows including both poles.
    #[inline]
    pub fn elevation_rows(&self) -> usize {
        self.elevation_steps + 1
    }

    /// Sample count of a dataset file in the mirrored layout.
    pub fn mirrored_len(&self) -> usize {
        let body = self.distance_steps
            * self.mirrored_columns()
            * (self.elevation_steps - 1)
            * 2
            * self.impulse_length;
        let poles = self.distance_steps * 2 * self.impulse_length;
        body + poles
    }

    /// Sample count of the full layout.
    pub fn full_len(&self) -> usize {
        self.distance_steps * self.azimuth_steps * self.elevation_rows() * 2 * self.impulse_length
    }

    #[inline]
    pub fn azimuth_spacing(&self) -> f32 {
        TAU / self.azimuth_steps as f32
    }

    #[inline]
    pub fn elevation_spacing(&self) -> f32 {
        PI / self.elevation_steps as f32
    }

    /// Fractional distance index, clamped to the grid.
    pub fn distance_index(&self, radius: f32) -> f32 {
        if self.distance_steps == 1 || self.max_distance <= self.min_distance {
            return 0.0;
        }
        let span = self.max_distance - self.min_distance;
        let t = (radius - self.min_distance) / span;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        t * (self.distance_steps - 1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shape_is_valid() {
        assert!(GridShape::default().validate().is_ok());
    }

    #[test]
    fn test_odd_azimuth_steps_rejected() {
        let shape = GridShape {
            azimuth_steps: 7,
            ..GridShape::default()
        };
        assert!(matches!(shape.validate(), Err(Error::InvalidGrid(_))));
    }

    #[test]
    fn test_layout_lengths() {
        let shape = GridShape {
            distance_steps: 2,
            azimuth_steps: 4,
            elevation_steps: 2,
            impulse_length: 3,
            min_distance: 0.5,
            max_distance: 1.5,
        };
        // 2 distances * 3 columns * 1 row * 2 channels * 3 + 2 * 2 poles * 3
        assert_eq!(shape.mirrored_len(), 36 + 12);
        assert_eq!(shape.full_len(), 2 * 4 * 3 * 2 * 3);
    }

    #[test]
    fn test_distance_index_clamps() {
        let shape = GridShape::default();
        assert_eq!(shape.distance_index(0.0), 0.0);
        assert_eq!(shape.distance_index(100.0), 9.0);
        assert_eq!(shape.distance_index(f32::NAN), 0.0);
    }
}
