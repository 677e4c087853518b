//! Builder for configuring and constructing a [`Spatia`] instance.

use crate::shared::EngineShared;
use crate::{ControlSurface, Result, Spatia, SpatialProcessor};
use spatia_core::{Arc, EngineConfig, ProcessingMode};
use spatia_dsp::{shared_dataset, GridShape, HrirDataset};
use std::path::PathBuf;

/// Without a dataset path the engine renders with a silent dataset; a path
/// that cannot be read does the same and logs a warning. Instances loading
/// the same file with the same grid share one copy of it.
///
/// # Example
///
/// ```
/// use spatia::prelude::*;
///
/// let spatia = Spatia::builder()
///     .sample_rate(48000.0)
///     .max_block_size(256)
///     .build()?;
///
/// let (mut processor, mut control) = spatia.split();
/// control.add_source(Vec3::new(0.0, 0.0, 1.0));
///
/// let input = [0.0f32; 256];
/// let mut left = [0.0f32; 256];
/// let mut right = [0.0f32; 256];
/// processor.process_block(&[&input], [&mut left, &mut right], &HostPlayhead::default());
/// # Ok::<(), spatia::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SpatiaBuilder {
    config: EngineConfig,
    grid: GridShape,
    dataset: Option<Arc<HrirDataset>>,
}

impl SpatiaBuilder {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 44100 Hz
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 512. Larger host blocks still work but reallocate on the
    /// audio thread.
    pub fn max_block_size(mut self, samples: usize) -> Self {
        self.config.max_block_size = samples;
        self
    }

    pub fn max_sources(mut self, count: usize) -> Self {
        self.config.max_sources = count;
        self
    }

    /// Default: 0.18, which renders the default source at about input level.
    pub fn output_gain(mut self, gain: f32) -> Self {
        self.config.output_gain = gain;
        self
    }

    pub fn speed_of_sound(mut self, metres_per_sec: f32) -> Self {
        self.config.speed_of_sound = metres_per_sec;
        self
    }

    pub fn max_doppler_delay_secs(mut self, secs: f32) -> Self {
        self.config.max_doppler_delay_secs = secs;
        self
    }

    pub fn max_undo_steps(mut self, steps: usize) -> Self {
        self.config.max_undo_steps = steps;
        self
    }

    pub fn processing_mode(mut self, mode: ProcessingMode) -> Self {
        self.config.processing_mode = mode;
        self
    }

    /// File to load impulse responses from.
    pub fn dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dataset_path = Some(path.into());
        self
    }

    /// Layout of the dataset file. Default: [`GridShape::default`].
    pub fn grid(mut self, grid: GridShape) -> Self {
        self.grid = grid;
        self
    }

    /// Uses an already loaded dataset instead of reading a file.
    pub fn dataset(mut self, dataset: Arc<HrirDataset>) -> Self {
        self.dataset = Some(dataset);
        self
    }

    pub fn build(self) -> Result<Spatia> {
        self.config.validate()?;
        let dataset = match self.dataset {
            Some(dataset) => dataset,
            None => {
                self.grid.validate()?;
                shared_dataset(self.config.dataset_path.as_deref(), self.grid)
            }
        };
        tracing::info!(
            "Building renderer at {} Hz, {} sample blocks, {} source slots",
            self.config.sample_rate,
            self.config.max_block_size,
            self.config.max_sources
        );

        let shared = Arc::new(EngineShared::new(self.config));
        let processor = SpatialProcessor::new(Arc::clone(&shared), dataset);
        let control = ControlSurface::new(shared);
        Ok(Spatia::from_parts(processor, control))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_invalid_config_rejected() {
        let err = Spatia::builder().sample_rate(10.0).build().unwrap_err();
        assert!(matches!(err, Error::Core(_)));
        let err = Spatia::builder().max_sources(0).build().unwrap_err();
        assert!(matches!(err, Error::Core(_)));
    }

    #[test]
    fn test_invalid_grid_rejected() {
        let grid = GridShape {
            azimuth_steps: 7,
            ..GridShape::default()
        };
        let err = Spatia::builder().grid(grid).build().unwrap_err();
        assert!(matches!(err, Error::Dsp(_)));
    }

    #[test]
    fn test_missing_dataset_renders_silence() {
        let grid = GridShape {
            distance_steps: 2,
            azimuth_steps: 4,
            elevation_steps: 4,
            impulse_length: 8,
            min_distance: 0.5,
            max_distance: 1.5,
        };
        let spatia = Spatia::builder()
            .grid(grid)
            .dataset_path("/nonexistent/spatia/hrir.bin")
            .max_block_size(32)
            .build()
            .unwrap();
        let (mut processor, _control) = spatia.split();
        let mut left = [1.0; 32];
        let mut right = [1.0; 32];
        processor.process_block(&[&[1.0; 32]], [&mut left, &mut right], &Default::default());
        assert!(left.iter().chain(&right).all(|s| *s == 0.0));
        assert_eq!(processor.dataset().impulse_length(), 8);
    }
}
