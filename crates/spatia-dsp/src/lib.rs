//! Real-time binaural rendering: HRIR dataset, filter interpolation with
//! crossfading convolution, doppler delay and sample-rate conversion.
//!
//! Everything here that runs per block is allocation-free once sized.

mod error;
pub use error::{Error, Result};

pub mod grid;
pub use grid::GridShape;

pub mod dataset;
pub use dataset::{HrirDataset, HrirLayout};

mod cache;
pub use cache::{live_datasets, shared_dataset};

pub mod spatializer;
pub use spatializer::{
    distance_gain, interpolate_filter, InterpolationQuality, Spatializer, StereoFilter,
};

mod doppler;
pub use doppler::DopplerDelay;

mod resampler;
pub use resampler::LinearResampler;

mod playable;
pub use playable::{PlayableSoundSource, PlayableState};
