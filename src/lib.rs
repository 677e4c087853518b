//! # Spatia - Real-time Binaural Renderer
//!
//! Places up to eight moving sound sources around a listener and renders
//! them to stereo headphone audio with head-related impulse responses.
//!
//! ## Architecture
//!
//! Spatia is an umbrella crate that coordinates:
//! - **spatia-core** - Snapshot registry, playback clock and looping, undo log, atomics
//! - **spatia-scene** - Sources, paths, path automation, edit actions, persisted records
//! - **spatia-dsp** - HRIR dataset, filter interpolation, convolution, doppler, resampling
//!
//! The audio thread owns a [`SpatialProcessor`] and never blocks: it reads
//! the shared sources with a single `try_lock` and falls back to
//! extrapolating the previous block's motion when a control thread holds
//! them. Control threads edit through a [`ControlSurface`], which publishes
//! whole snapshots and records them for undo.
//!
//! ## Quick Start
//!
//! ```
//! use spatia::prelude::*;
//!
//! let (mut processor, mut control) = Spatia::builder()
//!     .sample_rate(44100.0)
//!     .max_block_size(128)
//!     .build()?
//!     .split();
//!
//! // Control thread
//! control.add_source(Vec3::new(-1.0, 0.0, 0.0));
//! control.drop_path_point(None);
//! control.undo();
//!
//! // Audio thread
//! let input = [0.0f32; 128];
//! let (mut left, mut right) = ([0.0f32; 128], [0.0f32; 128]);
//! processor.process_block(&[&input], [&mut left, &mut right], &HostPlayhead::playing_at(0.0));
//! # Ok::<(), spatia::Error>(())
//! ```

/// Re-export of spatia-core for direct access
pub use spatia_core as core;
/// Re-export of spatia-dsp for direct access
pub use spatia_dsp as dsp;
/// Re-export of spatia-scene for direct access
pub use spatia_scene as scene;

pub use spatia_core::{
    EngineConfig, HostPlayhead, LoopRegion, LoopSettings, MusicalTime, ProcessingMode,
    TimeSignature, HRIR_SAMPLE_RATE, MAX_SOURCES,
};

pub use spatia_dsp::{GridShape, HrirDataset};

pub use spatia_scene::{
    AutomationMove, AutomationPoint, PathKind, SegmentType, SoundSource, Sources, Spherical, Vec3,
};

mod error;
pub use error::{Error, Result};

mod shared;
pub use shared::{ProcessorStats, RenderSettings};

mod processor;
pub use processor::SpatialProcessor;

mod control;
pub use control::ControlSurface;

pub mod state;
pub use state::{GlobalSettings, SavedState, STATE_TAG};

mod builder;
mod engine;

pub use builder::SpatiaBuilder;
pub use engine::Spatia;

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{ControlSurface, Spatia, SpatiaBuilder, SpatialProcessor};

    pub use crate::{
        EngineConfig, GridShape, HostPlayhead, PathKind, ProcessingMode, SegmentType, Spherical,
        Vec3,
    };

    pub use crate::{Error, Result};
}
