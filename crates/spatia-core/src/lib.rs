//! Real-time kernel for the Spatia binaural renderer.
//!
//! # Primary API
//!
//! - [`RealtimeShared`]: multi-slot snapshot registry with a non-blocking
//!   audio-thread path
//! - [`UndoLog`] / [`UndoAction`]: transaction history with explicit coalescing
//! - [`PlaybackClock`] / [`LoopControl`]: internal playback position and looping
//! - [`EngineConfig`]: validated engine configuration
//!
//! # Example
//!
//! ```
//! use spatia_core::RealtimeShared;
//!
//! let shared: RealtimeShared<Vec<f32>> = RealtimeShared::new(vec![0.0]);
//!
//! let mut edit = shared.lock();
//! edit.push(1.0);
//! edit.publish();
//!
//! // Audio thread
//! if let Some(view) = shared.try_acquire() {
//!     assert_eq!(view.len(), 2);
//! };
//! ```

pub(crate) mod compat;

pub mod config;
pub use config::{EngineConfig, ProcessingMode, HRIR_SAMPLE_RATE, MAX_SOURCES};

pub mod error;
pub use error::{Error, Result};

pub(crate) mod lockfree;
pub use lockfree::{AtomicCounter, AtomicDouble, AtomicFlag, AtomicFloat, AtomicVec3};

pub mod shared;
pub use shared::{PinGuard, RealtimeGuard, RealtimeShared, WriteGuard};

pub mod transport;
pub use transport::{
    ClockTick, HostPlayhead, LoopControl, LoopRegion, LoopSettings, MusicalTime, PlaybackClock,
    TimeSignature, TransportState,
};

pub mod undo;
pub use undo::{GestureRecorder, UndoAction, UndoLog};

pub use compat::Arc;
