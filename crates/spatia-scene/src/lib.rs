//! Editable scene model for the Spatia binaural renderer.
//!
//! A scene is an ordered [`Sources`] collection of up to
//! [`spatia_core::MAX_SOURCES`] sound sources. Each [`SoundSource`] has a
//! listener-relative [`Spherical`] position, an optional [`SourcePath`] it
//! can be driven along during playback, and a [`PathAutomation`] curve that
//! maps playback time to a position on that path.
//!
//! Edits are recorded as [`EditAction`] snapshots for the undo log.
//!
//! ```
//! use spatia_scene::{Sources, Vec3};
//!
//! let mut sources = Sources::default();
//! let index = sources.add_source_at(Vec3::new(0.0, 0.0, 2.0)).unwrap();
//! sources.drop_path_point(None);
//! sources.drop_path_point(Some(Vec3::new(2.0, 0.0, 0.0)));
//! assert!(sources[index].follows_path());
//! ```

pub mod action;
pub mod automation;
pub mod error;
pub mod path;
pub mod position;
pub mod record;
pub mod source;
pub mod sources;

pub use action::EditAction;
pub use automation::{constrain_group_move, AutomationPoint, PathAutomation, SegmentType};
pub use error::{Error, Result};
pub use path::{PathKind, PathPoint, SourcePath};
pub use position::{wrap_azimuth, Spherical, Vec3, MIN_RADIUS};
pub use record::{sources_from_values, sources_to_records, SourceRecord};
pub use source::{SoundSource, SourceFrame, SourceId};
pub use sources::{AutomationMove, Sources};
