//! A single editable sound source.

use crate::automation::PathAutomation;
use crate::path::SourcePath;
use crate::position::{Spherical, Vec3};
use std::sync::atomic::{AtomicU64, Ordering};

/// Everything the renderer needs from a source for one block.
///
/// Copied out in one piece so position and mute never come from different
/// edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceFrame {
    pub position: Spherical,
    pub muted: bool,
}

impl Default for SourceFrame {
    fn default() -> Self {
        Self {
            position: Spherical::default(),
            muted: false,
        }
    }
}

/// Identity of a source across edits. Clones (and so undo snapshots) keep
/// it; new, copied and loaded sources get a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::next()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SoundSource {
    id: SourceId,
    position: Spherical,
    selected: bool,
    muted: bool,
    path: SourcePath,
    automation: PathAutomation,
}

/// Compares content only. Identity does not make two sources different
/// edits.
impl PartialEq for SoundSource {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
            && self.selected == other.selected
            && self.muted == other.muted
            && self.path == other.path
            && self.automation == other.automation
    }
}

impl SoundSource {
    pub fn new(position: Spherical) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn at_xyz(xyz: Vec3) -> Self {
        Self::new(Spherical::from_cartesian(xyz))
    }

    /// Reassembles a source from its parts.
    pub fn from_parts(
        position: Spherical,
        selected: bool,
        muted: bool,
        path: SourcePath,
        automation: PathAutomation,
    ) -> Self {
        Self {
            id: SourceId::next(),
            position,
            selected,
            muted,
            path,
            automation,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    /// The same source under a fresh identity, for duplicates.
    pub fn with_new_id(mut self) -> Self {
        self.id = SourceId::next();
        self
    }

    // Position

    pub fn position(&self) -> Spherical {
        self.position
    }

    pub fn xyz(&self) -> Vec3 {
        self.position.to_cartesian()
    }

    pub fn set_position(&mut self, position: Spherical) {
        self.position = position;
    }

    pub fn set_xyz(&mut self, xyz: Vec3) {
        self.position = Spherical::from_cartesian(xyz);
    }

    pub fn move_by(&mut self, delta: Vec3) {
        self.set_xyz(self.xyz() + delta);
    }

    pub fn move_spherical(&mut self, radius_factor: f32, d_azimuth: f32, d_elevation: f32) {
        self.position = self.position.offset(radius_factor, d_azimuth, d_elevation);
    }

    // Flags

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Sets the source-level selection flag only. Point selections are
    /// changed through their own operations.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn frame(&self) -> SourceFrame {
        SourceFrame {
            position: self.position,
            muted: self.muted,
        }
    }

    // Path

    pub fn path(&self) -> &SourcePath {
        &self.path
    }

    pub fn path_mut(&mut self) -> &mut SourcePath {
        &mut self.path
    }

    pub fn automation(&self) -> &PathAutomation {
        &self.automation
    }

    pub fn automation_mut(&mut self) -> &mut PathAutomation {
        &mut self.automation
    }

    /// A source follows its path once the path has a direction to follow.
    pub fn follows_path(&self) -> bool {
        self.path.len() > 1
    }

    /// Drops a path point at the source's current position.
    pub fn add_path_point_here(&mut self) {
        let here = self.xyz();
        self.path.push(here);
    }

    /// Places the source on its path for playback time `time_secs`.
    ///
    /// The path parameter comes from the automation curve when it has
    /// points, otherwise from `fallback_u` (the host's per-source
    /// parameter). With a curve of two or more points the source is muted
    /// outside the curve's time span. Returns `false` if the source has no
    /// path to follow.
    pub fn set_parametric_position(
        &mut self,
        time_secs: f32,
        cursor: &mut usize,
        fallback_u: f32,
    ) -> bool {
        if !self.follows_path() {
            return false;
        }
        let u = self
            .automation
            .value_at(time_secs, cursor)
            .unwrap_or(fallback_u);
        if let Some(xyz) = self.path.position_at(u) {
            self.set_xyz(xyz);
        }
        self.muted = match self.automation.span() {
            Some((begin, end)) if self.automation.len() > 1 => {
                time_secs < begin || time_secs > end
            }
            _ => false,
        };
        true
    }
}
