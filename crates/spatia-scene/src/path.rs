//! Editable source paths.
//!
//! A path is an ordered list of control points evaluated piecewise-linearly
//! by a parameter `u` in `[0, 1]`, uniformly spaced per segment. A closed
//! path adds a segment from the last point back to the first.

use crate::position::{Spherical, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathKind {
    #[default]
    Open,
    Closed,
}

impl PathKind {
    pub fn toggled(self) -> Self {
        match self {
            PathKind::Open => PathKind::Closed,
            PathKind::Closed => PathKind::Open,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub position: Vec3,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourcePath {
    points: Vec<PathPoint>,
    kind: PathKind,
}

impl SourcePath {
    pub fn new(kind: PathKind) -> Self {
        Self {
            points: Vec::new(),
            kind,
        }
    }

    pub fn from_points(points: Vec<PathPoint>, kind: PathKind) -> Self {
        Self { points, kind }
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: PathKind) {
        self.kind = kind;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&PathPoint> {
        self.points.get(index)
    }

    pub fn push(&mut self, position: Vec3) {
        self.points.push(PathPoint {
            position,
            selected: false,
        });
    }

    /// Position at parameter `u`, clamped to `[0, 1]`.
    pub fn position_at(&self, u: f32) -> Option<Vec3> {
        let n = self.points.len();
        match n {
            0 => return None,
            1 => return Some(self.points[0].position),
            _ => {}
        }
        let segments = match self.kind {
            PathKind::Open => n - 1,
            PathKind::Closed => n,
        };
        let u = if u.is_nan() { 0.0 } else { u.clamp(0.0, 1.0) };
        let scaled = u * segments as f32;
        let segment = (scaled.floor() as usize).min(segments - 1);
        let t = scaled - segment as f32;
        let from = self.points[segment].position;
        let to = self.points[(segment + 1) % n].position;
        Some(from.lerp(to, t))
    }

    // Selection

    pub fn is_selected(&self, index: usize) -> bool {
        self.points.get(index).is_some_and(|p| p.selected)
    }

    /// Returns `false` when `index` is out of range.
    pub fn set_selected(&mut self, index: usize, selected: bool) -> bool {
        match self.points.get_mut(index) {
            Some(point) => {
                point.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn set_all_selected(&mut self, selected: bool) {
        for point in &mut self.points {
            point.selected = selected;
        }
    }

    pub fn num_selected(&self) -> usize {
        self.points.iter().filter(|p| p.selected).count()
    }

    pub fn any_selected(&self) -> bool {
        self.points.iter().any(|p| p.selected)
    }

    pub fn selected_flags(&self) -> Vec<bool> {
        self.points.iter().map(|p| p.selected).collect()
    }

    // Editing

    pub fn move_selected(&mut self, delta: Vec3) -> usize {
        let mut moved = 0;
        for point in self.points.iter_mut().filter(|p| p.selected) {
            point.position += delta;
            moved += 1;
        }
        moved
    }

    /// Applies a spherical move to every selected point.
    pub fn move_selected_spherical(&mut self, radius_factor: f32, d_az: f32, d_el: f32) -> usize {
        let mut moved = 0;
        for point in self.points.iter_mut().filter(|p| p.selected) {
            point.position = Spherical::from_cartesian(point.position)
                .offset(radius_factor, d_az, d_el)
                .to_cartesian();
            moved += 1;
        }
        moved
    }

    pub fn delete_selected(&mut self) -> usize {
        let before = self.points.len();
        self.points.retain(|p| !p.selected);
        before - self.points.len()
    }

    /// Appends a copy of each selected point. The copies become the selection.
    pub fn copy_selected(&mut self) -> usize {
        let copies: Vec<PathPoint> = self.points.iter().filter(|p| p.selected).copied().collect();
        self.set_all_selected(false);
        let count = copies.len();
        self.points.extend(copies.into_iter().map(|p| PathPoint {
            selected: true,
            ..p
        }));
        count
    }

    /// Moves the selected points as a block so that the selected point at
    /// `reference` lands at `new_index`. Relative order inside and outside
    /// the block is preserved.
    pub fn move_selected_to_index(&mut self, reference: usize, new_index: usize) -> bool {
        if !self.is_selected(reference) {
            return false;
        }
        let offset_in_block = self.points[..reference]
            .iter()
            .filter(|p| p.selected)
            .count();
        let (block, mut rest): (Vec<PathPoint>, Vec<PathPoint>) =
            self.points.iter().copied().partition(|p| p.selected);
        let insert_at = new_index
            .saturating_sub(offset_in_block)
            .min(rest.len());
        rest.splice(insert_at..insert_at, block);
        let changed = rest != self.points;
        self.points = rest;
        changed
    }
}
