//! The ordered source collection and its edit operations.
//!
//! Operations mutate a working copy handed out by the registry. Index
//! identity matters: source `i` maps to render slot `i` and host parameter
//! `i`. Out-of-range indices are ignored and reported as "no change".

use crate::automation::{constrain_group_move, SegmentType};
use crate::error::{Error, Result};
use crate::path::PathKind;
use crate::position::Vec3;
use crate::source::SoundSource;
use spatia_core::MAX_SOURCES;

#[derive(Debug, Clone, PartialEq)]
pub struct Sources {
    items: Vec<SoundSource>,
    /// Most sources the collection accepts, at most [`MAX_SOURCES`].
    capacity: usize,
}

impl Default for Sources {
    /// A single default source.
    fn default() -> Self {
        Self {
            items: vec![SoundSource::default()],
            capacity: MAX_SOURCES,
        }
    }
}

/// Outcome of a bounded group move of automation points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomationMove {
    pub moved: usize,
    /// The requested delta had to be reduced to keep the group in range.
    pub clamped: bool,
}

impl AutomationMove {
    /// Moved count, negated when the move was clamped.
    pub fn signed_count(&self) -> i64 {
        let count = self.moved as i64;
        if self.clamped {
            -count
        } else {
            count
        }
    }
}

impl Sources {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            capacity: MAX_SOURCES,
        }
    }

    pub fn from_vec(items: Vec<SoundSource>) -> Result<Self> {
        if items.len() > MAX_SOURCES {
            return Err(Error::TooManySources {
                count: items.len(),
                max: MAX_SOURCES,
            });
        }
        Ok(Self {
            items,
            capacity: MAX_SOURCES,
        })
    }

    /// Limits the collection to `capacity` sources (1 to [`MAX_SOURCES`]),
    /// dropping any past it.
    pub fn capped(mut self, capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_SOURCES);
        if self.items.len() > capacity {
            tracing::warn!(
                "Dropping {} source(s) past the limit of {capacity}",
                self.items.len() - capacity
            );
            self.items.truncate(capacity);
        }
        self.capacity = capacity;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&SoundSource> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SoundSource> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SoundSource> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, SoundSource> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[SoundSource] {
        &self.items
    }

    fn selected_mut(&mut self) -> impl Iterator<Item = &mut SoundSource> {
        self.items.iter_mut().filter(|s| s.is_selected())
    }

    pub fn any_selected(&self) -> bool {
        self.items.iter().any(SoundSource::is_selected)
    }

    // Sources

    /// Adds a selected source at `xyz`. Returns its index, or `None` when full.
    pub fn add_source_at(&mut self, xyz: Vec3) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let mut source = SoundSource::at_xyz(xyz);
        source.set_selected(true);
        self.items.push(source);
        Some(self.items.len() - 1)
    }

    /// Copies what is selected.
    ///
    /// For each selected source with selected path points, those points are
    /// duplicated inside its path. A selected source without selected points
    /// is duplicated whole (while there is room): the copy takes the
    /// selection, with all of its path points selected, and the original is
    /// deselected.
    pub fn copy_selected(&mut self) -> bool {
        let mut changed = false;
        let count = self.items.len();
        for index in 0..count {
            if !self.items[index].is_selected() {
                continue;
            }
            if self.items[index].path().any_selected() {
                changed |= self.items[index].path_mut().copy_selected() > 0;
                continue;
            }
            self.items[index].set_selected(false);
            if self.is_full() {
                continue;
            }
            let mut copy = self.items[index].clone().with_new_id();
            copy.set_selected(true);
            copy.path_mut().set_all_selected(true);
            self.items.push(copy);
            changed = true;
        }
        changed
    }

    /// Deletes selected path points of selected sources. A selected source
    /// is removed entirely when none of its points were selected or when no
    /// points remain.
    pub fn delete_selected(&mut self) -> bool {
        let before = self.items.len();
        let mut points_deleted = false;
        self.items.retain_mut(|source| {
            if !source.is_selected() {
                return true;
            }
            let deleted = source.path_mut().delete_selected();
            points_deleted |= deleted > 0;
            deleted > 0 && !source.path().is_empty()
        });
        points_deleted || self.items.len() != before
    }

    /// Selects or deselects one source. Deselecting also deselects its path
    /// points.
    pub fn set_source_selected(&mut self, index: usize, selected: bool) -> bool {
        let Some(source) = self.items.get_mut(index) else {
            return false;
        };
        source.set_selected(selected);
        if !selected {
            source.path_mut().set_all_selected(false);
        }
        true
    }

    /// Selecting all also selects the path points of sources that were
    /// already selected. Deselecting all clears point selections too.
    pub fn select_all_sources(&mut self, selected: bool) {
        for source in &mut self.items {
            if selected {
                if source.is_selected() {
                    source.path_mut().set_all_selected(true);
                }
            } else {
                source.path_mut().set_all_selected(false);
            }
            source.set_selected(selected);
        }
    }

    /// Moves selected path points, or the selected sources themselves when
    /// none of their points are selected. A source that is currently being
    /// driven along its path (`locked_to_path` and playing with more than one
    /// path point) keeps its position.
    pub fn move_selected_xyz(&mut self, delta: Vec3, playing: bool, locked_to_paths: bool) -> bool {
        let mut moved = false;
        for source in self.selected_mut() {
            if source.path().any_selected() {
                moved |= source.path_mut().move_selected(delta) > 0;
            } else if !(playing && locked_to_paths && source.follows_path()) {
                source.move_by(delta);
                moved = true;
            }
        }
        moved
    }

    /// Spherical counterpart of [`Sources::move_selected_xyz`]. The radius is
    /// scaled by `radius_factor` and the angles are offset.
    pub fn move_selected_rae(
        &mut self,
        radius_factor: f32,
        d_azimuth: f32,
        d_elevation: f32,
        playing: bool,
        locked_to_paths: bool,
    ) -> bool {
        let mut moved = false;
        for source in self.selected_mut() {
            if source.path().any_selected() {
                moved |= source
                    .path_mut()
                    .move_selected_spherical(radius_factor, d_azimuth, d_elevation)
                    > 0;
            } else if !(playing && locked_to_paths && source.follows_path()) {
                source.move_spherical(radius_factor, d_azimuth, d_elevation);
                moved = true;
            }
        }
        moved
    }

    /// Clears mute on every source.
    pub fn unmute_all(&mut self) {
        for source in &mut self.items {
            source.set_muted(false);
        }
    }

    // Path points

    /// Drops a path point on each selected source, at `xyz` or at the
    /// source's own position.
    pub fn drop_path_point(&mut self, xyz: Option<Vec3>) -> bool {
        let mut dropped = false;
        for source in self.selected_mut() {
            match xyz {
                Some(xyz) => source.path_mut().push(xyz),
                None => source.add_path_point_here(),
            }
            dropped = true;
        }
        dropped
    }

    pub fn set_path_point_selected(&mut self, source: usize, point: usize, selected: bool) -> bool {
        self.items
            .get_mut(source)
            .is_some_and(|s| s.path_mut().set_selected(point, selected))
    }

    /// Returns the new selection state, or `None` if out of range.
    pub fn toggle_path_point_selected(&mut self, source: usize, point: usize) -> Option<bool> {
        let path = self.items.get_mut(source)?.path_mut();
        let next = !path.point(point)?.selected;
        path.set_selected(point, next);
        Some(next)
    }

    pub fn move_selected_path_points_to_index(
        &mut self,
        source: usize,
        reference: usize,
        new_index: usize,
    ) -> bool {
        self.items
            .get_mut(source)
            .is_some_and(|s| s.path_mut().move_selected_to_index(reference, new_index))
    }

    /// Flips open/closed on every selected source's path.
    pub fn toggle_selected_path_kind(&mut self) -> bool {
        let mut toggled = false;
        for source in self.selected_mut() {
            let next = source.path().kind().toggled();
            source.path_mut().set_kind(next);
            toggled = true;
        }
        toggled
    }

    pub fn set_selected_path_kind(&mut self, kind: PathKind) -> bool {
        let mut changed = false;
        for source in self.selected_mut() {
            if source.path().kind() != kind {
                source.path_mut().set_kind(kind);
                changed = true;
            }
        }
        changed
    }

    // Path automation. Automation of a source is only visible, and so only
    // editable as a group, while the source is selected.

    pub fn select_all_automation_points(&mut self, selected: bool) -> bool {
        let mut any = false;
        for source in self.selected_mut() {
            source.automation_mut().set_all_selected(selected);
            any = true;
        }
        any
    }

    /// Clears automation point selection on every source.
    pub fn deselect_all_automation_points(&mut self) {
        for source in &mut self.items {
            source.automation_mut().set_all_selected(false);
        }
    }

    pub fn set_automation_point_selected(&mut self, source: usize, point: usize, selected: bool) -> bool {
        self.items
            .get_mut(source)
            .is_some_and(|s| s.automation_mut().set_selected(point, selected))
    }

    pub fn toggle_automation_point_selected(&mut self, source: usize, point: usize) -> Option<bool> {
        let automation = self.items.get_mut(source)?.automation_mut();
        let next = !automation.points().get(point)?.selected;
        automation.set_selected(point, next);
        Some(next)
    }

    /// Moves every selected automation point of every selected source by
    /// the same delta, reduced as needed so the whole group stays in range.
    pub fn move_selected_automation_points(&mut self, dx: f32, dy: f32) -> AutomationMove {
        let (dx, dy, clamped) = constrain_group_move(
            self.items
                .iter()
                .filter(|s| s.is_selected())
                .flat_map(|s| s.automation().points()),
            dx,
            dy,
        );
        let moved = self
            .selected_mut()
            .map(|s| s.automation_mut().move_selected(dx, dy))
            .sum();
        AutomationMove { moved, clamped }
    }

    /// Drags the selected group so the `nth_selected` selected point of
    /// `source` lands at `(time_secs, value)`. Returns that point's index
    /// after the move.
    pub fn move_selected_automation_points_to(
        &mut self,
        source: usize,
        nth_selected: usize,
        time_secs: f32,
        value: f32,
    ) -> Option<usize> {
        let reference = *self
            .items
            .get(source)?
            .automation()
            .selected_points()
            .nth(nth_selected)?
            .1;
        self.move_selected_automation_points(time_secs - reference.time_secs, value - reference.value);
        self.items[source]
            .automation()
            .selected_points()
            .nth(nth_selected)
            .map(|(index, _)| index)
    }

    /// Adds an automation point to each selected source.
    pub fn add_automation_point(&mut self, time_secs: f32, value: f32) -> bool {
        let mut added = false;
        for source in self.selected_mut() {
            source.automation_mut().add_point(time_secs, value);
            added = true;
        }
        added
    }

    pub fn delete_selected_automation_points(&mut self) -> bool {
        let mut deleted = 0;
        for source in &mut self.items {
            deleted += source.automation_mut().delete_selected();
        }
        deleted > 0
    }

    pub fn set_selected_automation_segment_type(&mut self, segment: SegmentType) -> bool {
        let mut changed = 0;
        for source in &mut self.items {
            changed += source.automation_mut().set_selected_segment_type(segment);
        }
        changed > 0
    }

    pub fn copy_selected_automation_points(&mut self) -> bool {
        let mut copied = 0;
        for source in self.selected_mut() {
            copied += source.automation_mut().copy_selected();
        }
        copied > 0
    }

    pub fn automation_index_among_selected(&self, source: usize, point: usize) -> Option<usize> {
        self.items.get(source)?.automation().index_among_selected(point)
    }

    pub fn any_selected_automation_points(&self) -> bool {
        self.items
            .iter()
            .any(|s| s.is_selected() && s.automation().any_selected())
    }

    /// The automation view shows selected sources; with nothing selected,
    /// select everything so the view is not empty. Returns `true` if the
    /// selection changed.
    pub fn make_visible_for_automation_view(&mut self) -> bool {
        if self.any_selected() || self.items.is_empty() {
            return false;
        }
        for source in &mut self.items {
            source.set_selected(true);
        }
        true
    }

    /// Time span from the earliest to the latest selected automation point
    /// over all selected sources.
    pub fn selected_automation_span(&self) -> Option<(f32, f32)> {
        let mut span: Option<(f32, f32)> = None;
        for source in self.items.iter().filter(|s| s.is_selected()) {
            for (_, point) in source.automation().selected_points() {
                let t = point.time_secs;
                span = Some(match span {
                    Some((begin, end)) => (begin.min(t), end.max(t)),
                    None => (t, t),
                });
            }
        }
        span.filter(|(begin, end)| end > begin)
    }
}

impl std::ops::Index<usize> for Sources {
    type Output = SoundSource;

    fn index(&self, index: usize) -> &SoundSource {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a Sources {
    type Item = &'a SoundSource;
    type IntoIter = std::slice::Iter<'a, SoundSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
