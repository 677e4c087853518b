//! Path automation: a time → path-parameter curve.
//!
//! Points are `(time_secs, value)` with `time_secs >= 0` and `value` in
//! `[0, 1]`, kept sorted by time. Each point carries the interpolation type
//! of the segment that leaves it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SegmentType {
    #[default]
    Linear,
    /// Holds the starting value until the next point.
    Step,
    /// Cosine ease between the two values.
    Smooth,
}

impl SegmentType {
    #[inline]
    fn interpolate(self, from: f32, to: f32, t: f32) -> f32 {
        match self {
            SegmentType::Linear => from + (to - from) * t,
            SegmentType::Step => from,
            SegmentType::Smooth => {
                let eased = 0.5 - 0.5 * (t * std::f32::consts::PI).cos();
                from + (to - from) * eased
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutomationPoint {
    pub time_secs: f32,
    pub value: f32,
    #[serde(default)]
    pub segment: SegmentType,
    #[serde(default)]
    pub selected: bool,
}

impl AutomationPoint {
    pub fn new(time_secs: f32, value: f32) -> Self {
        Self {
            time_secs: time_secs.max(0.0),
            value: if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, 1.0)
            },
            segment: SegmentType::default(),
            selected: false,
        }
    }
}

/// Bounds a group move so every selected point stays in range.
///
/// Returns the adjusted delta and whether it had to be reduced.
pub fn constrain_group_move<'a>(
    points: impl IntoIterator<Item = &'a AutomationPoint>,
    dx: f32,
    dy: f32,
) -> (f32, f32, bool) {
    let (mut dx, mut dy) = (dx, dy);
    let mut clamped = false;
    for point in points.into_iter().filter(|p| p.selected) {
        let new_x = point.time_secs + dx;
        let new_y = point.value + dy;
        if new_x < 0.0 {
            dx -= new_x;
            clamped = true;
        }
        if new_y < 0.0 {
            dy -= new_y;
            clamped = true;
        }
        if new_y > 1.0 {
            dy -= new_y - 1.0;
            clamped = true;
        }
    }
    (dx, dy, clamped)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathAutomation {
    points: Vec<AutomationPoint>,
}

impl PathAutomation {
    /// Builds a curve from arbitrary points, sanitising and sorting them.
    pub fn from_points(points: Vec<AutomationPoint>) -> Self {
        let mut automation = Self {
            points: points
                .into_iter()
                .filter(|p| p.time_secs.is_finite() && p.value.is_finite())
                .map(|p| AutomationPoint {
                    time_secs: p.time_secs.max(0.0),
                    value: p.value.clamp(0.0, 1.0),
                    ..p
                })
                .collect(),
        };
        automation.sort();
        automation
    }

    pub fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time span covered by the curve.
    pub fn span(&self) -> Option<(f32, f32)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.time_secs, last.time_secs)),
            _ => None,
        }
    }

    fn sort(&mut self) {
        self.points.sort_by(|a, b| a.time_secs.total_cmp(&b.time_secs));
    }

    /// Evaluates the curve at `time_secs`.
    ///
    /// `cursor` is the segment matched by the previous call; playback moves
    /// forward almost always, so the search starts there. Before the first
    /// point the first value holds, after the last point the last value holds.
    pub fn value_at(&self, time_secs: f32, cursor: &mut usize) -> Option<f32> {
        let points = &self.points;
        let first = points.first()?;
        let last = points.last()?;
        if points.len() == 1 || !(time_secs > first.time_secs) {
            *cursor = 0;
            return Some(first.value);
        }
        if time_secs >= last.time_secs {
            *cursor = points.len() - 1;
            return Some(last.value);
        }

        let mut index = (*cursor).min(points.len() - 2);
        if points[index].time_secs > time_secs {
            index = points
                .partition_point(|p| p.time_secs <= time_secs)
                .saturating_sub(1);
        } else {
            while index + 1 < points.len() - 1 && points[index + 1].time_secs <= time_secs {
                index += 1;
            }
        }
        *cursor = index;

        let from = &points[index];
        let to = &points[index + 1];
        let width = to.time_secs - from.time_secs;
        let t = if width > 0.0 {
            (time_secs - from.time_secs) / width
        } else {
            1.0
        };
        Some(from.segment.interpolate(from.value, to.value, t.clamp(0.0, 1.0)))
    }

    // Selection

    pub fn is_selected(&self, index: usize) -> bool {
        self.points.get(index).is_some_and(|p| p.selected)
    }

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

    /// Selected points in time order.
    pub fn selected_points(&self) -> impl Iterator<Item = (usize, &AutomationPoint)> {
        self.points.iter().enumerate().filter(|(_, p)| p.selected)
    }

    /// Position of point `index` among the selected points.
    pub fn index_among_selected(&self, index: usize) -> Option<usize> {
        if !self.is_selected(index) {
            return None;
        }
        Some(self.points[..index].iter().filter(|p| p.selected).count())
    }

    // Editing

    /// Inserts a point in time order and returns its index.
    pub fn add_point(&mut self, time_secs: f32, value: f32) -> usize {
        let point = AutomationPoint::new(time_secs, value);
        let index = self
            .points
            .partition_point(|p| p.time_secs <= point.time_secs);
        self.points.insert(index, point);
        index
    }

    /// Moves every selected point by an already-constrained delta.
    pub fn move_selected(&mut self, dx: f32, dy: f32) -> usize {
        let mut moved = 0;
        for point in self.points.iter_mut().filter(|p| p.selected) {
            point.time_secs = (point.time_secs + dx).max(0.0);
            point.value = (point.value + dy).clamp(0.0, 1.0);
            moved += 1;
        }
        if moved > 0 {
            self.sort();
        }
        moved
    }

    pub fn delete_selected(&mut self) -> usize {
        let before = self.points.len();
        self.points.retain(|p| !p.selected);
        before - self.points.len()
    }

    /// Sets the outgoing segment type of every selected point.
    pub fn set_selected_segment_type(&mut self, segment: SegmentType) -> usize {
        let mut changed = 0;
        for point in self.points.iter_mut().filter(|p| p.selected) {
            if point.segment != segment {
                point.segment = segment;
                changed += 1;
            }
        }
        changed
    }

    /// Duplicates the selected points. The copies take the selection so a
    /// following drag moves them away from the originals.
    pub fn copy_selected(&mut self) -> usize {
        let copies: Vec<AutomationPoint> = self.points.iter().filter(|p| p.selected).copied().collect();
        self.set_all_selected(false);
        let count = copies.len();
        for copy in copies {
            let index = self
                .points
                .partition_point(|p| p.time_secs <= copy.time_secs);
            self.points.insert(
                index,
                AutomationPoint {
                    selected: true,
                    ..copy
                },
            );
        }
        count
    }
}
