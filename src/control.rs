//! Control-thread editing surface.
//!
//! Every mutating operation opens a working copy of the source registry,
//! edits it, publishes it and records the before/after pair in the undo
//! log. Discrete edits each become one undo step. Drags (moving sources,
//! path points or automation points) form a gesture: its steps coalesce
//! into a single undo step that ends when the gesture is committed, which
//! happens implicitly on the next discrete edit, deselection or undo.
//!
//! Selection changes are published but not recorded.

use crate::error::Result;
use crate::shared::{EngineShared, ProcessorStats, RenderSettings};
use crate::state::SavedState;
use spatia_core::{
    Arc, GestureRecorder, LoopRegion, LoopSettings, MusicalTime, PinGuard, ProcessingMode,
    TransportState, UndoLog,
};
use spatia_scene::{AutomationMove, EditAction, PathKind, SegmentType, Sources, Vec3};

pub struct ControlSurface {
    shared: Arc<EngineShared>,
    undo: UndoLog<EditAction>,
    gesture: GestureRecorder<Sources>,
}

impl ControlSurface {
    pub(crate) fn new(shared: Arc<EngineShared>) -> Self {
        let undo = UndoLog::new(shared.config.max_undo_steps);
        Self {
            shared,
            undo,
            gesture: GestureRecorder::default(),
        }
    }

    // Edit bracketing

    /// Runs a discrete edit as its own undo step. Nothing is published or
    /// recorded when `edit` reports no change.
    fn edit(&mut self, edit: impl FnOnce(&mut Sources) -> bool) -> bool {
        self.commit_gesture();
        let mut working = self.shared.sources.lock();
        let before = (*working).clone();
        if !edit(&mut *working) || *working == before {
            return false;
        }
        let after = (*working).clone();
        working.publish();
        self.undo.begin_new_transaction();
        self.undo.perform(EditAction::Sources { before, after });
        self.undo.begin_new_transaction();
        true
    }

    /// Runs one step of a drag. Steps coalesce with the gesture's earlier
    /// steps into one undo step.
    fn gesture_step<R>(&mut self, step: impl FnOnce(&mut Sources) -> R) -> R {
        let mut working = self.shared.sources.lock();
        let before = (*working).clone();
        let result = step(&mut *working);
        if *working == before {
            return result;
        }
        if self.gesture.capture_before(|| before.clone()) {
            self.undo.begin_new_transaction();
        }
        let after = (*working).clone();
        working.publish();
        self.undo.perform(EditAction::Sources { before, after });
        result
    }

    /// Publishes a change that is not an undo step.
    fn update_unrecorded(&self, update: impl FnOnce(&mut Sources) -> bool) -> bool {
        let mut working = self.shared.sources.lock();
        if !update(&mut *working) {
            return false;
        }
        working.publish();
        true
    }

    /// Ends the current drag gesture, if any. The next edit starts a new
    /// undo step.
    pub fn commit_gesture(&mut self) {
        if self.gesture.finish().is_some() {
            self.undo.begin_new_transaction();
        }
    }

    fn record_loop_edit(&mut self, before: LoopSettings, after: LoopSettings) {
        if before == after {
            return;
        }
        self.commit_gesture();
        self.undo.begin_new_transaction();
        self.undo.perform(EditAction::Loop { before, after });
        self.undo.begin_new_transaction();
    }

    // Undo

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.commit_gesture();
        let shared = &self.shared;
        match self.undo.undo() {
            Some(actions) => {
                for action in actions.iter().rev() {
                    apply(shared, action, Side::Before);
                }
                tracing::debug!("Undid {} action(s)", actions.len());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.commit_gesture();
        let shared = &self.shared;
        match self.undo.redo() {
            Some(actions) => {
                for action in actions {
                    apply(shared, action, Side::After);
                }
                tracing::debug!("Redid {} action(s)", actions.len());
                true
            }
            None => false,
        }
    }

    pub fn clear_undo_history(&mut self) {
        self.gesture.finish();
        self.undo.clear();
    }

    // Reads

    /// Copy of the current sources.
    pub fn sources(&self) -> Sources {
        self.shared.sources.snapshot()
    }

    /// Reads the current sources in place, for display. The audio thread
    /// extrapolates for as long as the guard is held, so keep it short.
    pub fn read_sources(&self) -> PinGuard<'_, Sources> {
        self.shared.sources.pin()
    }

    /// Replaces every source as one undo step. Sources past the engine's
    /// source limit are dropped.
    pub fn set_sources(&mut self, sources: Sources) -> bool {
        let capacity = self.shared.config.max_sources;
        self.edit(|current| {
            *current = sources.capped(capacity);
            true
        })
    }

    /// Registry version, bumped by every publish.
    pub fn version(&self) -> u64 {
        self.shared.sources.version()
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.shared.settings
    }

    pub fn stats(&self) -> &ProcessorStats {
        &self.shared.stats
    }

    pub fn transport(&self) -> &TransportState {
        &self.shared.transport
    }

    /// Playback position shown as bars and beats.
    pub fn musical_position(&self) -> Result<MusicalTime> {
        let transport = &self.shared.transport;
        Ok(transport.musical_time(transport.position_secs())?)
    }

    /// Clears the playing flag once the audio thread has been silent for half
    /// a second. Call once per UI frame.
    pub fn reset_playing(&self, frame_rate: f32) {
        self.shared.transport.reset_playing(frame_rate);
    }

    /// Cartesian position source `index` was last rendered at.
    pub fn live_position(&self, index: usize) -> Option<Vec3> {
        self.shared
            .live_positions
            .get(index)
            .map(|p| Vec3::from_array(p.get()))
    }

    pub fn loop_settings(&self) -> LoopSettings {
        self.shared.loop_control.load()
    }

    // Sources

    /// Adds a selected source at `xyz`. Returns its index, or `None` when all
    /// source slots are used.
    pub fn add_source(&mut self, xyz: Vec3) -> Option<usize> {
        let mut index = None;
        self.edit(|sources| {
            index = sources.add_source_at(xyz);
            index.is_some()
        });
        index
    }

    /// Copies selected path points, or whole selected sources.
    pub fn copy_selected(&mut self) -> bool {
        self.edit(Sources::copy_selected)
    }

    /// Deletes selected path points, or whole selected sources.
    pub fn delete_selected(&mut self) -> bool {
        self.edit(Sources::delete_selected)
    }

    pub fn set_source_selected(&mut self, index: usize, selected: bool) -> bool {
        if !selected {
            self.commit_gesture();
        }
        self.update_unrecorded(|sources| sources.set_source_selected(index, selected))
    }

    pub fn select_all_sources(&mut self, selected: bool) {
        if !selected {
            self.commit_gesture();
        }
        self.update_unrecorded(|sources| {
            sources.select_all_sources(selected);
            true
        });
    }

    /// Drags the selection by a cartesian offset.
    pub fn move_selected_xyz(&mut self, delta: Vec3) -> bool {
        let playing = self.shared.transport.is_playing();
        let locked = self.shared.settings.locked_to_paths();
        self.gesture_step(|sources| sources.move_selected_xyz(delta, playing, locked))
    }

    /// Drags the selection in spherical terms: radius scaled, angles offset.
    pub fn move_selected_rae(&mut self, radius_factor: f32, d_azimuth: f32, d_elevation: f32) -> bool {
        let playing = self.shared.transport.is_playing();
        let locked = self.shared.settings.locked_to_paths();
        self.gesture_step(|sources| {
            sources.move_selected_rae(radius_factor, d_azimuth, d_elevation, playing, locked)
        })
    }

    // Paths

    /// Adds a path point to each selected source, at `xyz` or at the
    /// source's own position.
    pub fn drop_path_point(&mut self, xyz: Option<Vec3>) -> bool {
        self.edit(|sources| sources.drop_path_point(xyz))
    }

    pub fn set_path_point_selected(&mut self, source: usize, point: usize, selected: bool) -> bool {
        if !selected {
            self.commit_gesture();
        }
        self.update_unrecorded(|sources| sources.set_path_point_selected(source, point, selected))
    }

    pub fn toggle_path_point_selected(&mut self, source: usize, point: usize) -> Option<bool> {
        let mut toggled = None;
        self.update_unrecorded(|sources| {
            toggled = sources.toggle_path_point_selected(source, point);
            toggled.is_some()
        });
        if toggled == Some(false) {
            self.commit_gesture();
        }
        toggled
    }

    /// Moves the selected points of `source`'s path so the point at
    /// `reference` lands at `new_index`.
    pub fn move_selected_path_points_to_index(
        &mut self,
        source: usize,
        reference: usize,
        new_index: usize,
    ) -> bool {
        self.edit(|sources| sources.move_selected_path_points_to_index(source, reference, new_index))
    }

    pub fn toggle_path_type(&mut self) -> bool {
        self.edit(Sources::toggle_selected_path_kind)
    }

    pub fn set_path_type(&mut self, kind: PathKind) -> bool {
        self.edit(|sources| sources.set_selected_path_kind(kind))
    }

    /// Host-automated path parameter for source `index`, used while the
    /// source has no automation curve.
    pub fn set_path_position(&self, index: usize, u: f32) -> bool {
        match self.shared.path_positions.get(index) {
            Some(position) if u.is_finite() => {
                position.set(u.clamp(0.0, 1.0));
                true
            }
            _ => false,
        }
    }

    // Path automation

    pub fn add_automation_point(&mut self, time_secs: f32, value: f32) -> bool {
        self.edit(|sources| sources.add_automation_point(time_secs, value))
    }

    /// Drags the selected automation points of every selected source. The
    /// offset shrinks as needed to keep the group in range.
    pub fn move_selected_automation_points(&mut self, dx: f32, dy: f32) -> AutomationMove {
        self.gesture_step(|sources| sources.move_selected_automation_points(dx, dy))
    }

    /// Drags the selected group so the `nth_selected` selected point of
    /// `source` lands at `(time_secs, value)`. Returns that point's new index.
    pub fn move_selected_automation_points_to(
        &mut self,
        source: usize,
        nth_selected: usize,
        time_secs: f32,
        value: f32,
    ) -> Option<usize> {
        self.gesture_step(|sources| {
            sources.move_selected_automation_points_to(source, nth_selected, time_secs, value)
        })
    }

    pub fn delete_selected_automation_points(&mut self) -> bool {
        self.edit(Sources::delete_selected_automation_points)
    }

    pub fn copy_selected_automation_points(&mut self) -> bool {
        self.edit(Sources::copy_selected_automation_points)
    }

    pub fn set_segment_type(&mut self, segment: SegmentType) -> bool {
        self.edit(|sources| sources.set_selected_automation_segment_type(segment))
    }

    pub fn select_all_automation_points(&mut self, selected: bool) -> bool {
        if !selected {
            self.commit_gesture();
        }
        self.update_unrecorded(|sources| {
            if selected {
                sources.select_all_automation_points(true)
            } else {
                sources.deselect_all_automation_points();
                true
            }
        })
    }

    pub fn set_automation_point_selected(&mut self, source: usize, point: usize, selected: bool) -> bool {
        if !selected {
            self.commit_gesture();
        }
        self.update_unrecorded(|sources| sources.set_automation_point_selected(source, point, selected))
    }

    pub fn toggle_automation_point_selected(&mut self, source: usize, point: usize) -> Option<bool> {
        let mut toggled = None;
        self.update_unrecorded(|sources| {
            toggled = sources.toggle_automation_point_selected(source, point);
            toggled.is_some()
        });
        if toggled == Some(false) {
            self.commit_gesture();
        }
        toggled
    }

    /// Selects every source if none is selected, so the automation view has
    /// curves to show.
    pub fn make_visible_for_automation_view(&mut self) -> bool {
        self.update_unrecorded(Sources::make_visible_for_automation_view)
    }

    // Render settings

    pub fn toggle_doppler(&self) -> bool {
        let enabled = self.shared.settings.toggle_doppler();
        tracing::debug!("Doppler {}", if enabled { "on" } else { "off" });
        enabled
    }

    pub fn set_doppler(&self, enabled: bool) {
        self.shared.settings.set_doppler_enabled(enabled);
    }

    /// Returns the stored, clamped value.
    pub fn set_speed_of_sound(&self, speed: f32) -> f32 {
        self.shared.settings.set_speed_of_sound(speed)
    }

    pub fn set_processing_mode(&self, mode: ProcessingMode) {
        self.shared.settings.set_processing_mode(mode);
    }

    pub fn set_wet_dry(&self, wet: f32, dry: f32) {
        self.shared.settings.set_wet_dry(wet, dry);
    }

    /// Toggles whether sources follow their paths during playback. Sources
    /// muted by their automation span are unmuted when unlocking.
    pub fn toggle_lock_to_paths(&mut self) -> bool {
        let locked = !self.shared.settings.locked_to_paths();
        self.set_lock_to_paths(locked);
        locked
    }

    pub fn set_lock_to_paths(&mut self, locked: bool) {
        self.shared.settings.set_locked_to_paths(locked);
        if !locked {
            self.update_unrecorded(|sources| {
                sources.unmute_all();
                true
            });
        }
    }

    // Looping

    /// Toggles looping. A region spanned by the selected automation points
    /// replaces the stored one; if the stored region lies entirely outside
    /// `[default_begin, default_end]` the default becomes the region. A
    /// changed region always turns looping on.
    pub fn toggle_looping(&mut self, default_begin: f64, default_end: f64) -> Result<LoopSettings> {
        let fallback = LoopRegion::new(default_begin, default_end)?;
        let candidate = self
            .shared
            .sources
            .pin()
            .selected_automation_span()
            .and_then(|(begin, end)| LoopRegion::new(begin as f64, end as f64).ok());
        let before = self.shared.loop_control.load();
        let after = self.shared.loop_control.toggle(candidate, fallback);
        self.record_loop_edit(before, after);
        Ok(after)
    }

    /// Loops over the span of the selected automation points. Selecting the
    /// current region again, or nothing, clears the region.
    pub fn define_loop_region_from_selection(&mut self) -> LoopSettings {
        let span = self
            .shared
            .sources
            .pin()
            .selected_automation_span()
            .and_then(|(begin, end)| LoopRegion::new(begin as f64, end as f64).ok());
        let before = self.shared.loop_control.load();
        let mut after = before;
        match span {
            Some(region) if before.region() != Some(region) => {
                after.begin = region.begin;
                after.end = region.end;
            }
            _ => {
                let cleared = LoopSettings::default();
                after.begin = cleared.begin;
                after.end = cleared.end;
            }
        }
        self.shared.loop_control.store(after);
        self.record_loop_edit(before, after);
        after
    }

    pub fn set_loop_region(&mut self, begin: f64, end: f64) -> Result<()> {
        let region = LoopRegion::new(begin, end)?;
        let before = self.shared.loop_control.load();
        self.shared.loop_control.set_region(region);
        self.record_loop_edit(before, self.shared.loop_control.load());
        Ok(())
    }

    pub fn set_looping_enabled(&mut self, enabled: bool) {
        let before = self.shared.loop_control.load();
        self.shared.loop_control.set_enabled(enabled);
        self.record_loop_edit(before, self.shared.loop_control.load());
    }

    // Persistence

    pub fn save_state(&self) -> Result<String> {
        SavedState::capture(&self.shared).to_json()
    }

    /// Replaces the engine state with a saved document and clears the undo
    /// history. A document that is not a Spatia state leaves everything
    /// untouched.
    pub fn load_state(&mut self, text: &str) -> Result<()> {
        let state = SavedState::from_json(text)?;
        tracing::info!("Restoring state with {} source(s)", state.sources.len());
        state.apply(&self.shared);
        self.clear_undo_history();
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Side {
    Before,
    After,
}

/// Restores one side of a recorded action through the normal publish path.
fn apply(shared: &EngineShared, action: &EditAction, side: Side) {
    match (action, side) {
        (EditAction::Sources { before: state, .. }, Side::Before)
        | (EditAction::Sources { after: state, .. }, Side::After) => {
            shared.sources.store(state.clone());
        }
        (EditAction::Loop { before: state, .. }, Side::Before)
        | (EditAction::Loop { after: state, .. }, Side::After) => {
            shared.loop_control.store(*state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spatia_core::{EngineConfig, MAX_SOURCES};

    fn surface() -> ControlSurface {
        ControlSurface::new(Arc::new(EngineShared::new(EngineConfig::default())))
    }

    #[test]
    fn test_discrete_edit_is_one_undo_step() {
        let mut control = surface();
        let original = control.sources();
        assert_eq!(control.add_source(Vec3::new(0.0, 0.0, 2.0)), Some(1));
        assert_eq!(control.sources().len(), 2);
        assert!(control.undo());
        assert_eq!(control.sources(), original);
        assert!(control.redo());
        assert_eq!(control.sources().len(), 2);
        assert!(!control.redo());
    }

    #[test]
    fn test_noop_edit_not_recorded() {
        let mut control = surface();
        assert!(!control.delete_selected_automation_points());
        assert!(!control.can_undo());
    }

    #[test]
    fn test_drag_coalesces_until_committed() {
        let mut control = surface();
        control.set_source_selected(0, true);
        let start = control.sources();
        control.move_selected_xyz(Vec3::new(0.1, 0.0, 0.0));
        control.move_selected_xyz(Vec3::new(0.1, 0.0, 0.0));
        control.move_selected_xyz(Vec3::new(0.1, 0.0, 0.0));
        let moved = control.sources();
        control.commit_gesture();
        control.move_selected_xyz(Vec3::new(0.0, 0.5, 0.0));

        assert!(control.undo());
        assert_eq!(control.sources(), moved);
        assert!(control.undo());
        assert_eq!(control.sources(), start);
        assert!(!control.can_undo());
    }

    #[test]
    fn test_selection_is_not_recorded() {
        let mut control = surface();
        control.set_source_selected(0, true);
        control.select_all_sources(false);
        assert!(!control.can_undo());
        assert_eq!(control.version(), 2);
    }

    #[test]
    fn test_unlocking_unmutes_sources() {
        let mut control = surface();
        control.update_unrecorded(|sources| {
            sources.get_mut(0).map(|s| s.set_muted(true)).is_some()
        });
        assert!(control.sources()[0].is_muted());
        assert!(!control.toggle_lock_to_paths());
        assert!(!control.sources()[0].is_muted());
    }

    #[test]
    fn test_loop_edits_undo() {
        let mut control = surface();
        control.set_loop_region(2.0, 5.0).unwrap();
        control.set_looping_enabled(true);
        assert_eq!(control.loop_settings().active_region(), LoopRegion::new(2.0, 5.0).ok());
        assert!(control.undo());
        assert!(!control.loop_settings().enabled);
        assert!(control.undo());
        assert_eq!(control.loop_settings(), LoopSettings::default());
    }

    #[test]
    fn test_toggle_looping_uses_selected_automation() {
        let mut control = surface();
        control.set_source_selected(0, true);
        control.add_automation_point(1.0, 0.0);
        control.add_automation_point(3.0, 1.0);
        control.select_all_automation_points(true);
        let settings = control.toggle_looping(0.0, 10.0).unwrap();
        assert!(settings.enabled);
        assert_eq!((settings.begin, settings.end), (1.0, 3.0));
        // Same region again just flips looping.
        let settings = control.toggle_looping(0.0, 10.0).unwrap();
        assert!(!settings.enabled);
    }

    #[test]
    fn test_define_loop_region_twice_clears() {
        let mut control = surface();
        control.set_source_selected(0, true);
        control.add_automation_point(1.0, 0.0);
        control.add_automation_point(2.0, 1.0);
        control.select_all_automation_points(true);
        let first = control.define_loop_region_from_selection();
        assert_eq!((first.begin, first.end), (1.0, 2.0));
        let second = control.define_loop_region_from_selection();
        assert!(second.region().is_none());
    }

    #[test]
    fn test_path_position_bounds() {
        let control = surface();
        assert!(control.set_path_position(3, 0.4));
        assert!(!control.set_path_position(MAX_SOURCES, 0.4));
        assert!(!control.set_path_position(0, f32::NAN));
    }
}
