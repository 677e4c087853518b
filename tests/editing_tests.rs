//! Editing workflow tests: undo/redo, drag coalescing, path locking and
//! saved state.
//!
//! Run with:
//! ```bash
//! cargo test -p spatia --test editing_tests
//! ```

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{
    render, test_grid, test_spatia, textured_samples, write_dataset, TEST_BUFFER_SIZE,
    TEST_SAMPLE_RATE,
};
use spatia::prelude::*;
use spatia::{Sources, MAX_SOURCES};
use tempfile::NamedTempFile;

fn session() -> (ControlSurface, SpatialProcessor, NamedTempFile) {
    let (spatia, file) = test_spatia(TEST_SAMPLE_RATE);
    let (processor, control) = spatia.split();
    (control, processor, file)
}

// =============================================================================
// Undo / redo
// =============================================================================

#[test]
fn test_undo_redo_restores_each_state() {
    let (mut control, _processor, _file) = session();
    let initial = control.sources();

    control.add_source(Vec3::new(0.0, 1.0, 0.0));
    let added = control.sources();
    control.drop_path_point(Some(Vec3::new(2.0, 0.0, 0.0)));
    let dropped = control.sources();

    assert!(control.undo());
    assert_eq!(control.sources(), added);
    assert!(control.undo());
    assert_eq!(control.sources(), initial);
    assert!(!control.can_undo());

    assert!(control.redo());
    assert_eq!(control.sources(), added);
    assert!(control.redo());
    assert_eq!(control.sources(), dropped);
    assert!(!control.can_redo());
}

#[test]
fn test_new_edit_discards_redo() {
    let (mut control, _processor, _file) = session();
    control.add_source(Vec3::new(0.0, 1.0, 0.0));
    control.undo();
    assert!(control.can_redo());
    control.add_source(Vec3::new(0.0, -1.0, 0.0));
    assert!(!control.can_redo());
}

#[test]
fn test_drag_steps_form_one_undo_step() {
    let (mut control, _processor, _file) = session();
    control.set_source_selected(0, true);
    let start = control.sources();

    for _ in 0..10 {
        control.move_selected_rae(1.05, 0.01, 0.0);
    }
    assert_ne!(control.sources(), start);
    control.commit_gesture();

    assert!(control.undo());
    assert_eq!(control.sources(), start);
    assert!(!control.can_undo());
}

#[test]
fn test_discrete_edit_ends_drag() {
    let (mut control, _processor, _file) = session();
    control.set_source_selected(0, true);
    let start = control.sources();
    control.move_selected_xyz(Vec3::new(0.2, 0.0, 0.0));
    let moved = control.sources();
    control.add_automation_point(0.5, 0.5);

    assert!(control.undo());
    assert_eq!(control.sources(), moved);
    assert!(control.undo());
    assert_eq!(control.sources(), start);
}

#[test]
fn test_settings_toggles_are_not_undo_steps() {
    let (control, _processor, _file) = session();
    assert!(control.toggle_doppler());
    control.set_speed_of_sound(200.0);
    control.set_wet_dry(0.8, 0.1);
    assert!(!control.can_undo());
    assert!(control.settings().doppler_enabled());
    assert_eq!(control.settings().speed_of_sound(), 200.0);
}

// =============================================================================
// Path locking
// =============================================================================

#[test]
fn test_locked_source_ignores_moves_while_playing() {
    let (mut control, mut processor, _file) = session();
    control.set_source_selected(0, true);
    control.drop_path_point(Some(Vec3::new(2.0, 0.0, 0.0)));
    control.drop_path_point(Some(Vec3::new(0.0, 0.0, 2.0)));
    control.add_automation_point(0.0, 0.0);
    control.add_automation_point(4.0, 1.0);
    control.select_all_automation_points(true);

    render(
        &mut processor,
        &[0.0; TEST_BUFFER_SIZE],
        &HostPlayhead::playing_at(1.0),
    );
    assert!(control.transport().is_playing());

    let before = control.sources();
    assert!(!control.move_selected_xyz(Vec3::new(0.5, 0.0, 0.0)));
    assert_eq!(control.sources(), before);

    let moved = control.move_selected_automation_points(0.5, 0.0);
    assert_eq!(moved.moved, 2);
    assert!(!moved.clamped);
    let times: Vec<f32> = control.sources()[0]
        .automation()
        .points()
        .iter()
        .map(|p| p.time_secs)
        .collect();
    assert_eq!(times, vec![0.5, 4.5]);
}

#[test]
fn test_unlocked_source_moves_while_playing() {
    let (mut control, mut processor, _file) = session();
    control.set_source_selected(0, true);
    control.drop_path_point(Some(Vec3::new(2.0, 0.0, 0.0)));
    control.drop_path_point(Some(Vec3::new(0.0, 0.0, 2.0)));
    control.set_lock_to_paths(false);
    render(
        &mut processor,
        &[0.0; TEST_BUFFER_SIZE],
        &HostPlayhead::playing_at(1.0),
    );
    assert!(control.move_selected_xyz(Vec3::new(0.5, 0.0, 0.0)));
}

// =============================================================================
// Source limits
// =============================================================================

#[test]
fn test_source_count_is_bounded() {
    let (mut control, _processor, _file) = session();
    for index in 1..MAX_SOURCES {
        assert_eq!(control.add_source(Vec3::new(0.0, 1.0, 0.0)), Some(index));
    }
    assert_eq!(control.add_source(Vec3::new(0.0, 1.0, 0.0)), None);
    assert_eq!(control.sources().len(), MAX_SOURCES);

    // A full set copies nothing.
    control.select_all_sources(true);
    assert!(!control.copy_selected());
}

#[test]
fn test_configured_source_limit_is_enforced() {
    let grid = test_grid();
    let file = write_dataset(&textured_samples(&grid, 7));
    let (mut processor, mut control) = Spatia::builder()
        .max_sources(2)
        .grid(grid)
        .dataset_path(file.path())
        .build()
        .unwrap()
        .split();

    assert_eq!(control.add_source(Vec3::new(0.0, 1.0, 0.0)), Some(1));
    assert_eq!(control.add_source(Vec3::new(0.0, -1.0, 0.0)), None);
    control.select_all_sources(true);
    assert!(!control.copy_selected());
    assert!(processor.playable(2).is_none());

    let mut three = Sources::empty();
    for x in [1.0, 2.0, 3.0] {
        three.add_source_at(Vec3::new(x, 0.0, 0.0));
    }
    control.set_sources(three.clone());
    assert_eq!(control.sources().len(), 2);

    let (other, _other_file) = test_spatia(TEST_SAMPLE_RATE);
    let (_other_processor, mut other_control) = other.split();
    other_control.set_sources(three);
    let saved = other_control.save_state().unwrap();
    control.load_state(&saved).unwrap();
    assert_eq!(control.sources().len(), 2);
    assert_eq!(control.add_source(Vec3::new(0.0, 0.0, 1.0)), None);

    render(&mut processor, &[0.0; TEST_BUFFER_SIZE], &HostPlayhead::stopped_at(0.0));
    let live = control.live_position(1).unwrap();
    assert!((live.x - 2.0).abs() < 1e-4);
}

// =============================================================================
// Saved state
// =============================================================================

#[test]
fn test_saved_state_restores_into_new_instance() {
    let (mut control, _processor, _file) = session();
    control.set_source_selected(0, true);
    control.drop_path_point(Some(Vec3::new(2.0, 0.0, 0.0)));
    control.drop_path_point(Some(Vec3::new(0.0, 1.0, 0.0)));
    control.set_path_type(PathKind::Closed);
    control.add_automation_point(0.0, 0.0);
    control.add_automation_point(3.0, 1.0);
    control.add_source(Vec3::new(-1.0, 0.0, 0.5));
    control.set_doppler(true);
    control.set_speed_of_sound(300.0);
    control.set_processing_mode(ProcessingMode::Offline);
    control.set_wet_dry(0.7, 0.2);
    control.set_loop_region(1.0, 3.0).unwrap();
    control.set_looping_enabled(true);
    let saved = control.save_state().unwrap();

    let (mut restored, _restored_processor, _restored_file) = session();
    restored.add_source(Vec3::new(0.0, 0.0, 1.0));
    restored.load_state(&saved).unwrap();

    assert_eq!(restored.save_state().unwrap(), saved);
    assert_eq!(restored.sources().len(), 2);
    assert_eq!(restored.sources()[0].path().kind(), PathKind::Closed);
    assert!(restored.settings().doppler_enabled());
    assert_eq!(restored.settings().processing_mode(), ProcessingMode::Offline);
    assert!(restored.loop_settings().enabled);
    assert!(!restored.can_undo());
}

#[test]
fn test_foreign_state_leaves_session_untouched() {
    let (mut control, _processor, _file) = session();
    control.add_source(Vec3::new(0.0, 1.0, 0.0));
    let before = control.sources();

    let err = control.load_state(r#"{"tag": "SomethingElse", "sources": []}"#).unwrap_err();
    assert!(matches!(err, Error::UnrecognizedState { .. }));
    assert!(control.load_state("{ not json").is_err());

    assert_eq!(control.sources(), before);
    assert!(control.can_undo());
}

#[test]
fn test_partial_state_fills_defaults() {
    let (mut control, _processor, _file) = session();
    control
        .load_state(r#"{"tag": "SpatiaSettings", "speed_of_sound": 9999, "sources": [{"radius": 2.0}]}"#)
        .unwrap();
    assert_eq!(control.settings().speed_of_sound(), 500.0);
    assert_eq!(control.sources().len(), 1);
    assert_eq!(control.sources()[0].position().radius(), 2.0);
    assert!(!control.settings().doppler_enabled());
}

mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_undoing_every_add_restores_start(
            offsets in prop::collection::vec((-2.0f32..2.0, -2.0f32..2.0, -2.0f32..2.0), 1..12)
        ) {
            let (mut control, _processor, _file) = session();
            let initial = control.sources();
            let mut steps = 0;
            for (x, y, z) in offsets {
                if control.add_source(Vec3::new(x, y, z + 3.0)).is_some() {
                    steps += 1;
                }
            }
            prop_assert_eq!(control.sources().len(), (1 + steps).min(MAX_SOURCES));
            for _ in 0..steps {
                prop_assert!(control.undo());
            }
            prop_assert_eq!(control.sources(), initial);
            prop_assert!(!control.can_undo());
        }
    }
}
