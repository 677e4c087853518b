//! Audio-thread render state of one source.

use crate::dataset::HrirDataset;
use crate::doppler::DopplerDelay;
use crate::spatializer::{distance_gain, InterpolationQuality, Spatializer};
use spatia_core::HRIR_SAMPLE_RATE;
use spatia_scene::{SoundSource, SourceFrame, SourceId, Spherical, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayableState {
    /// No buffers sized yet; processing is a no-op.
    Uninitialized,
    Ready,
    Processing,
}

/// Owned by the audio thread. Control threads never touch it; they edit the
/// [`SoundSource`] it is updated from.
#[derive(Debug, Clone)]
pub struct PlayableSoundSource {
    state: PlayableState,
    spatializer: Spatializer,
    doppler: DopplerDelay,
    delayed: Vec<f32>,
    sample_rate: f32,
    max_delay_secs: f32,
    position: Spherical,
    /// Cartesian movement over the last ingested block.
    velocity: Vec3,
    has_position: bool,
    muted: bool,
    gain: Option<f32>,
    /// Source the render history belongs to.
    source: Option<SourceId>,
    /// Automation segment matched on the previous block.
    pub prev_path_pos_index: usize,
}

impl PlayableSoundSource {
    pub fn new(impulse_length: usize, max_delay_secs: f32) -> Self {
        let sample_rate = HRIR_SAMPLE_RATE as f32;
        Self {
            state: PlayableState::Uninitialized,
            spatializer: Spatializer::new(impulse_length, 0),
            doppler: DopplerDelay::new(sample_rate, max_delay_secs, 0),
            delayed: Vec::new(),
            sample_rate,
            max_delay_secs,
            position: Spherical::default(),
            velocity: Vec3::ZERO,
            has_position: false,
            muted: false,
            gain: None,
            source: None,
            prev_path_pos_index: 0,
        }
    }

    pub fn state(&self) -> PlayableState {
        self.state
    }

    pub fn position(&self) -> Spherical {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn doppler_ratio(&self) -> f32 {
        self.doppler.ratio()
    }

    pub fn max_block(&self) -> usize {
        self.delayed.len()
    }

    fn rebuild_doppler(&mut self, max_block: usize) {
        let enabled = self.doppler.is_enabled();
        let speed_of_sound = self.doppler_speed();
        self.doppler = DopplerDelay::new(self.sample_rate, self.max_delay_secs, max_block);
        self.doppler.set_enabled(enabled, speed_of_sound);
    }

    fn doppler_speed(&self) -> f32 {
        self.doppler.speed_of_sound()
    }

    /// Sizes every buffer for blocks of up to `max_block` samples.
    pub fn allocate_for_max_buffer_size(&mut self, max_block: usize) {
        if self.state != PlayableState::Uninitialized && self.delayed.len() == max_block {
            return;
        }
        tracing::debug!("Allocating source buffers for {max_block} samples");
        self.spatializer.allocate(max_block);
        self.delayed = vec![0.0; max_block];
        self.rebuild_doppler(max_block);
        self.state = PlayableState::Ready;
    }

    /// Rate the source is rendered at, for doppler timing.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate == self.sample_rate || sample_rate <= 0.0 {
            return;
        }
        self.sample_rate = sample_rate;
        let max_block = self.delayed.len();
        self.rebuild_doppler(max_block);
    }

    pub fn set_doppler(&mut self, enabled: bool, speed_of_sound: f32) {
        self.doppler.set_enabled(enabled, speed_of_sound);
    }

    /// Ingests `source`. When the slot last rendered a different source
    /// (after a delete shifted indices, or an undo or load) its history is
    /// dropped first.
    pub fn update_from_sound_source(&mut self, source: &SoundSource) {
        if self.source != Some(source.id()) {
            self.reset_processing_state();
            self.prev_path_pos_index = 0;
            self.source = Some(source.id());
        }
        self.update_from_frame(source.frame());
    }

    /// Source this slot last ingested.
    pub fn source_id(&self) -> Option<SourceId> {
        self.source
    }

    /// Takes position and mute together.
    pub fn update_from_frame(&mut self, frame: SourceFrame) {
        if self.has_position {
            self.velocity = frame.position.to_cartesian() - self.position.to_cartesian();
        }
        self.position = frame.position;
        self.muted = frame.muted;
        self.has_position = true;
    }

    /// Continues the last known motion for one block. Used when the shared
    /// source state could not be read this block.
    pub fn advance_position(&mut self) {
        if self.velocity == Vec3::ZERO {
            return;
        }
        self.position = Spherical::from_cartesian(self.position.to_cartesian() + self.velocity);
    }

    /// Forgets crossfade, doppler and motion history, for transport jumps.
    pub fn reset_processing_state(&mut self) {
        self.spatializer.reset();
        self.doppler.reset();
        self.velocity = Vec3::ZERO;
        self.has_position = false;
        self.gain = None;
    }

    /// Renders `input` and adds it into the outputs. Does nothing before
    /// allocation or while muted.
    pub fn process_audio(
        &mut self,
        input: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
        dataset: &HrirDataset,
        quality: InterpolationQuality,
    ) {
        if self.state == PlayableState::Uninitialized || self.muted {
            return;
        }
        self.state = PlayableState::Processing;

        let n = input
            .len()
            .min(self.delayed.len())
            .min(out_left.len())
            .min(out_right.len());
        let radius = self.position.radius();
        self.doppler
            .process(&input[..n], &mut self.delayed[..n], radius);

        self.spatializer.set_target(dataset, &self.position, quality);
        let target_gain = distance_gain(radius);
        let start_gain = self.gain.unwrap_or(target_gain);
        self.spatializer.process(
            &self.delayed[..n],
            &mut out_left[..n],
            &mut out_right[..n],
            start_gain,
            target_gain,
        );
        self.gain = Some(target_gain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatializer::test_support::{small_shape, synthetic};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn frame_at(xyz: Vec3) -> SourceFrame {
        SourceFrame {
            position: Spherical::from_cartesian(xyz),
            muted: false,
        }
    }

    #[test]
    fn test_lifecycle() {
        let dataset = synthetic(small_shape());
        let mut source = PlayableSoundSource::new(4, 0.1);
        assert_eq!(source.state(), PlayableState::Uninitialized);

        let mut left = [0.0; 8];
        let mut right = [0.0; 8];
        source.process_audio(&[1.0; 8], &mut left, &mut right, &dataset, InterpolationQuality::Realtime);
        assert_eq!(left, [0.0; 8]);

        source.allocate_for_max_buffer_size(8);
        assert_eq!(source.state(), PlayableState::Ready);
        source.process_audio(&[1.0; 8], &mut left, &mut right, &dataset, InterpolationQuality::Realtime);
        assert_eq!(source.state(), PlayableState::Processing);
        assert!(left.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_muted_source_is_silent() {
        let dataset = synthetic(small_shape());
        let mut source = PlayableSoundSource::new(4, 0.1);
        source.allocate_for_max_buffer_size(4);
        source.update_from_frame(SourceFrame {
            position: Spherical::default(),
            muted: true,
        });
        let mut left = [0.0; 4];
        let mut right = [0.0; 4];
        source.process_audio(&[1.0; 4], &mut left, &mut right, &dataset, InterpolationQuality::Realtime);
        assert_eq!(left, [0.0; 4]);
        assert_eq!(right, [0.0; 4]);
    }

    #[test]
    fn test_advance_position_extrapolates_velocity() {
        let mut source = PlayableSoundSource::new(4, 0.1);
        source.update_from_frame(frame_at(Vec3::new(1.0, 0.0, 0.0)));
        source.update_from_frame(frame_at(Vec3::new(1.0, 0.0, 0.5)));
        source.advance_position();
        let xyz = source.position().to_cartesian();
        assert_relative_eq!(xyz.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(xyz.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_reset_forgets_motion() {
        let mut source = PlayableSoundSource::new(4, 0.1);
        source.update_from_frame(frame_at(Vec3::new(1.0, 0.0, 0.0)));
        source.reset_processing_state();
        source.update_from_frame(frame_at(Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(source.velocity(), Vec3::ZERO);
        source.advance_position();
        assert_relative_eq!(source.position().radius(), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_new_source_in_slot_drops_motion() {
        let mut slot = PlayableSoundSource::new(4, 0.1);
        let near = SoundSource::at_xyz(Vec3::new(1.0, 0.0, 0.0));
        let far = SoundSource::at_xyz(Vec3::new(-4.0, 0.0, 0.0));
        slot.update_from_sound_source(&near);
        slot.update_from_sound_source(&near);
        assert_eq!(slot.source_id(), Some(near.id()));

        slot.update_from_sound_source(&far);
        assert_eq!(slot.source_id(), Some(far.id()));
        assert_eq!(slot.velocity(), Vec3::ZERO);
        slot.advance_position();
        assert_relative_eq!(slot.position().to_cartesian().x, -4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_reallocation_keeps_doppler_setting() {
        let mut source = PlayableSoundSource::new(4, 0.1);
        source.set_doppler(true, 200.0);
        source.allocate_for_max_buffer_size(16);
        source.set_sample_rate(48000.0);
        assert!(source.doppler.is_enabled());
        assert_eq!(source.max_block(), 16);
    }

    #[test]
    fn test_distance_attenuates() {
        let dataset = synthetic(small_shape());
        let render = |radius: f32| {
            let mut source = PlayableSoundSource::new(4, 0.1);
            source.allocate_for_max_buffer_size(8);
            source.update_from_frame(SourceFrame {
                position: Spherical::new(radius, 0.0, FRAC_PI_2),
                muted: false,
            });
            let mut left = [0.0; 8];
            let mut right = [0.0; 8];
            source.process_audio(&[1.0; 8], &mut left, &mut right, &dataset, InterpolationQuality::Realtime);
            left[7]
        };
        // Same nearest distance step, so only the gain differs.
        let near = render(1.4);
        let far = render(1.6);
        assert_relative_eq!(near / far, 1.6 / 1.4, epsilon = 1e-4);
    }
}
