//! State shared between the audio processor and the control surface.
//!
//! Everything here is read by the audio thread without blocking: the source
//! registry through [`RealtimeShared::try_acquire`], loop settings through
//! `ArcSwap`, the rest through aligned atomics.

use spatia_core::config::clamp_speed_of_sound;
use spatia_core::{
    AtomicCounter, AtomicFlag, AtomicFloat, AtomicVec3, EngineConfig, LoopControl, LoopSettings,
    ProcessingMode, RealtimeShared, TransportState, MAX_SOURCES,
};
use spatia_scene::Sources;
use std::sync::atomic::{AtomicU32, Ordering};

/// Render toggles and levels the control surface edits while playing.
#[derive(Debug)]
pub struct RenderSettings {
    doppler: AtomicFlag,
    speed_of_sound: AtomicFloat,
    lock_to_paths: AtomicFlag,
    processing_mode: AtomicU32,
    wet_volume: AtomicFloat,
    dry_volume: AtomicFloat,
}

impl RenderSettings {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            doppler: AtomicFlag::new(false),
            speed_of_sound: AtomicFloat::new(clamp_speed_of_sound(config.speed_of_sound)),
            lock_to_paths: AtomicFlag::new(true),
            processing_mode: AtomicU32::new(config.processing_mode.as_index()),
            wet_volume: AtomicFloat::new(1.0),
            dry_volume: AtomicFloat::new(0.0),
        }
    }

    #[inline]
    pub fn doppler_enabled(&self) -> bool {
        self.doppler.get()
    }

    pub fn set_doppler_enabled(&self, enabled: bool) {
        self.doppler.set(enabled);
    }

    /// Returns the new state.
    pub fn toggle_doppler(&self) -> bool {
        self.doppler.toggle()
    }

    #[inline]
    pub fn speed_of_sound(&self) -> f32 {
        self.speed_of_sound.get()
    }

    /// Stores the speed clamped into the supported range and returns it.
    pub fn set_speed_of_sound(&self, speed: f32) -> f32 {
        let speed = clamp_speed_of_sound(speed);
        self.speed_of_sound.set(speed);
        speed
    }

    #[inline]
    pub fn locked_to_paths(&self) -> bool {
        self.lock_to_paths.get()
    }

    pub(crate) fn set_locked_to_paths(&self, locked: bool) {
        self.lock_to_paths.set(locked);
    }

    #[inline]
    pub fn processing_mode(&self) -> ProcessingMode {
        ProcessingMode::from_index(self.processing_mode.load(Ordering::Relaxed)).unwrap_or_default()
    }

    pub fn set_processing_mode(&self, mode: ProcessingMode) {
        self.processing_mode.store(mode.as_index(), Ordering::Relaxed);
    }

    #[inline]
    pub fn wet_volume(&self) -> f32 {
        self.wet_volume.get()
    }

    #[inline]
    pub fn dry_volume(&self) -> f32 {
        self.dry_volume.get()
    }

    /// Levels are linear gains; negative or non-finite values store 0.
    pub fn set_wet_dry(&self, wet: f32, dry: f32) {
        self.wet_volume.set(sanitize_volume(wet));
        self.dry_volume.set(sanitize_volume(dry));
    }
}

fn sanitize_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.max(0.0)
    } else {
        0.0
    }
}

/// Counters the audio thread bumps, for diagnostics.
#[derive(Debug, Default)]
pub struct ProcessorStats {
    blocks: AtomicCounter,
    contended_blocks: AtomicCounter,
    reallocations: AtomicCounter,
}

impl ProcessorStats {
    /// Blocks rendered.
    pub fn blocks(&self) -> u64 {
        self.blocks.get()
    }

    /// Blocks rendered from extrapolated positions because the source
    /// registry was busy.
    pub fn contended_blocks(&self) -> u64 {
        self.contended_blocks.get()
    }

    /// Buffer resizes triggered by a changed block size or sample rate.
    pub fn reallocations(&self) -> u64 {
        self.reallocations.get()
    }

    pub(crate) fn record_block(&self) {
        self.blocks.increment();
    }

    pub(crate) fn record_contended(&self) -> u64 {
        self.contended_blocks.increment()
    }

    pub(crate) fn record_reallocation(&self) {
        self.reallocations.increment();
    }
}

#[derive(Debug)]
pub(crate) struct EngineShared {
    pub config: EngineConfig,
    pub sources: RealtimeShared<Sources>,
    pub loop_control: LoopControl,
    pub transport: TransportState,
    pub settings: RenderSettings,
    /// Host-automated path parameter per source, used when a source has no
    /// automation curve.
    pub path_positions: [AtomicFloat; MAX_SOURCES],
    /// Positions the audio thread last rendered, for display.
    pub live_positions: [AtomicVec3; MAX_SOURCES],
    pub stats: ProcessorStats,
}

impl EngineShared {
    pub fn new(config: EngineConfig) -> Self {
        let settings = RenderSettings::new(&config);
        let sources = Sources::default().capped(config.max_sources);
        Self {
            config,
            sources: RealtimeShared::new(sources),
            loop_control: LoopControl::new(LoopSettings::default()),
            transport: TransportState::default(),
            settings,
            path_positions: std::array::from_fn(|_| AtomicFloat::new(0.0)),
            live_positions: std::array::from_fn(|_| AtomicVec3::default()),
            stats: ProcessorStats::default(),
        }
    }
}
