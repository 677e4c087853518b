//! Transport values published by the audio thread for the control surface.

use super::playhead::{HostPlayhead, MusicalTime, TimeSignature};
use crate::compat::{AtomicU64, AtomicUsize, Ordering};
use crate::{AtomicDouble, AtomicFlag};

/// Written once per block by the audio thread, read by control threads.
#[derive(Debug)]
pub struct TransportState {
    position_secs: AtomicDouble,
    playing: AtomicFlag,
    bpm: AtomicDouble,
    time_sig_numerator: AtomicUsize,
    time_sig_denominator: AtomicUsize,
    /// UI frames since the audio thread last ran.
    frames_since_block: AtomicU64,
}

impl Default for TransportState {
    fn default() -> Self {
        let defaults = HostPlayhead::default();
        Self {
            position_secs: AtomicDouble::new(0.0),
            playing: AtomicFlag::new(false),
            bpm: AtomicDouble::new(defaults.bpm),
            time_sig_numerator: AtomicUsize::new(defaults.time_signature.numerator as usize),
            time_sig_denominator: AtomicUsize::new(defaults.time_signature.denominator as usize),
            frames_since_block: AtomicU64::new(0),
        }
    }
}

impl TransportState {
    /// Audio thread: record the playhead and internal position for this block.
    #[inline]
    pub fn publish_block(&self, playhead: &HostPlayhead, position_secs: f64) {
        self.position_secs.set(position_secs);
        self.playing.set(playhead.is_playing);
        self.bpm.set(playhead.bpm);
        self.time_sig_numerator
            .store(playhead.time_signature.numerator as usize, Ordering::Relaxed);
        self.time_sig_denominator
            .store(playhead.time_signature.denominator as usize, Ordering::Relaxed);
        self.frames_since_block.store(0, Ordering::Relaxed);
    }

    pub fn position_secs(&self) -> f64 {
        self.position_secs.get()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    pub fn bpm(&self) -> f64 {
        self.bpm.get()
    }

    pub fn time_signature(&self) -> TimeSignature {
        TimeSignature::new(
            self.time_sig_numerator.load(Ordering::Relaxed) as u32,
            self.time_sig_denominator.load(Ordering::Relaxed) as u32,
        )
    }

    /// Watchdog called once per UI frame.
    ///
    /// Hosts stop calling the audio callback when playback stops in some
    /// configurations, so `playing` is cleared once no block has arrived for
    /// half a second of frames.
    pub fn reset_playing(&self, frame_rate: f32) {
        if !self.playing.get() {
            return;
        }
        let frames = self.frames_since_block.fetch_add(1, Ordering::Relaxed) + 1;
        if frames as f32 > 0.5 * frame_rate {
            self.playing.set(false);
            tracing::debug!("No audio block for {} frames, clearing playing", frames);
        }
    }

    /// Bar/beat display for a time using the host's last tempo.
    pub fn musical_time(&self, secs: f64) -> crate::Result<MusicalTime> {
        MusicalTime::from_seconds(secs, self.bpm(), self.time_signature())
    }
}
