//! Loop region shared between the control surface and the audio thread.

use crate::{Error, Result};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// A half-open time region `[begin, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopRegion {
    pub begin: f64,
    pub end: f64,
}

impl LoopRegion {
    pub fn new(begin: f64, end: f64) -> Result<Self> {
        if !(begin.is_finite() && end.is_finite()) || begin < 0.0 || end <= begin {
            return Err(Error::InvalidLoopRegion { begin, end });
        }
        Ok(Self { begin, end })
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.begin
    }

    /// Folds any time into `[begin, end)`, measuring the offset from `begin`.
    #[inline]
    pub fn wrap(&self, secs: f64) -> f64 {
        let wrapped = self.begin + (secs - self.begin).rem_euclid(self.duration());
        // rem_euclid can round up to the full duration for tiny negative offsets.
        if wrapped >= self.end {
            self.begin
        } else {
            wrapped
        }
    }

    #[inline]
    pub fn contains(&self, secs: f64) -> bool {
        secs >= self.begin && secs < self.end
    }
}

/// Persisted loop settings. A region of `-1..-1` means none has been set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopSettings {
    pub begin: f64,
    pub end: f64,
    pub enabled: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            begin: -1.0,
            end: -1.0,
            enabled: false,
        }
    }
}

impl LoopSettings {
    /// Region to apply during playback, if looping is on and the bounds are valid.
    pub fn active_region(&self) -> Option<LoopRegion> {
        if !self.enabled {
            return None;
        }
        self.region()
    }

    pub fn region(&self) -> Option<LoopRegion> {
        LoopRegion::new(self.begin, self.end).ok()
    }
}

/// Lock-free holder for [`LoopSettings`].
///
/// The audio thread reads it once per block; control threads replace it
/// wholesale so begin and end are never observed from different edits.
#[derive(Debug, Default)]
pub struct LoopControl {
    settings: ArcSwap<LoopSettings>,
}

impl LoopControl {
    pub fn new(settings: LoopSettings) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
        }
    }

    #[inline]
    pub fn load(&self) -> LoopSettings {
        **self.settings.load()
    }

    pub fn store(&self, settings: LoopSettings) {
        self.settings.store(std::sync::Arc::new(settings));
    }

    pub fn set_region(&self, region: LoopRegion) {
        let mut settings = self.load();
        settings.begin = region.begin;
        settings.end = region.end;
        self.store(settings);
    }

    pub fn set_enabled(&self, enabled: bool) {
        let mut settings = self.load();
        settings.enabled = enabled;
        self.store(settings);
    }

    /// Toggles looping.
    ///
    /// `candidate` is a region derived from the current selection; it
    /// replaces the stored one when present. If the stored region does not
    /// overlap `fallback`, the fallback becomes the region. Any change to the
    /// region turns looping on; otherwise looping flips.
    pub fn toggle(&self, candidate: Option<LoopRegion>, fallback: LoopRegion) -> LoopSettings {
        let previous = self.load();
        let mut next = previous;
        if let Some(region) = candidate {
            next.begin = region.begin;
            next.end = region.end;
        }
        if fallback.begin > next.end || fallback.end < next.begin {
            next.begin = fallback.begin;
            next.end = fallback.end;
        }
        next.enabled = if next.begin != previous.begin || next.end != previous.end {
            true
        } else {
            !previous.enabled
        };
        self.store(next);
        tracing::debug!(
            "Looping {} over [{}, {})",
            if next.enabled { "enabled" } else { "disabled" },
            next.begin,
            next.end
        );
        next
    }
}
