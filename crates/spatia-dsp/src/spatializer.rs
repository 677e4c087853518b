//! Binaural filtering of a mono source.
//!
//! A source position selects a stereo impulse response interpolated from the
//! dataset grid. The mono block is convolved with that filter; whenever the
//! filter changes, the output crossfades from the old filter to the new one
//! over one impulse length so moving sources do not click.

use crate::dataset::{HrirDataset, HrirLayout};
use spatia_core::ProcessingMode;
use spatia_scene::{Spherical, MIN_RADIUS};
use std::f32::consts::{PI, TAU};

/// Distance at which the attenuation gain is unity.
pub const REFERENCE_DISTANCE: f32 = 1.0;

/// Upper bound of the attenuation gain for very close sources.
pub const MAX_DISTANCE_GAIN: f32 = 10.0;

/// Inverse-distance attenuation, capped at [`MAX_DISTANCE_GAIN`].
#[inline]
pub fn distance_gain(radius: f32) -> f32 {
    (REFERENCE_DISTANCE / radius.max(MIN_RADIUS)).min(MAX_DISTANCE_GAIN)
}

/// How finely filters are interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationQuality {
    /// Nearest distance step.
    #[default]
    Realtime,
    /// Interpolates between the two bracketing distance steps.
    Offline,
}

impl InterpolationQuality {
    pub fn from_mode(mode: ProcessingMode, host_is_offline: bool) -> Self {
        match mode.resolve(host_is_offline) {
            ProcessingMode::Offline => InterpolationQuality::Offline,
            _ => InterpolationQuality::Realtime,
        }
    }
}

/// A left/right impulse response pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StereoFilter {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoFilter {
    pub fn new(len: usize) -> Self {
        Self {
            left: vec![0.0; len],
            right: vec![0.0; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.left.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }

    /// Adds `weight` times an impulse pair, optionally with channels swapped.
    fn accumulate(&mut self, weight: f32, [left, right]: [&[f32]; 2], swap: bool) {
        let (left, right) = if swap { (right, left) } else { (left, right) };
        for (out, &h) in self.left.iter_mut().zip(left) {
            *out += weight * h;
        }
        for (out, &h) in self.right.iter_mut().zip(right) {
            *out += weight * h;
        }
    }

    /// Moves `self` toward `other` by `t`.
    fn blend_toward(&mut self, other: &StereoFilter, t: f32) {
        for (a, &b) in self.left.iter_mut().zip(&other.left) {
            *a += (b - *a) * t;
        }
        for (a, &b) in self.right.iter_mut().zip(&other.right) {
            *a += (b - *a) * t;
        }
    }

    /// One output sample for `window`, which holds the most recent
    /// `len()` input samples, oldest first.
    #[inline]
    fn convolve(&self, window: &[f32]) -> (f32, f32) {
        let mut left = 0.0;
        let mut right = 0.0;
        for ((&x, &hl), &hr) in window.iter().rev().zip(&self.left).zip(&self.right) {
            left += x * hl;
            right += x * hr;
        }
        (left, right)
    }
}

/// Interpolates the stereo filter for `position` into `out`.
///
/// Azimuth and elevation are interpolated bilinearly. At elevation exactly 0
/// or π only the pole entry contributes. With the mirrored layout, azimuths
/// in (π, 2π) are reflected into [0, π] with the channels swapped.
pub fn interpolate_filter(
    dataset: &HrirDataset,
    position: &Spherical,
    quality: InterpolationQuality,
    out: &mut StereoFilter,
) {
    out.clear();
    let shape = dataset.shape();
    let columns = dataset.columns();

    let mut azimuth = position.azimuth();
    let mut swap = false;
    if dataset.layout() == HrirLayout::Mirrored && azimuth > PI {
        azimuth = TAU - azimuth;
        swap = true;
    }

    let last_distance = shape.distance_steps - 1;
    let fd = shape.distance_index(position.radius());
    let (d0, d1, td) = match quality {
        InterpolationQuality::Realtime => {
            let nearest = (fd.round() as usize).min(last_distance);
            (nearest, nearest, 0.0)
        }
        InterpolationQuality::Offline => {
            let lower = (fd.floor() as usize).min(last_distance);
            (lower, (lower + 1).min(last_distance), fd - lower as f32)
        }
    };

    let last_row = shape.elevation_steps;
    let elevation = position.elevation();
    let fe = if elevation >= PI {
        last_row as f32
    } else {
        (elevation / shape.elevation_spacing()).clamp(0.0, last_row as f32)
    };
    let e0 = (fe.floor() as usize).min(last_row);
    let e1 = (e0 + 1).min(last_row);
    let te = fe - e0 as f32;

    let fa = (azimuth / shape.azimuth_spacing()).max(0.0);
    let a_floor = fa.floor() as usize;
    let ta = fa - a_floor as f32;
    let (a0, a1) = match dataset.layout() {
        HrirLayout::Mirrored => (a_floor.min(columns - 1), (a_floor + 1).min(columns - 1)),
        HrirLayout::Full => (a_floor % columns, (a_floor + 1) % columns),
    };

    for (d, wd) in [(d0, 1.0 - td), (d1, td)] {
        if wd <= 0.0 {
            continue;
        }
        for (e, we) in [(e0, 1.0 - te), (e1, te)] {
            if we <= 0.0 {
                continue;
            }
            if e == 0 || e == last_row {
                out.accumulate(wd * we, dataset.impulse(d, 0, e), swap);
                continue;
            }
            for (a, wa) in [(a0, 1.0 - ta), (a1, ta)] {
                if wa <= 0.0 {
                    continue;
                }
                out.accumulate(wd * we * wa, dataset.impulse(d, a, e), swap);
            }
        }
    }
}

/// Per-source convolver with filter crossfading.
#[derive(Debug, Clone)]
pub struct Spatializer {
    current: StereoFilter,
    previous: StereoFilter,
    target: StereoFilter,
    has_filter: bool,
    fading: bool,
    fade_pos: usize,
    /// Last `impulse_length - 1` input samples followed by the current block.
    work: Vec<f32>,
    max_block: usize,
}

impl Spatializer {
    pub fn new(impulse_length: usize, max_block: usize) -> Self {
        let impulse_length = impulse_length.max(1);
        Self {
            current: StereoFilter::new(impulse_length),
            previous: StereoFilter::new(impulse_length),
            target: StereoFilter::new(impulse_length),
            has_filter: false,
            fading: false,
            fade_pos: 0,
            work: vec![0.0; impulse_length - 1 + max_block],
            max_block,
        }
    }

    #[inline]
    pub fn impulse_length(&self) -> usize {
        self.current.len()
    }

    pub fn max_block(&self) -> usize {
        self.max_block
    }

    /// Resizes the block buffer. Input history is kept.
    pub fn allocate(&mut self, max_block: usize) {
        self.max_block = max_block;
        self.work.resize(self.impulse_length() - 1 + max_block, 0.0);
    }

    /// Drops input history and any crossfade. The next target is applied
    /// without fading.
    pub fn reset(&mut self) {
        self.work.fill(0.0);
        self.fading = false;
        self.fade_pos = 0;
        self.has_filter = false;
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    pub fn current_filter(&self) -> &StereoFilter {
        &self.current
    }

    /// Points the convolver at a new position.
    pub fn set_target(
        &mut self,
        dataset: &HrirDataset,
        position: &Spherical,
        quality: InterpolationQuality,
    ) {
        interpolate_filter(dataset, position, quality, &mut self.target);
        if self.target.len() != self.current.len() {
            return;
        }
        if !self.has_filter {
            self.current.clone_from(&self.target);
            self.has_filter = true;
            self.fading = false;
            return;
        }
        if self.target == self.current {
            return;
        }
        if self.fading {
            // Freeze the blend heard right now as the fade-out filter.
            let t = self.fade_pos as f32 / self.impulse_length() as f32;
            self.previous.blend_toward(&self.current, t);
        } else {
            self.previous.clone_from(&self.current);
        }
        std::mem::swap(&mut self.current, &mut self.target);
        self.fading = true;
        self.fade_pos = 0;
    }

    /// Convolves `input` and adds the result into the outputs. The gain
    /// ramps linearly from `gain_start` to `gain_end` across the block.
    pub fn process(
        &mut self,
        input: &[f32],
        out_left: &mut [f32],
        out_right: &mut [f32],
        gain_start: f32,
        gain_end: f32,
    ) {
        let len = self.impulse_length();
        let n = input
            .len()
            .min(out_left.len())
            .min(out_right.len())
            .min(self.max_block);
        if n == 0 {
            return;
        }
        self.work[len - 1..len - 1 + n].copy_from_slice(&input[..n]);

        let gain_step = (gain_end - gain_start) / n as f32;
        for i in 0..n {
            let window = &self.work[i..i + len];
            let (mut left, mut right) = self.current.convolve(window);
            if self.fading {
                let (prev_left, prev_right) = self.previous.convolve(window);
                self.fade_pos += 1;
                let t = self.fade_pos as f32 / len as f32;
                left = prev_left + (left - prev_left) * t;
                right = prev_right + (right - prev_right) * t;
                if self.fade_pos >= len {
                    self.fading = false;
                }
            }
            let gain = gain_start + gain_step * (i + 1) as f32;
            out_left[i] += gain * left;
            out_right[i] += gain * right;
        }

        self.work.copy_within(n..n + len - 1, 0);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::dataset::HrirDataset;
    use crate::grid::GridShape;

    pub fn small_shape() -> GridShape {
        GridShape {
            distance_steps: 3,
            azimuth_steps: 8,
            elevation_steps: 4,
            impulse_length: 4,
            min_distance: 0.5,
            max_distance: 2.5,
        }
    }

    /// Smoothly varying synthetic data. The front and back columns are
    /// left/right symmetric, as a real head is.
    pub fn synthetic(shape: GridShape) -> HrirDataset {
        let columns = shape.mirrored_columns();
        let mut samples = Vec::with_capacity(shape.mirrored_len());
        for d in 0..shape.distance_steps {
            for a in 0..columns {
                for e in 1..shape.elevation_steps {
                    for ch in 0..2 {
                        for t in 0..shape.impulse_length {
                            let base = 0.1 * (d + 1) as f32
                                + (0.7 * a as f32 + 1.3 * e as f32 + 0.5 * t as f32).sin();
                            let side = if ch == 1 && a != 0 && a != columns - 1 {
                                0.25 * (a as f32).cos()
                            } else {
                                0.0
                            };
                            samples.push(base + side);
                        }
                    }
                }
            }
        }
        for d in 0..shape.distance_steps {
            for pole in 0..2 {
                for t in 0..shape.impulse_length {
                    samples.push(0.2 * (d + 1) as f32 + 0.1 * (pole * 3 + t) as f32);
                }
            }
        }
        HrirDataset::from_samples(shape, samples).expect("synthetic dataset has the right size")
    }
}
