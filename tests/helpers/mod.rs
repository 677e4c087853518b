//! Test helpers and fixtures for Spatia integration tests.
//!
//! Instances are built against a small synthetic HRIR grid written to a
//! temporary file, so tests exercise the real file loading path without a
//! measured dataset.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough, unity gain)
//! - `DSP_EPSILON` (1e-4): Convolution and interpolation
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use spatia::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Rate of the dataset, so no resampling happens unless a test asks for it.
pub const TEST_SAMPLE_RATE: f64 = 44100.0;

pub const TEST_BUFFER_SIZE: usize = 64;

/// Three distance steps over 0.5..1.5 m so a source at 1 m sits exactly on
/// the middle step.
pub fn test_grid() -> GridShape {
    GridShape {
        distance_steps: 3,
        azimuth_steps: 8,
        elevation_steps: 4,
        impulse_length: 16,
        min_distance: 0.5,
        max_distance: 1.5,
    }
}

/// Pseudo-random impulse responses in file order, with the right channel
/// quieter than the left.
pub fn textured_samples(grid: &GridShape, seed: u64) -> Vec<f32> {
    let mut samples = generate_noise(grid.mirrored_len(), seed);
    let block = grid.impulse_length;
    let body = grid.mirrored_len() - grid.distance_steps * 2 * block;
    for (index, chunk) in samples[..body].chunks_mut(block).enumerate() {
        if index % 2 == 1 {
            chunk.iter_mut().for_each(|s| *s *= 0.6);
        }
    }
    samples
}

/// Writes samples as a little-endian dataset file.
pub fn write_dataset(samples: &[f32]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create dataset file");
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    file.write_all(&bytes).expect("Failed to write dataset file");
    file.flush().expect("Failed to flush dataset file");
    file
}

/// A renderer over a synthetic dataset file. Keep the returned file alive
/// for as long as the dataset path matters.
pub fn test_spatia(sample_rate: f64) -> (Spatia, NamedTempFile) {
    init_tracing();
    let grid = test_grid();
    let file = write_dataset(&textured_samples(&grid, 7));
    let spatia = Spatia::builder()
        .sample_rate(sample_rate)
        .max_block_size(TEST_BUFFER_SIZE)
        .grid(grid)
        .dataset_path(file.path())
        .build()
        .expect("Failed to create test renderer");
    (spatia, file)
}

/// Routes engine logs to the test harness. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Renders one block of mono `input`.
pub fn render(
    processor: &mut SpatialProcessor,
    input: &[f32],
    playhead: &HostPlayhead,
) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; input.len()];
    let mut right = vec![0.0; input.len()];
    processor.process_block(&[input], [&mut left, &mut right], playhead);
    (left, right)
}

/// Renders consecutive blocks of `input` while the host plays from
/// `start_secs`, returning both channels concatenated.
pub fn render_playing(
    processor: &mut SpatialProcessor,
    input: &[f32],
    start_secs: f64,
) -> (Vec<f32>, Vec<f32>) {
    let mut left = Vec::with_capacity(input.len());
    let mut right = Vec::with_capacity(input.len());
    for (index, block) in input.chunks(TEST_BUFFER_SIZE).enumerate() {
        let time = start_secs
            + (index * TEST_BUFFER_SIZE) as f64 / processor.sample_rate();
        let (l, r) = render(processor, block, &HostPlayhead::playing_at(time));
        left.extend(l);
        right.extend(r);
    }
    (left, right)
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate white noise (random samples in -1..1).
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Generate an impulse signal (single sample at 1.0, rest zeros).
pub fn generate_impulse(num_samples: usize, position: usize) -> Vec<f32> {
    let mut samples = vec![0.0; num_samples];
    if position < num_samples {
        samples[position] = 1.0;
    }
    samples
}

pub fn energy(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s * s).sum()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (energy(samples) / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}
