//! Propagation delay with doppler shift.
//!
//! The delay follows the source distance, `r / c` seconds, and is swept
//! linearly across each block from the previous distance to the current
//! one. Reading a delay line whose delay changes over time resamples the
//! signal, which is the doppler shift.

use spatia_core::config::DEFAULT_SPEED_OF_SOUND;

#[derive(Debug, Clone)]
pub struct DopplerDelay {
    buffer: Vec<f32>,
    write_pos: usize,
    sample_rate: f32,
    speed_of_sound: f32,
    enabled: bool,
    /// Delay at the end of the previous block, in samples.
    delay: f32,
    primed: bool,
    ratio: f32,
}

impl DopplerDelay {
    /// Allocates room for `max_delay_secs` of delay plus one block.
    pub fn new(sample_rate: f32, max_delay_secs: f32, max_block: usize) -> Self {
        let capacity = (max_delay_secs.max(0.0) * sample_rate).ceil() as usize + max_block + 2;
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            sample_rate,
            speed_of_sound: DEFAULT_SPEED_OF_SOUND,
            enabled: false,
            delay: 0.0,
            primed: false,
            ratio: 1.0,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool, speed_of_sound: f32) {
        if enabled && !self.enabled {
            self.reset();
        }
        self.enabled = enabled;
        self.speed_of_sound = speed_of_sound.max(f32::EPSILON);
        if !enabled {
            self.ratio = 1.0;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn speed_of_sound(&self) -> f32 {
        self.speed_of_sound
    }

    /// Playback rate of the last processed block (1 = no shift, above 1 =
    /// approaching).
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Longest delay the line can hold, in samples.
    pub fn max_delay_samples(&self) -> f32 {
        self.buffer.len().saturating_sub(2) as f32
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.primed = false;
        self.ratio = 1.0;
    }

    fn delay_for(&self, radius: f32) -> f32 {
        let max = (self.buffer.len() as f32 - 2.0).max(0.0);
        (radius / self.speed_of_sound * self.sample_rate).clamp(0.0, max)
    }

    /// Delays `input` into `output` for a source now at `radius`. Passes the
    /// signal through unchanged while disabled.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], radius: f32) {
        let n = input.len().min(output.len());
        if !self.enabled || self.buffer.len() < 2 {
            output[..n].copy_from_slice(&input[..n]);
            self.ratio = 1.0;
            return;
        }
        if n == 0 {
            return;
        }

        let target = self.delay_for(radius);
        if !self.primed {
            self.delay = target;
            self.primed = true;
        }
        let start = self.delay;
        let step = (target - start) / n as f32;
        self.ratio = 1.0 - step;

        let len = self.buffer.len();
        for i in 0..n {
            self.buffer[self.write_pos] = input[i];
            let delay = (start + step * (i + 1) as f32).min(len as f32 - 2.0);
            let read = self.write_pos as f32 - delay;
            let read = if read < 0.0 { read + len as f32 } else { read };
            let index = read.floor() as usize % len;
            let frac = read - read.floor();
            let a = self.buffer[index];
            let b = self.buffer[(index + 1) % len];
            output[i] = a + (b - a) * frac;
            self.write_pos = (self.write_pos + 1) % len;
        }
        self.delay = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_disabled_passes_through() {
        let mut doppler = DopplerDelay::new(1000.0, 1.0, 4);
        let mut output = [0.0; 4];
        doppler.process(&[1.0, 2.0, 3.0, 4.0], &mut output, 100.0);
        assert_eq!(output, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(doppler.ratio(), 1.0);
    }

    #[test]
    fn test_static_source_is_pure_delay() {
        let mut doppler = DopplerDelay::new(1000.0, 1.0, 8);
        // 1 m at 250 m/s and 1 kHz is 4 samples.
        doppler.set_enabled(true, 250.0);
        let mut output = [0.0; 8];
        doppler.process(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], &mut output, 1.0);
        assert_relative_eq!(output[4], 1.0, epsilon = 1e-5);
        let leakage: f32 = output
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 4)
            .map(|(_, s)| s.abs())
            .sum();
        assert!(leakage < 1e-5);
        assert_relative_eq!(doppler.ratio(), 1.0);
    }

    #[test]
    fn test_approaching_source_raises_pitch() {
        let mut doppler = DopplerDelay::new(1000.0, 1.0, 10);
        doppler.set_enabled(true, 100.0);
        let mut output = [0.0; 10];
        doppler.process(&[0.0; 10], &mut output, 1.0);
        // Delay shrinks from 10 to 5 samples over 10 samples.
        doppler.process(&[0.0; 10], &mut output, 0.5);
        assert_relative_eq!(doppler.ratio(), 1.5, epsilon = 1e-6);
        doppler.process(&[0.0; 10], &mut output, 1.0);
        assert_relative_eq!(doppler.ratio(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_delay_clamped_to_capacity() {
        let mut doppler = DopplerDelay::new(1000.0, 0.01, 4);
        doppler.set_enabled(true, 1.0);
        let mut output = [0.0; 4];
        doppler.process(&[1.0; 4], &mut output, 1000.0);
        assert!(output.iter().all(|s| s.is_finite()));
        assert!(doppler.max_delay_samples() >= 10.0);
    }
}
