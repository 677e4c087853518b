//! Linear interpolation resampler for the host ↔ dataset rate conversion.
//!
//! Each output sample interpolates between the previous and the current
//! input sample, so the stream is delayed by one input sample. The
//! fractional read position is carried across calls.

#[derive(Debug, Clone)]
pub struct LinearResampler {
    input_rate: f64,
    output_rate: f64,
    /// Input samples advanced per output sample.
    step: f64,
    /// Read position relative to the first sample of the next call.
    position: f64,
    last: f32,
}

impl LinearResampler {
    pub fn new(input_rate: f64, output_rate: f64) -> Self {
        let step = if input_rate > 0.0 && output_rate > 0.0 {
            input_rate / output_rate
        } else {
            1.0
        };
        Self {
            input_rate,
            output_rate,
            step,
            position: 0.0,
            last: 0.0,
        }
    }

    pub fn input_rate(&self) -> f64 {
        self.input_rate
    }

    pub fn output_rate(&self) -> f64 {
        self.output_rate
    }

    /// `true` when input and output rates match.
    pub fn is_identity(&self) -> bool {
        self.input_rate == self.output_rate
    }

    /// Upper bound on the output of one [`LinearResampler::process`] call
    /// with `input_len` samples.
    pub fn max_output_len(&self, input_len: usize) -> usize {
        (input_len as f64 / self.step).ceil() as usize + 1
    }

    pub fn reset(&mut self) {
        self.position = 0.0;
        self.last = 0.0;
    }

    #[inline]
    fn sample(&self, input: &[f32], position: f64) -> f32 {
        let index = position as usize;
        let frac = (position - index as f64) as f32;
        let a = if index == 0 { self.last } else { input[index - 1] };
        let b = input[index];
        a + (b - a) * frac
    }

    /// Resamples at the configured ratio. Returns the number of samples
    /// written, which varies by at most one between calls of equal length.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> usize {
        let Some(&last) = input.last() else {
            return 0;
        };
        let mut written = 0;
        let mut position = self.position;
        while (position as usize) < input.len() && written < output.len() {
            output[written] = self.sample(input, position);
            written += 1;
            position += self.step;
        }
        self.position = (position - input.len() as f64).max(0.0);
        self.last = last;
        written
    }

    /// Stretches `input` onto exactly `output.len()` samples.
    ///
    /// Used on the return trip so the host always gets back the block size
    /// it delivered, whatever count the forward conversion produced.
    pub fn process_exact(&mut self, input: &[f32], output: &mut [f32]) {
        let Some(&last) = input.last() else {
            output.fill(self.last);
            return;
        };
        if output.is_empty() {
            self.last = last;
            return;
        }
        let step = input.len() as f64 / output.len() as f64;
        for (k, out) in output.iter_mut().enumerate() {
            let position = (k as f64 * step).min((input.len() - 1) as f64);
            *out = self.sample(input, position);
        }
        self.position = 0.0;
        self.last = last;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_delays_one_sample() {
        let mut resampler = LinearResampler::new(44100.0, 44100.0);
        let mut output = [0.0; 5];
        let written = resampler.process(&[1.0, 2.0, 3.0, 4.0], &mut output);
        assert_eq!(written, 4);
        assert_eq!(&output[..4], &[0.0, 1.0, 2.0, 3.0]);
        resampler.process(&[5.0], &mut output);
        assert_eq!(output[0], 4.0);
    }

    #[test]
    fn test_upsample_doubles_count() {
        let mut resampler = LinearResampler::new(22050.0, 44100.0);
        let mut output = [0.0; 16];
        let written = resampler.process(&[0.0, 2.0, 4.0, 6.0], &mut output);
        assert_eq!(written, 8);
        assert_eq!(&output[..8], &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_output_bounded_over_many_calls() {
        let mut resampler = LinearResampler::new(48000.0, 44100.0);
        let input = [0.5; 512];
        let mut output = vec![0.0; resampler.max_output_len(512)];
        let mut total = 0;
        for _ in 0..100 {
            let written = resampler.process(&input, &mut output);
            assert!(written <= output.len());
            assert!((470..=471).contains(&written));
            total += written;
        }
        let expected = 100.0 * 512.0 * 44100.0 / 48000.0;
        assert!((total as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn test_process_exact_fills_output() {
        let mut resampler = LinearResampler::new(44100.0, 48000.0);
        let mut output = [9.0; 6];
        resampler.process_exact(&[1.0, 1.0, 1.0, 1.0], &mut output);
        assert_eq!(output[0], 0.0);
        assert_relative_eq!(output[5], 1.0);
        assert!(output.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_empty_input() {
        let mut resampler = LinearResampler::new(48000.0, 44100.0);
        let mut output = [3.0; 4];
        assert_eq!(resampler.process(&[], &mut output), 0);
        resampler.process_exact(&[], &mut output);
        assert_eq!(output, [0.0; 4]);
    }
}
