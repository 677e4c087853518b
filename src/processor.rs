//! Audio-thread side of the engine.
//!
//! [`SpatialProcessor::process_block`] renders one host block:
//!
//! 1. grow buffers if the host delivered a larger block than prepared for
//! 2. advance the internal playback clock (looping) and publish transport
//! 3. downmix the inputs to mono and convert to the dataset rate
//! 4. read the source registry without blocking; when it is busy, keep
//!    rendering from positions extrapolated from the previous block
//! 5. spatialize every audible source into a shared stereo accumulator
//! 6. convert back to the host rate and mix wet and dry

use crate::shared::EngineShared;
use spatia_core::{Arc, HostPlayhead, PlaybackClock, HRIR_SAMPLE_RATE};
use spatia_dsp::{HrirDataset, InterpolationQuality, LinearResampler, PlayableSoundSource};

pub struct SpatialProcessor {
    shared: Arc<EngineShared>,
    dataset: Arc<HrirDataset>,
    playables: Vec<PlayableSoundSource>,
    /// Sources rendered on the last block that read the registry.
    active_sources: usize,
    clock: PlaybackClock,
    sample_rate: f64,
    /// Largest host block the buffers are sized for.
    capacity: usize,
    to_dataset_rate: LinearResampler,
    to_host_rate: [LinearResampler; 2],
    mono: Vec<f32>,
    rendered_input: Vec<f32>,
    wet: [Vec<f32>; 2],
    host_wet: [Vec<f32>; 2],
}

impl SpatialProcessor {
    pub(crate) fn new(shared: Arc<EngineShared>, dataset: Arc<HrirDataset>) -> Self {
        let config = &shared.config;
        let playables = (0..config.max_sources)
            .map(|_| {
                PlayableSoundSource::new(dataset.impulse_length(), config.max_doppler_delay_secs)
            })
            .collect();
        let sample_rate = config.sample_rate;
        let max_block = config.max_block_size;
        let mut processor = Self {
            shared,
            dataset,
            playables,
            active_sources: 0,
            clock: PlaybackClock::new(),
            sample_rate,
            capacity: 0,
            to_dataset_rate: LinearResampler::new(sample_rate, HRIR_SAMPLE_RATE),
            to_host_rate: [
                LinearResampler::new(HRIR_SAMPLE_RATE, sample_rate),
                LinearResampler::new(HRIR_SAMPLE_RATE, sample_rate),
            ],
            mono: Vec::new(),
            rendered_input: Vec::new(),
            wet: [Vec::new(), Vec::new()],
            host_wet: [Vec::new(), Vec::new()],
        };
        processor.prepare(sample_rate, max_block);
        processor
    }

    /// Sets the host rate and the largest expected block. Call before
    /// playback starts; this allocates.
    pub fn prepare(&mut self, sample_rate: f64, max_block: usize) {
        if sample_rate > 0.0 && sample_rate != self.sample_rate {
            tracing::debug!("Host sample rate changed to {sample_rate} Hz");
            self.sample_rate = sample_rate;
            self.to_dataset_rate = LinearResampler::new(sample_rate, HRIR_SAMPLE_RATE);
            self.to_host_rate = [
                LinearResampler::new(HRIR_SAMPLE_RATE, sample_rate),
                LinearResampler::new(HRIR_SAMPLE_RATE, sample_rate),
            ];
        }
        for playable in &mut self.playables {
            playable.set_sample_rate(HRIR_SAMPLE_RATE as f32);
            playable.reset_processing_state();
        }
        self.clock.reset();
        self.capacity = 0;
        self.allocate(max_block.max(1));

        // Seed positions so a contended first block still renders.
        let shared = Arc::clone(&self.shared);
        let sources = shared.sources.pin();
        for (playable, source) in self.playables.iter_mut().zip(sources.iter()) {
            playable.update_from_sound_source(source);
        }
        self.active_sources = sources.len().min(self.playables.len());
    }

    fn allocate(&mut self, max_block: usize) {
        let rendered_max = if self.is_resampling() {
            self.to_dataset_rate.max_output_len(max_block)
        } else {
            max_block
        };
        tracing::debug!(
            "Allocating render buffers for {max_block} host samples ({rendered_max} at dataset rate)"
        );
        self.mono = vec![0.0; max_block];
        self.rendered_input = vec![0.0; rendered_max];
        self.wet = [vec![0.0; rendered_max], vec![0.0; rendered_max]];
        self.host_wet = [vec![0.0; max_block], vec![0.0; max_block]];
        for playable in &mut self.playables {
            playable.allocate_for_max_buffer_size(rendered_max);
        }
        self.capacity = max_block;
        self.shared.stats.record_reallocation();
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// `true` when the host rate differs from the dataset rate.
    pub fn is_resampling(&self) -> bool {
        !self.to_dataset_rate.is_identity()
    }

    /// Latency added by the rate conversion, in host samples.
    pub fn latency_samples(&self) -> usize {
        usize::from(self.is_resampling())
    }

    /// How long output continues after the input falls silent.
    pub fn tail_length_secs(&self) -> f64 {
        (self.dataset.impulse_length() + self.latency_samples()) as f64 / self.sample_rate
    }

    pub fn dataset(&self) -> &Arc<HrirDataset> {
        &self.dataset
    }

    /// Render state of source slot `index`.
    pub fn playable(&self, index: usize) -> Option<&PlayableSoundSource> {
        self.playables.get(index)
    }

    /// Renders one block. `inputs` may hold any number of channels of at
    /// least `outputs` length; missing samples are treated as silence.
    pub fn process_block(
        &mut self,
        inputs: &[&[f32]],
        outputs: [&mut [f32]; 2],
        playhead: &HostPlayhead,
    ) {
        let [out_left, out_right] = outputs;
        let n = out_left.len().min(out_right.len());
        if n == 0 {
            return;
        }
        if n > self.capacity {
            self.allocate(n);
        }

        let shared = Arc::clone(&self.shared);
        let block_secs = n as f64 / self.sample_rate;
        let region = shared.loop_control.load().active_region();
        let tick = self.clock.advance(playhead, block_secs, region);
        shared.transport.publish_block(playhead, tick.position);

        let mono = &mut self.mono[..n];
        mono.fill(0.0);
        if !inputs.is_empty() {
            let scale = 1.0 / inputs.len() as f32;
            for channel in inputs {
                for (sum, sample) in mono.iter_mut().zip(channel.iter()) {
                    *sum += sample * scale;
                }
            }
        }

        let rendered_len = if self.is_resampling() {
            self.to_dataset_rate
                .process(&self.mono[..n], &mut self.rendered_input)
        } else {
            self.rendered_input[..n].copy_from_slice(&self.mono[..n]);
            n
        };
        let input = &self.rendered_input[..rendered_len];
        let [wet_left, wet_right] = &mut self.wet;
        let wet_left = &mut wet_left[..rendered_len];
        let wet_right = &mut wet_right[..rendered_len];
        wet_left.fill(0.0);
        wet_right.fill(0.0);

        let settings = &shared.settings;
        let quality = InterpolationQuality::from_mode(settings.processing_mode(), playhead.is_offline);
        let doppler = settings.doppler_enabled();
        let speed_of_sound = settings.speed_of_sound();
        let follow_paths = playhead.is_playing && settings.locked_to_paths();
        let dataset = &*self.dataset;

        match shared.sources.try_acquire() {
            Some(mut sources) => {
                let count = sources.len().min(self.playables.len());
                for (index, (source, playable)) in sources
                    .iter_mut()
                    .zip(self.playables.iter_mut())
                    .enumerate()
                {
                    if follow_paths {
                        let fallback = shared.path_positions[index].get();
                        source.set_parametric_position(
                            tick.position as f32,
                            &mut playable.prev_path_pos_index,
                            fallback,
                        );
                    }
                    // A slot that was idle last block starts without motion history.
                    if index >= self.active_sources {
                        playable.reset_processing_state();
                    }
                    playable.update_from_sound_source(source);
                    playable.set_doppler(doppler, speed_of_sound);
                    if tick.discontinuous {
                        playable.reset_processing_state();
                    }
                    playable.process_audio(input, wet_left, wet_right, dataset, quality);
                    shared.live_positions[index]
                        .set(playable.position().to_cartesian().to_array());
                }
                self.active_sources = count;
            }
            None => {
                let contended = shared.stats.record_contended();
                tracing::trace!("Source registry busy, extrapolating ({contended} blocks so far)");
                for (index, playable) in self.playables[..self.active_sources].iter_mut().enumerate()
                {
                    playable.advance_position();
                    playable.process_audio(input, wet_left, wet_right, dataset, quality);
                    shared.live_positions[index]
                        .set(playable.position().to_cartesian().to_array());
                }
            }
        }

        for (channel, resampler) in self.to_host_rate.iter_mut().enumerate() {
            let wet = &self.wet[channel][..rendered_len];
            let host = &mut self.host_wet[channel][..n];
            if resampler.is_identity() {
                host.copy_from_slice(wet);
            } else {
                resampler.process_exact(wet, host);
            }
        }

        let wet_gain = shared.config.output_gain * settings.wet_volume();
        let dry_gain = settings.dry_volume();
        for (channel, output) in [out_left, out_right].into_iter().enumerate() {
            let output = &mut output[..n];
            for (out, wet) in output.iter_mut().zip(&self.host_wet[channel][..n]) {
                *out = wet * wet_gain;
            }
            if dry_gain > 0.0 {
                // Mono input feeds both sides of the dry path.
                if let Some(dry) = inputs.get(channel).or_else(|| inputs.first()) {
                    for (out, sample) in output.iter_mut().zip(dry.iter()) {
                        *out += sample * dry_gain;
                    }
                }
            }
        }

        shared.stats.record_block();
    }
}
