//! Internal playback position derived from the host playhead.

use super::looping::LoopRegion;
use super::playhead::HostPlayhead;

/// Result of advancing the clock by one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockTick {
    /// Internal playback position in seconds for the first sample of the block.
    pub position: f64,
    /// The block crossed the loop end.
    pub looped: bool,
    /// The position does not continue the previous block and the jump was not
    /// caused by looping. Render history should be discarded.
    pub discontinuous: bool,
}

/// Audio-thread playback clock.
///
/// Without a loop region the internal position is the host position. With
/// one, contiguous playback advances by the previous block's duration and
/// wraps at the loop end, so editing the region mid-playback never jumps.
/// A host jump folds the host time into the region relative to its start.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    prev_position: f64,
    prev_host_time: f64,
    prev_block_secs: f64,
    started: bool,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> f64 {
        self.prev_position
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn advance(
        &mut self,
        playhead: &HostPlayhead,
        block_secs: f64,
        region: Option<LoopRegion>,
    ) -> ClockTick {
        let expected_host = self.prev_host_time + self.prev_block_secs;
        let follows = self.started
            && playhead.is_playing
            && (expected_host - playhead.time_secs).abs() < block_secs;

        let mut looped = false;
        let position = match region {
            Some(region) => {
                let position = if follows {
                    let advanced = (self.prev_position + self.prev_block_secs).max(region.begin);
                    if advanced >= region.end {
                        region.wrap(advanced)
                    } else {
                        advanced
                    }
                } else {
                    region.wrap(playhead.time_secs)
                };
                // A host seek is never a loop wrap, even from the loop end.
                looped = follows
                    && self.prev_position < region.end
                    && self.prev_position + self.prev_block_secs >= region.end;
                position
            }
            None => playhead.time_secs,
        };

        let expected = self.prev_position + self.prev_block_secs;
        let discontinuous = !self.started || (!looped && (expected - position).abs() > block_secs);

        self.prev_position = position;
        self.prev_host_time = playhead.time_secs;
        self.prev_block_secs = block_secs;
        self.started = true;

        ClockTick {
            position,
            looped,
            discontinuous,
        }
    }
}
