//! Playhead, loop region and internal playback clock.

mod clock;
mod looping;
mod playhead;
mod state;

pub use clock::{ClockTick, PlaybackClock};
pub use looping::{LoopControl, LoopRegion, LoopSettings};
pub use playhead::{HostPlayhead, MusicalTime, TimeSignature};
pub use state::TransportState;
