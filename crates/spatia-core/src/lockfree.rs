//! Cache-line aligned atomics shared between the audio and control threads.

use crate::compat::{AtomicBool, AtomicU64, Ordering};
use atomic_float::{AtomicF32, AtomicF64};

macro_rules! aligned_atomic {
    ($(#[$meta:meta])* $name:ident, $inner:ty, $value:ty, $default:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        #[repr(align(64))]
        pub struct $name {
            value: $inner,
        }

        impl $name {
            pub fn new(value: $value) -> Self {
                Self {
                    value: <$inner>::new(value),
                }
            }

            #[inline]
            pub fn get(&self) -> $value {
                self.value.load(Ordering::Acquire)
            }

            #[inline]
            pub fn get_relaxed(&self) -> $value {
                self.value.load(Ordering::Relaxed)
            }

            #[inline]
            pub fn set(&self, value: $value) {
                self.value.store(value, Ordering::Release);
            }

            #[inline]
            pub fn swap(&self, value: $value) -> $value {
                self.value.swap(value, Ordering::AcqRel)
            }
        }

        impl Clone for $name {
            fn clone(&self) -> Self {
                Self::new(self.get())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new($default)
            }
        }
    };
}

aligned_atomic!(
    /// Atomic `f32`, used for gains, parameters and published coordinates.
    AtomicFloat,
    AtomicF32,
    f32,
    0.0
);

aligned_atomic!(
    /// Atomic `f64`, used for playback positions in seconds.
    AtomicDouble,
    AtomicF64,
    f64,
    0.0
);

aligned_atomic!(
    /// Atomic `bool` for toggles read once per block.
    AtomicFlag,
    AtomicBool,
    bool,
    false
);

aligned_atomic!(
    /// Monotonic event counter (blocks processed, contended blocks).
    AtomicCounter,
    AtomicU64,
    u64,
    0
);

impl AtomicFlag {
    /// Flips the flag and returns the new value.
    #[inline]
    pub fn toggle(&self) -> bool {
        !self.value.fetch_xor(true, Ordering::AcqRel)
    }
}

impl AtomicCounter {
    #[inline]
    pub fn increment(&self) -> u64 {
        self.value.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Three aligned floats publishing a cartesian position for display.
///
/// Components are stored independently; a reader racing a writer may see a
/// mix of two consecutive positions, which is fine for drawing.
#[derive(Debug, Clone, Default)]
pub struct AtomicVec3 {
    components: [AtomicFloat; 3],
}

impl AtomicVec3 {
    pub fn new(xyz: [f32; 3]) -> Self {
        Self {
            components: xyz.map(AtomicFloat::new),
        }
    }

    #[inline]
    pub fn get(&self) -> [f32; 3] {
        [
            self.components[0].get(),
            self.components[1].get(),
            self.components[2].get(),
        ]
    }

    #[inline]
    pub fn set(&self, xyz: [f32; 3]) {
        for (component, value) in self.components.iter().zip(xyz) {
            component.set(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_float() {
        let val = AtomicFloat::new(1.0);
        assert_eq!(val.get(), 1.0);
        assert_eq!(val.swap(2.5), 1.0);
        assert_eq!(val.get(), 2.5);
    }

    #[test]
    fn test_atomic_flag_toggle() {
        let flag = AtomicFlag::default();
        assert!(flag.toggle());
        assert!(flag.get());
        assert!(!flag.toggle());
        assert!(!flag.get());
    }

    #[test]
    fn test_atomic_counter() {
        let counter = AtomicCounter::default();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_atomic_vec3() {
        let pos = AtomicVec3::new([1.0, 2.0, 3.0]);
        pos.set([-1.0, 0.5, 4.0]);
        assert_eq!(pos.get(), [-1.0, 0.5, 4.0]);
        assert_eq!(pos.clone().get(), [-1.0, 0.5, 4.0]);
    }
}
