//! Multi-slot snapshot registry shared between the audio thread and control threads.
//!
//! The registry keeps `N` copies of a value. One slot is *current*: it is what
//! the audio thread reads each block and what display code pins. A control
//! thread edits a spare slot initialised from the current one and then
//! publishes it, which rotates the registry so the edited slot becomes
//! current. With three slots the audio thread, a working writer and the
//! published snapshot never need the same slot.
//!
//! ## Thread roles
//!
//! - [`RealtimeShared::try_acquire`]: audio thread only. A single `try_lock`,
//!   never waits and never allocates. `None` means the caller must fall back
//!   to extrapolating from state it already owns.
//! - [`RealtimeShared::lock`] / [`WriteGuard::publish`]: control threads.
//!   Writers are serialized; a guard dropped without `publish` discards its
//!   edits.
//! - [`RealtimeShared::pin`]: control threads. Blocks on the current slot and
//!   reads it in place. The audio thread falls back for as long as a pin is
//!   held. Never call [`RealtimeShared::lock`] while holding a pin from the
//!   same thread.

use crate::compat::{AtomicU64, AtomicUsize, Mutex, MutexGuard, Ordering};
use std::ops::{Deref, DerefMut};

#[derive(Debug)]
struct Versioned<T> {
    version: u64,
    value: T,
}

impl<T: Clone> Clone for Versioned<T> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            value: self.value.clone(),
        }
    }

    // Reuses the slot's existing allocations.
    fn clone_from(&mut self, source: &Self) {
        self.version = source.version;
        self.value.clone_from(&source.value);
    }
}

/// Versioned multi-buffered value with a non-blocking audio-thread path.
#[derive(Debug)]
pub struct RealtimeShared<T, const N: usize = 3> {
    slots: [Mutex<Versioned<T>>; N],
    current: AtomicUsize,
    version: AtomicU64,
    writer: Mutex<()>,
}

impl<T: Clone, const N: usize> RealtimeShared<T, N> {
    pub fn new(value: T) -> Self {
        assert!(N >= 2, "RealtimeShared needs at least two slots");
        Self {
            slots: std::array::from_fn(|_| {
                Mutex::new(Versioned {
                    version: 0,
                    value: value.clone(),
                })
            }),
            current: AtomicUsize::new(0),
            version: AtomicU64::new(0),
            writer: Mutex::new(()),
        }
    }

    /// Version of the most recently published snapshot.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Audio-thread acquisition. Returns `None` immediately if the current
    /// slot is held by a control thread.
    #[inline]
    pub fn try_acquire(&self) -> Option<RealtimeGuard<'_, T>> {
        let index = self.current.load(Ordering::Acquire);
        self.slots[index]
            .try_lock()
            .map(|guard| RealtimeGuard { guard })
    }

    /// Blocking read of the current slot in place.
    pub fn pin(&self) -> PinGuard<'_, T> {
        let index = self.current.load(Ordering::Acquire);
        PinGuard {
            guard: self.slots[index].lock(),
        }
    }

    /// Clone of the current value.
    pub fn snapshot(&self) -> T {
        self.pin().clone()
    }

    /// Opens an exclusive working copy of the current value.
    ///
    /// Blocks while another writer is active and, briefly, while the audio
    /// thread holds the current slot.
    pub fn lock(&self) -> WriteGuard<'_, T, N> {
        let writer = self.writer.lock();
        let current = self.current.load(Ordering::Acquire);

        // The audio thread may still hold a slot that was current before the
        // last rotation, so take whichever spare is free.
        let mut claimed = None;
        for index in (1..N).map(|offset| (current + offset) % N) {
            if let Some(guard) = self.slots[index].try_lock() {
                claimed = Some((index, guard));
                break;
            }
        }
        let (index, mut slot) = match claimed {
            Some(claimed) => claimed,
            None => {
                let index = (current + 1) % N;
                (index, self.slots[index].lock())
            }
        };

        {
            let source = self.slots[current].lock();
            slot.clone_from(&*source);
        }

        WriteGuard {
            shared: self,
            index,
            slot,
            _writer: writer,
        }
    }

    /// Replaces the current value and publishes it.
    pub fn store(&self, value: T) {
        let mut guard = self.lock();
        *guard = value;
        guard.publish();
    }
}

impl<T: Clone + Default, const N: usize> Default for RealtimeShared<T, N> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Mutable view held by the audio thread for one block.
pub struct RealtimeGuard<'a, T> {
    guard: MutexGuard<'a, Versioned<T>>,
}

impl<T> RealtimeGuard<'_, T> {
    pub fn version(&self) -> u64 {
        self.guard.version
    }
}

impl<T> Deref for RealtimeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard.value
    }
}

impl<T> DerefMut for RealtimeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard.value
    }
}

/// Read-only view of the current slot.
pub struct PinGuard<'a, T> {
    guard: MutexGuard<'a, Versioned<T>>,
}

impl<T> PinGuard<'_, T> {
    pub fn version(&self) -> u64 {
        self.guard.version
    }
}

impl<T> Deref for PinGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard.value
    }
}

/// Exclusive working copy owned by one control thread.
pub struct WriteGuard<'a, T, const N: usize> {
    shared: &'a RealtimeShared<T, N>,
    index: usize,
    slot: MutexGuard<'a, Versioned<T>>,
    _writer: MutexGuard<'a, ()>,
}

impl<T, const N: usize> WriteGuard<'_, T, N> {
    /// Makes the edits visible to every later acquirer and returns the new version.
    pub fn publish(self) -> u64 {
        let WriteGuard {
            shared,
            index,
            mut slot,
            _writer,
        } = self;
        let version = shared.version.load(Ordering::Relaxed) + 1;
        slot.version = version;
        // Release the slot before advertising it so the audio thread's next
        // try_lock does not race this guard.
        drop(slot);
        shared.current.store(index, Ordering::Release);
        shared.version.store(version, Ordering::Release);
        version
    }
}

impl<T, const N: usize> Deref for WriteGuard<'_, T, N> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.slot.value
    }
}

impl<T, const N: usize> DerefMut for WriteGuard<'_, T, N> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.slot.value
    }
}
