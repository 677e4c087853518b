//! Shared synchronization re-exports.

pub use parking_lot::{Mutex, MutexGuard};

pub use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};
