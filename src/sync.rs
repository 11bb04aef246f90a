//! Synchronization primitives with conditional compilation.
//!
//! Provides a unified mutex interface that uses `parking_lot::Mutex` when
//! the `fast-lock` feature is enabled, falling back to `std::sync::Mutex` otherwise.

#[cfg(feature = "fast-lock")]
use parking_lot::Mutex as ParkingLotMutex;

#[cfg(not(feature = "fast-lock"))]
use std::sync::Mutex as StdMutex;

/// Mutex type that conditionally uses parking_lot or std::sync::Mutex.
///
/// When the `fast-lock` feature is enabled, uses `parking_lot::Mutex` for
/// better performance on uncontended locks. Otherwise uses `std::sync::Mutex`.
///
/// # Example
///
/// ```rust
/// use evoref::sync::Mutex;
///
/// let data = Mutex::new(42);
/// ```
#[cfg(feature = "fast-lock")]
pub type Mutex<T> = ParkingLotMutex<T>;

#[cfg(not(feature = "fast-lock"))]
pub type Mutex<T> = StdMutex<T>;

/// Lock a mutex and return the guard, handling poisoning gracefully.
///
/// For `parking_lot::Mutex`, this is just `mutex.lock()`.
/// For `std::sync::Mutex`, this recovers the guard from a poisoned lock;
/// cached similarity scores stay valid after a panicked worker.
///
/// # Example
///
/// ```rust
/// use evoref::sync::{lock, Mutex};
///
/// let mutex = Mutex::new(42);
/// let guard = lock(&mutex);
/// assert_eq!(*guard, 42);
/// ```
#[cfg(feature = "fast-lock")]
pub fn lock<T>(mutex: &Mutex<T>) -> parking_lot::MutexGuard<'_, T> {
    mutex.lock()
}

#[cfg(not(feature = "fast-lock"))]
pub fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
