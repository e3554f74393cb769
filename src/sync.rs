#[cfg(feature = "loom")]
pub use loom::cell::UnsafeCell;

#[cfg(feature = "loom")]
pub use loom::sync::atomic::{AtomicUsize, Ordering, fence};
#[cfg(not(feature = "loom"))]
pub use std::sync::atomic::{AtomicUsize, Ordering, fence};

#[cfg(feature = "loom")]
pub use loom::sync::Arc;
#[cfg(not(feature = "loom"))]
pub use std::sync::Arc;

#[cfg(not(feature = "loom"))]
pub use antidote::Mutex;

#[cfg(feature = "loom")]
#[derive(Debug, Default)]
pub struct Mutex<T>(loom::sync::Mutex<T>);

#[cfg(feature = "loom")]
impl<T> Mutex<T> {
    pub fn new(t: T) -> Self {
        Self(loom::sync::Mutex::new(t))
    }

    pub fn lock(&self) -> loom::sync::MutexGuard<'_, T> {
        self.0.lock().unwrap()
    }
}

/// `std::cell::UnsafeCell` with loom's closure-based access API.
#[cfg(not(feature = "loom"))]
#[derive(Debug, Default)]
pub struct UnsafeCell<T>(std::cell::UnsafeCell<T>);

#[cfg(not(feature = "loom"))]
impl<T> UnsafeCell<T> {
    pub fn new(data: T) -> Self {
        Self(std::cell::UnsafeCell::new(data))
    }

    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(*const T) -> R) -> R {
        f(self.0.get())
    }

    #[inline]
    pub fn with_mut<R>(&self, f: impl FnOnce(*mut T) -> R) -> R {
        f(self.0.get())
    }
}
