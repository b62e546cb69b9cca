//! Time source abstraction
//!
//! Blocking delays use the embedded-hal `DelayNs` trait; this module only
//! adds the monotonic clock needed for elapsed-time comparisons.

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `since_ms` (saturating)
    fn elapsed_ms(&self, since_ms: u64) -> u64 {
        self.now_ms().saturating_sub(since_ms)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
