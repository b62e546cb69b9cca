//! Virtual time

use pisco_hal::Clock;
use portable_atomic::{AtomicU64, Ordering};

/// Time source that can be made to pass
///
/// A manual clock jumps forward; a wall clock blocks for the duration.
pub trait SimPacing: Clock {
    /// Let `ms` milliseconds pass
    fn elapse(&self, ms: u32);
}

impl<P: SimPacing + ?Sized> SimPacing for &P {
    fn elapse(&self, ms: u32) {
        (**self).elapse(ms)
    }
}

/// Clock that only moves when told to
///
/// Shared by reference between the simulated arm, the delay and the test
/// body. Notification handlers may read it from another thread.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    pub const fn starting_at(ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(ms),
        }
    }

    /// Move time forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::AcqRel);
    }

    /// Jump to `ms` if it lies in the future
    pub fn advance_to(&self, ms: u64) {
        self.now_ms.fetch_max(ms, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Acquire)
    }
}

impl SimPacing for ManualClock {
    fn elapse(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::starting_at(100);
        assert_eq!(clock.now_ms(), 100);

        clock.advance(50);
        assert_eq!(clock.now_ms(), 150);
        assert_eq!(clock.elapsed_ms(120), 30);

        clock.advance_to(140);
        assert_eq!(clock.now_ms(), 150);
        clock.advance_to(1000);
        assert_eq!(clock.now_ms(), 1000);

        clock.elapse(10);
        assert_eq!(clock.now_ms(), 1010);
    }
}
