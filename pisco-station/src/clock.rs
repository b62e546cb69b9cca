//! Wall-clock time for the station

use embassy_time::{block_for, Duration, Instant};
use pisco_drivers::sim::SimPacing;
use pisco_hal::Clock;

/// Monotonic clock counting from station start
///
/// As a [`SimPacing`] source it blocks the calling thread, so simulated
/// moves and pauses take their real duration.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis()
    }
}

impl SimPacing for SystemClock {
    fn elapse(&self, ms: u32) {
        block_for(Duration::from_millis(u64::from(ms)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapse_blocks() {
        let clock = SystemClock::new();
        let start = clock.now_ms();
        clock.elapse(20);
        assert!(clock.elapsed_ms(start) >= 20);
    }
}
