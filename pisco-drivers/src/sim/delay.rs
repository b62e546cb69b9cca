//! Blocking delay over virtual time

use embedded_hal::delay::DelayNs;

use super::clock::SimPacing;

/// [`DelayNs`] that lets time pass on a [`SimPacing`] clock
///
/// Sub-millisecond requests are rounded up to whole milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct SimDelay<P> {
    pacing: P,
}

impl<P: SimPacing> SimDelay<P> {
    pub fn new(pacing: P) -> Self {
        Self { pacing }
    }
}

impl<P: SimPacing> DelayNs for SimDelay<P> {
    fn delay_ns(&mut self, ns: u32) {
        self.pacing.elapse(ns.div_ceil(1_000_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.pacing.elapse(us.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.pacing.elapse(ms);
    }
}
