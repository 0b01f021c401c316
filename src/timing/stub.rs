use super::Phase;
use std::time::Duration;

/// Dummy timer when `timing` is disabled (zero-sized).
pub struct Timer;

impl Timer {
    #[inline(always)]
    pub fn start() -> Self {
        Self
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        Duration::ZERO
    }
}

/// Dummy timings when `timing` is disabled (zero-sized).
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimings;

impl PhaseTimings {
    #[inline(always)]
    pub fn get(&self, _phase: Phase) -> Duration {
        Duration::ZERO
    }

    #[inline(always)]
    pub fn report(&self, _what: &'static str, _num_edges: usize) {}
}

/// Dummy builder when `timing` is disabled.
#[derive(Default)]
pub struct TimingBuilder;

impl TimingBuilder {
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }

    #[inline(always)]
    pub fn add(&mut self, _phase: Phase, _d: Duration) {}

    #[inline(always)]
    pub fn finish(self) -> PhaseTimings {
        PhaseTimings
    }
}
