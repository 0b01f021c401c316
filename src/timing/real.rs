use super::Phase;
use std::time::{Duration, Instant};

/// Timer that tracks elapsed time when timing is enabled.
pub struct Timer(Instant);

impl Timer {
    #[inline]
    pub fn start() -> Self {
        Self(Instant::now())
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Collected phase durations for one call.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimings {
    pub total: Duration,
    pub phases: [Duration; Phase::COUNT],
}

impl PhaseTimings {
    #[inline]
    pub fn get(&self, phase: Phase) -> Duration {
        self.phases[phase as usize]
    }

    /// Emit one `debug` event for the call and one per non-empty phase.
    pub fn report(&self, what: &'static str, num_edges: usize) {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        tracing::debug!(what, num_edges, total_ms = ms(self.total), "timing");
        for phase in Phase::ALL {
            let d = self.get(phase);
            if d.is_zero() {
                continue;
            }
            let pct = if self.total.is_zero() {
                0.0
            } else {
                d.as_secs_f64() / self.total.as_secs_f64() * 100.0
            };
            tracing::debug!(what, phase = phase.name(), ms = ms(d), pct, "timing phase");
        }
    }
}

/// Accumulates phase durations while a call runs.
pub struct TimingBuilder {
    t_start: Instant,
    phases: [Duration; Phase::COUNT],
}

impl TimingBuilder {
    pub fn new() -> Self {
        Self {
            t_start: Instant::now(),
            phases: [Duration::ZERO; Phase::COUNT],
        }
    }

    /// Add `d` to `phase`; phases may be entered more than once.
    pub fn add(&mut self, phase: Phase, d: Duration) {
        self.phases[phase as usize] += d;
    }

    pub fn finish(self) -> PhaseTimings {
        PhaseTimings {
            total: self.t_start.elapsed(),
            phases: self.phases,
        }
    }
}

impl Default for TimingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
