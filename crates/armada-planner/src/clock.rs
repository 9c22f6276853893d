//! Wall-clock deadlines for one planning cycle.
//!
//! Crossing a deadline never fails the cycle. It only stops new work from
//! starting: past the soft deadline expensive scans stop, past the hard
//! deadline the assignment loop stops, and past the fallback deadline the
//! remaining units hold.

use std::time::{Duration, Instant};

use armada_core::config::DeadlineConfig;

#[derive(Debug, Clone, Copy)]
pub struct TurnClock {
    started: Instant,
    soft: Duration,
    hard: Duration,
    fallback: Duration,
}

impl TurnClock {
    /// Start the clock now with limits derived from the configured budget.
    ///
    /// Fractions outside [0, 1] are clamped; a NaN fraction counts as 0.
    pub fn start(config: &DeadlineConfig) -> Self {
        let budget = Duration::from_millis(config.budget_ms);
        Self::with_limits(
            share(budget, config.soft_fraction),
            share(budget, config.hard_fraction),
            share(budget, config.fallback_fraction),
        )
    }

    /// Start the clock now with explicit limits.
    pub fn with_limits(soft: Duration, hard: Duration, fallback: Duration) -> Self {
        Self {
            started: Instant::now(),
            soft,
            hard,
            fallback,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn past_soft(&self) -> bool {
        self.elapsed() >= self.soft
    }

    pub fn past_hard(&self) -> bool {
        self.elapsed() >= self.hard
    }

    pub fn past_fallback(&self) -> bool {
        self.elapsed() >= self.fallback
    }
}

fn share(budget: Duration, fraction: f64) -> Duration {
    if fraction.is_nan() {
        return Duration::ZERO;
    }
    budget.mul_f64(fraction.clamp(0.0, 1.0))
}
