//! Retry pacing.
//!
//! The executor's attempt bound lives in `FetchConfig`; this module only
//! decides how long to wait between attempts. The default is immediate
//! retry. Exponential pacing with optional jitter is opt-in and never
//! changes the attempt bound.

use std::time::Duration;

use rand::Rng;

/// Delay curve between retry attempts.
#[derive(Debug, Clone)]
pub struct RetryPacing {
    /// Delay before the first retry. Zero disables pacing entirely.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied per attempt (exponential curve).
    pub backoff_multiplier: f64,
    pub use_jitter: bool,
    /// Jitter magnitude as a fraction of the delay (0.0 to 1.0).
    pub jitter_factor: f64,
}

impl Default for RetryPacing {
    fn default() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            use_jitter: false,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPacing {
    /// No delay between attempts.
    pub fn immediate() -> Self {
        Self::default()
    }

    /// Exponential pacing starting from `initial` with jitter enabled.
    pub fn exponential(initial: Duration) -> Self {
        Self {
            initial_delay: initial,
            use_jitter: true,
            ..Self::default()
        }
    }

    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub const fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    pub fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Delay to apply after the given zero-based attempt failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }

        let base = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(base as u64).min(self.max_delay);

        if self.use_jitter {
            self.add_jitter(delay)
        } else {
            delay
        }
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        let mut rng = rand::thread_rng();
        let jitter_range = delay.as_millis() as f64 * self.jitter_factor;
        let jitter = rng.gen_range(-jitter_range..=jitter_range);

        let new_delay = delay.as_millis() as f64 + jitter;
        Duration::from_millis(new_delay.max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_pacing_never_waits() {
        let pacing = RetryPacing::immediate();
        assert_eq!(pacing.delay_for(0), Duration::ZERO);
        assert_eq!(pacing.delay_for(7), Duration::ZERO);
    }

    #[test]
    fn exponential_curve_without_jitter() {
        let pacing = RetryPacing::exponential(Duration::from_millis(100))
            .with_backoff_multiplier(2.0)
            .with_jitter(false);
        assert_eq!(pacing.delay_for(0), Duration::from_millis(100));
        assert_eq!(pacing.delay_for(1), Duration::from_millis(200));
        assert_eq!(pacing.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn delay_is_capped() {
        let pacing = RetryPacing::exponential(Duration::from_millis(100))
            .with_jitter(false)
            .with_max_delay(Duration::from_millis(250));
        assert_eq!(pacing.delay_for(5), Duration::from_millis(250));
    }

    #[test]
    fn jitter_stays_within_the_band() {
        let pacing = RetryPacing::exponential(Duration::from_millis(1000))
            .with_jitter(true)
            .with_jitter_factor(0.1);
        for _ in 0..20 {
            let d = pacing.delay_for(0).as_millis();
            assert!((900..=1100).contains(&d), "jittered delay {d} out of band");
        }
    }
}
