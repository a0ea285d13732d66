//! Fixed-cadence resampling of the target request size.

use crate::histogram::Histogram;
use crate::sampler::{sample, SamplerConfig};
use rand::Rng;
use std::time::Duration;

/// Default replay window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Holds the run's histogram and hands out the current target sample size,
/// drawing a new one each time the elapsed run time enters a new window.
#[derive(Debug, Clone)]
pub struct TrafficSchedule {
    histogram: Histogram,
    config: SamplerConfig,
    window: Duration,
    current: u32,
    next_boundary: Duration,
}

impl TrafficSchedule {
    /// `initial` is used until the first window boundary is crossed.
    pub fn new(histogram: Histogram, config: SamplerConfig, window: Duration, initial: u32) -> Self {
        let window = if window.is_zero() { DEFAULT_WINDOW } else { window };
        Self {
            histogram,
            config,
            window,
            current: initial.min(config.cap),
            next_boundary: window,
        }
    }

    pub fn with_defaults(histogram: Histogram, initial: u32) -> Self {
        Self::new(histogram, SamplerConfig::default(), DEFAULT_WINDOW, initial)
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn next_boundary(&self) -> Duration {
        self.next_boundary
    }

    /// Target sample size for an iteration starting at `elapsed`.
    ///
    /// Resamples at most once per call; a call that skips several windows
    /// moves the boundary past `elapsed` in one step.
    pub fn observe<R: Rng + ?Sized>(&mut self, elapsed: Duration, rng: &mut R) -> u32 {
        if elapsed < self.next_boundary {
            return self.current;
        }

        self.current = sample(&self.histogram, &self.config, rng);
        let windows_passed = elapsed.as_nanos() / self.window.as_nanos() + 1;
        self.next_boundary = self
            .window
            .saturating_mul(u32::try_from(windows_passed).unwrap_or(u32::MAX));
        tracing::info!(
            throughput = self.current,
            elapsed_secs = elapsed.as_secs(),
            "updated curie traffic throughput"
        );
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::build_histogram;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn schedule() -> TrafficSchedule {
        let histogram = build_histogram(&[500; 8]).unwrap();
        TrafficSchedule::new(histogram, SamplerConfig::default(), Duration::from_secs(300), 10)
    }

    #[test]
    fn test_keeps_initial_until_boundary() {
        let mut schedule = schedule();
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(schedule.observe(Duration::from_secs(0), &mut rng), 10);
        assert_eq!(schedule.observe(Duration::from_secs(299), &mut rng), 10);
    }

    #[test]
    fn test_resamples_once_per_window() {
        let mut schedule = schedule();
        let mut rng = StdRng::seed_from_u64(3);
        let first = schedule.observe(Duration::from_secs(300), &mut rng);
        assert!((100..=1000).contains(&first));
        assert_eq!(schedule.next_boundary(), Duration::from_secs(600));
        assert_eq!(schedule.observe(Duration::from_secs(450), &mut rng), first);
    }

    #[test]
    fn test_skipped_windows_advance_boundary() {
        let mut schedule = schedule();
        let mut rng = StdRng::seed_from_u64(3);
        schedule.observe(Duration::from_secs(1_000), &mut rng);
        assert_eq!(schedule.next_boundary(), Duration::from_secs(1_200));
    }

    #[test]
    fn test_initial_respects_cap() {
        let histogram = build_histogram(&[5]).unwrap();
        let schedule = TrafficSchedule::with_defaults(histogram, 5_000);
        assert_eq!(schedule.current(), 1000);
    }
}
