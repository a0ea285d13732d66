//! Inverse-CDF sampling from a [`Histogram`].

use crate::histogram::Histogram;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Hard cap applied to every sampled request size.
pub const DEFAULT_CAP: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub cap: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { cap: DEFAULT_CAP }
    }
}

impl Histogram {
    /// Index of the bin selected by a uniform draw.
    ///
    /// Binary search for the first cumulative probability `>= u`; ties go to
    /// the earlier bin and zero-probability bins are never selected.
    pub fn draw_bin<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let u: f64 = rng.gen();
        let cumulative = self.cumulative();
        let last = cumulative.len().saturating_sub(1);
        let found = cumulative.partition_point(|&c| c < u).min(last);
        self.probabilities()[found..]
            .iter()
            .position(|&p| p > 0.0)
            .map_or(found, |offset| found + offset)
    }

    /// Uncapped draw: pick a bin, then interpolate linearly inside it.
    ///
    /// The result always lies in the selected bin's `[lower, upper)`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let bin = self.bins()[self.draw_bin(rng)];
        let v: f64 = rng.gen();
        let value = bin.lower as f64 + bin.width() as f64 * v;
        let last = bin.upper.saturating_sub(1).max(bin.lower);
        (value.floor() as u32).clamp(bin.lower, last)
    }
}

/// Draw one request size, capped at `config.cap`.
pub fn sample<R: Rng + ?Sized>(histogram: &Histogram, config: &SamplerConfig, rng: &mut R) -> u32 {
    histogram.draw(rng).min(config.cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::build_histogram;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_degenerate_histogram_stays_in_bin() {
        let histogram = build_histogram(&[42; 10]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            assert_eq!(histogram.draw_bin(&mut rng), 0);
            let value = histogram.draw(&mut rng);
            assert!(histogram.bins()[0].contains(value), "{value} escaped [1, 100)");
        }
    }

    #[test]
    fn test_cap_applies() {
        let histogram = build_histogram(&[2500; 4]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let config = SamplerConfig { cap: 1000 };
        for _ in 0..100 {
            assert_eq!(sample(&histogram, &config, &mut rng), 1000);
        }
    }

    #[test]
    fn test_same_seed_same_draws() {
        let histogram = build_histogram(&[1, 150, 2000, 40, 7]).unwrap();
        let config = SamplerConfig::default();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let left: Vec<u32> = (0..50).map(|_| sample(&histogram, &config, &mut a)).collect();
        let right: Vec<u32> = (0..50).map(|_| sample(&histogram, &config, &mut b)).collect();
        assert_eq!(left, right);
    }
}
