//! Empirical request-size histogram.
//!
//! Bins are fixed and deliberately non-uniform: most production requests
//! carry a handful of identifiers, a smaller share a few hundred, and rare
//! spikes go up to [`MAX_CURIES`].

use crate::error::TrafficError;
use serde::{Deserialize, Serialize};

/// Largest request size the default bins cover.
pub const MAX_CURIES: u32 = 3000;

/// Bin edges used by [`build_histogram`]: low-volume, mid-volume, spike.
pub const DEFAULT_EDGES: [u32; 4] = [1, 100, 1000, MAX_CURIES];

/// Half-open `[lower, upper)` range of request sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    pub lower: u32,
    pub upper: u32,
}

impl Bin {
    pub fn width(&self) -> u32 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.lower..self.upper).contains(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    bins: Vec<Bin>,
    probabilities: Vec<f64>,
    /// Prefix sums of `probabilities`; the last entry is exactly `1.0`.
    cumulative: Vec<f64>,
    observations: usize,
}

/// Histogram over [`DEFAULT_EDGES`].
pub fn build_histogram(counts: &[u32]) -> Result<Histogram, TrafficError> {
    Histogram::with_edges(&DEFAULT_EDGES, counts)
}

impl Histogram {
    /// Bin `counts` into the ranges delimited by `edges`.
    ///
    /// Counts below the first edge fall into the first bin and counts at or
    /// above the last edge into the last, so every observation is counted.
    pub fn with_edges(edges: &[u32], counts: &[u32]) -> Result<Self, TrafficError> {
        if edges.len() < 2 {
            return Err(TrafficError::InvalidBins(format!(
                "need at least two edges, got {}",
                edges.len()
            )));
        }
        if let Some(pair) = edges.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(TrafficError::InvalidBins(format!(
                "edges must be strictly increasing ({} >= {})",
                pair[0], pair[1]
            )));
        }
        if counts.is_empty() {
            return Err(TrafficError::EmptyCorpus);
        }

        let bins: Vec<Bin> = edges
            .windows(2)
            .map(|pair| Bin {
                lower: pair[0],
                upper: pair[1],
            })
            .collect();

        let mut tallies = vec![0usize; bins.len()];
        for &count in counts {
            let index = bins
                .partition_point(|bin| bin.upper <= count)
                .min(bins.len() - 1);
            tallies[index] += 1;
        }

        let total = counts.len() as f64;
        let last = bins.len() - 1;
        let mut probabilities: Vec<f64> = tallies.iter().map(|&n| n as f64 / total).collect();
        let head: f64 = probabilities[..last].iter().sum();
        probabilities[last] = (1.0 - head).max(0.0);

        let mut cumulative = Vec::with_capacity(bins.len());
        let mut running = 0.0;
        for p in &probabilities {
            running += p;
            cumulative.push(running);
        }
        cumulative[last] = 1.0;

        tracing::info!(
            observations = counts.len(),
            bins = bins.len(),
            "built traffic histogram"
        );

        Ok(Self {
            bins,
            probabilities,
            cumulative,
            observations: counts.len(),
        })
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Smallest value any bin admits.
    pub fn min_value(&self) -> u32 {
        self.bins.first().map_or(0, |bin| bin.lower)
    }

    /// Largest value any bin admits (the last bin's upper bound is excluded).
    pub fn max_value(&self) -> u32 {
        self.bins.last().map_or(0, |bin| bin.upper.saturating_sub(1))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bin, f64)> + '_ {
        self.bins.iter().zip(self.probabilities.iter().copied())
    }
}
