//! Append-only sample storage and whole-run statistics.

use super::sample::{bytes_to_megabytes, Enrichment, Sample};

/// Ordered sequence of samples collected during one monitoring run.
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    samples: Vec<Sample>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Take every sample out, leaving the store empty.
    pub fn drain(&mut self) -> Vec<Sample> {
        std::mem::take(&mut self.samples)
    }

    /// Statistics over the full sequence, `None` when empty.
    pub fn summary(&self) -> Option<Summary> {
        Summary::from_samples(&self.samples)
    }
}

/// Aggregate statistics printed when a run ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean_rate_mbps: f64,
    pub max_rate_mbps: f64,
    pub min_rate_mbps: f64,
    /// Final byte counter in megabytes.
    pub total_megabytes: f64,
    /// Mean of each enrichment field over the samples that carry one.
    pub mean_enrichment: Option<Enrichment>,
}

impl Summary {
    /// Compute statistics over `samples`. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        let last = samples.last()?;
        let count = samples.len();

        let rates = samples.iter().map(|s| s.instant_rate_mbps);
        let sum: f64 = rates.clone().sum();
        let max = rates.clone().fold(f64::NEG_INFINITY, f64::max);
        let min = rates.fold(f64::INFINITY, f64::min);

        Some(Self {
            count,
            mean_rate_mbps: sum / count as f64,
            max_rate_mbps: max,
            min_rate_mbps: min,
            total_megabytes: bytes_to_megabytes(last.total_bytes),
            mean_enrichment: mean_enrichment(samples),
        })
    }
}

fn mean_enrichment(samples: &[Sample]) -> Option<Enrichment> {
    let mut totals = [0.0f64; 9];
    let mut n = 0usize;

    for enrichment in samples.iter().filter_map(|s| s.enrichment.as_ref()) {
        for (total, value) in totals.iter_mut().zip(enrichment.values()) {
            *total += value;
        }
        n += 1;
    }

    if n == 0 {
        return None;
    }
    Some(Enrichment::from_values(totals.map(|t| t / n as f64)))
}
