//! Byte-counter to average-rate derivation.

use chrono::{DateTime, Local};

/// Last accepted point of the downlink byte counter.
///
/// A baseline is replaced after every sample, including samples whose
/// timestamp did not advance, so one late message cannot freeze it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Baseline {
    pub last_total_bytes: u64,
    pub last_timestamp: Option<DateTime<Local>>,
}

impl Baseline {
    /// Compute the average rate against this baseline, then move the
    /// baseline to the new point.
    pub fn advance(&mut self, current_bytes: u64, current_time: DateTime<Local>) -> f64 {
        let rate = compute_avg_rate(
            current_bytes,
            current_time,
            self.last_total_bytes,
            self.last_timestamp,
        );
        self.last_total_bytes = current_bytes;
        self.last_timestamp = Some(current_time);
        rate
    }

    /// Whether `current_bytes` went backwards relative to this baseline.
    pub fn is_reset(&self, current_bytes: u64) -> bool {
        self.last_timestamp.is_some() && current_bytes < self.last_total_bytes
    }
}

/// Average downlink rate in Mbps between two counter readings.
///
/// Returns 0 when there is no usable baseline (`last_bytes == 0` or no
/// previous timestamp) or when time did not move forward. A counter that
/// decreased produces a negative rate, which callers treat as a reset.
pub fn compute_avg_rate(
    current_bytes: u64,
    current_time: DateTime<Local>,
    last_bytes: u64,
    last_time: Option<DateTime<Local>>,
) -> f64 {
    let Some(last_time) = last_time else {
        return 0.0;
    };
    if last_bytes == 0 {
        return 0.0;
    }

    let dt = (current_time - last_time).num_microseconds().unwrap_or(0) as f64 / 1_000_000.0;
    if dt <= 0.0 {
        return 0.0;
    }

    let delta = current_bytes as f64 - last_bytes as f64;
    delta * 8.0 / (dt * 1_000_000.0)
}
