//! Serialized sample recording.
//!
//! The receive path and the poll timer run concurrently; everything that
//! reads the baseline, derives the rate and appends the sample happens
//! under one lock so the rate calculation never sees a torn update.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::extract::{Extractor, Reading};
use super::rate::Baseline;
use super::sample::Sample;
use super::store::{SampleStore, Summary};
use crate::error::MonitorError;

#[derive(Debug, Default)]
struct Timeline {
    baseline: Baseline,
    store: SampleStore,
}

/// Turns raw frames into stored samples.
#[derive(Debug)]
pub struct Recorder {
    extractor: Extractor,
    clamp_counter_reset: bool,
    timeline: Mutex<Timeline>,
}

impl Recorder {
    pub fn new(extractor: Extractor) -> Self {
        Self {
            extractor,
            clamp_counter_reset: false,
            timeline: Mutex::new(Timeline::default()),
        }
    }

    /// Report 0 instead of a negative average rate after a counter reset.
    pub fn with_clamp_counter_reset(mut self, clamp: bool) -> Self {
        self.clamp_counter_reset = clamp;
        self
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Parse one frame received at `now` and record the resulting sample.
    ///
    /// Returns the stored sample, or `None` if the frame carried none.
    pub fn ingest(&self, payload: &str, now: DateTime<Local>) -> Result<Option<Sample>, MonitorError> {
        let Some(reading) = self.extractor.extract(payload)? else {
            return Ok(None);
        };
        Ok(Some(self.record(reading, now)))
    }

    /// Derive the average rate for `reading` and append it to the store.
    ///
    /// Sample timestamps never go backwards within a session: a wall clock
    /// stepped back (NTP) is held at the previous sample's time, which
    /// yields an average rate of 0 for that sample.
    pub fn record(&self, reading: Reading, now: DateTime<Local>) -> Sample {
        let mut timeline = self.timeline.lock();
        let now = match timeline.baseline.last_timestamp {
            Some(last) if now < last => {
                debug!("Clock stepped back by {}, holding sample time", last - now);
                last
            }
            _ => now,
        };

        let reset = timeline.baseline.is_reset(reading.total_bytes);
        let mut avg_rate_mbps = timeline.baseline.advance(reading.total_bytes, now);
        if reset {
            info!(
                total_bytes = reading.total_bytes,
                "Downlink byte counter decreased, starting a new baseline"
            );
            if self.clamp_counter_reset {
                avg_rate_mbps = 0.0;
            }
        }

        let sample = Sample {
            timestamp: now,
            instant_rate_mbps: reading.instant_rate_mbps,
            avg_rate_mbps,
            total_bytes: reading.total_bytes,
            enrichment: reading.enrichment,
        };
        debug!(
            message_id = reading.message_id.as_deref().unwrap_or("-"),
            avg_rate_mbps = sample.avg_rate_mbps,
            "Sample recorded"
        );
        timeline.store.push(sample.clone());
        sample
    }

    pub fn len(&self) -> usize {
        self.timeline.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of everything recorded so far.
    pub fn samples(&self) -> Vec<Sample> {
        self.timeline.lock().store.samples().to_vec()
    }

    /// Take every recorded sample out of the store.
    pub fn take_samples(&self) -> Vec<Sample> {
        self.timeline.lock().store.drain()
    }

    pub fn summary(&self) -> Option<Summary> {
        self.timeline.lock().store.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FieldSet;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn at(secs: i64) -> DateTime<Local> {
        Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn frame(bytes: u64, bitrate: u64) -> String {
        format!(
            r#"{{"ue_list":[{{"cells":[{{"dl_bitrate":{}}}],"erab_list":[{{"dl_total_bytes":{}}}]}}]}}"#,
            bitrate, bytes
        )
    }

    #[test]
    fn test_three_frames_end_to_end() {
        let recorder = Recorder::new(Extractor::new(FieldSet::Basic));

        let mut samples = Vec::new();
        for (i, bytes) in [1_000_000u64, 2_000_000, 4_000_000].into_iter().enumerate() {
            let sample = recorder.ingest(&frame(bytes, 8_000_000), at(i as i64)).unwrap().unwrap();
            samples.push(sample);
        }

        let instant: Vec<f64> = samples.iter().map(|s| s.instant_rate_mbps).collect();
        assert_eq!(instant, vec![8.0, 8.0, 8.0]);

        let avg: Vec<f64> = samples.iter().map(|s| s.avg_rate_mbps).collect();
        assert_eq!(avg[0], 0.0);
        assert!((avg[1] - 8.0).abs() < 1e-9);
        assert!((avg[2] - 16.0).abs() < 1e-9);

        let summary = recorder.summary().unwrap();
        assert_eq!(summary.max_rate_mbps, 8.0);
        assert!((summary.mean_rate_mbps - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_counter_reset_passes_negative_rate_through() {
        let recorder = Recorder::new(Extractor::default());
        recorder.ingest(&frame(2_000_000, 0), at(0)).unwrap();
        let sample = recorder.ingest(&frame(500_000, 0), at(1)).unwrap().unwrap();
        assert!(sample.avg_rate_mbps < 0.0);

        // The reset point becomes the new baseline.
        let sample = recorder.ingest(&frame(1_500_000, 0), at(2)).unwrap().unwrap();
        assert!((sample.avg_rate_mbps - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_counter_reset_can_be_clamped() {
        let recorder = Recorder::new(Extractor::default()).with_clamp_counter_reset(true);
        recorder.ingest(&frame(2_000_000, 0), at(0)).unwrap();
        let sample = recorder.ingest(&frame(500_000, 0), at(1)).unwrap().unwrap();
        assert_eq!(sample.avg_rate_mbps, 0.0);
    }

    #[test]
    fn test_clock_step_back_keeps_timestamps_ordered() {
        let recorder = Recorder::new(Extractor::default());
        recorder.ingest(&frame(1_000_000, 0), at(10)).unwrap();
        let held = recorder.ingest(&frame(2_000_000, 0), at(4)).unwrap().unwrap();
        assert_eq!(held.timestamp, at(10));
        assert_eq!(held.avg_rate_mbps, 0.0);

        let next = recorder.ingest(&frame(3_000_000, 0), at(11)).unwrap().unwrap();
        assert!((next.avg_rate_mbps - 8.0).abs() < 1e-9);

        let times: Vec<_> = recorder.samples().iter().map(|s| s.timestamp).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_irrelevant_and_bad_frames_record_nothing() {
        let recorder = Recorder::new(Extractor::default());
        assert!(recorder.ingest(r#"{"ue_list":[]}"#, at(0)).unwrap().is_none());
        assert!(recorder.ingest("garbage", at(0)).is_err());
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_concurrent_ingest_keeps_every_sample() {
        let recorder = Arc::new(Recorder::new(Extractor::default()));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let recorder = recorder.clone();
                std::thread::spawn(move || {
                    for i in 0..50u64 {
                        let bytes = 1 + t * 1_000 + i;
                        recorder.ingest(&frame(bytes, 1_000_000), Local::now()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(recorder.len(), 200);
        assert_eq!(recorder.take_samples().len(), 200);
        assert!(recorder.is_empty());
    }
}
