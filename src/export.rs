//! End-of-run export of collected samples.
//!
//! Samples are written as comma-separated rows with a single header row,
//! using the same fixed precision as the live view. Statistics over the
//! whole run are printed afterwards, even if the file could not be written.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::data::{Enrichment, FieldSet, Sample, Summary};
use crate::error::MonitorError;
use crate::report;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Result of one export.
#[derive(Debug, Default)]
pub struct ExportOutcome {
    /// Where the samples were written, if they were.
    pub saved_to: Option<PathBuf>,
    /// Run statistics, if there was anything to summarize.
    pub summary: Option<Summary>,
    /// Why writing the file failed, if it did.
    pub error: Option<MonitorError>,
}

/// Writes samples for one UE to its export file.
#[derive(Debug, Clone)]
pub struct Exporter {
    path: PathBuf,
    ue_id: u32,
    fields: FieldSet,
}

impl Exporter {
    pub fn new(path: impl Into<PathBuf>, ue_id: u32, fields: FieldSet) -> Self {
        Self {
            path: path.into(),
            ue_id,
            fields,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `samples` and print statistics to `console`.
    ///
    /// An empty slice writes no file and prints nothing.
    pub fn export<W: Write>(&self, samples: &[Sample], console: &mut W) -> ExportOutcome {
        let Some(summary) = Summary::from_samples(samples) else {
            info!("No samples collected, nothing to export");
            return ExportOutcome::default();
        };

        let mut outcome = ExportOutcome::default();
        match self.write_csv(samples) {
            Ok(()) => {
                info!(path = %self.path.display(), rows = samples.len(), "Samples exported");
                let _ = writeln!(console, "\nData saved to {}", self.path.display());
                outcome.saved_to = Some(self.path.clone());
            }
            Err(e) => {
                error!(path = %self.path.display(), "Failed to export samples: {}", e);
                let _ = writeln!(console, "\nFailed to save data to {}: {}", self.path.display(), e);
                outcome.error = Some(e);
            }
        }

        let _ = writeln!(console, "\n{}", report::format_summary(&summary, self.ue_id));
        let _ = console.flush();
        outcome.summary = Some(summary);
        outcome
    }

    fn write_csv(&self, samples: &[Sample]) -> Result<(), MonitorError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        writeln!(writer, "{}", self.header())?;
        for sample in samples {
            writeln!(writer, "{}", self.row(sample))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn header(&self) -> String {
        let mut header = String::from("timestamp,instant_rate_mbps,avg_rate_mbps,total_bytes");
        if self.fields.is_extended() {
            for field in Enrichment::FIELDS {
                header.push(',');
                header.push_str(field);
            }
        }
        header
    }

    fn row(&self, sample: &Sample) -> String {
        let mut row = format!(
            "{},{:.2},{:.2},{}",
            sample.timestamp.format(TIMESTAMP_FORMAT),
            sample.instant_rate_mbps,
            sample.avg_rate_mbps,
            sample.total_bytes
        );
        if self.fields.is_extended() {
            let e = sample.enrichment.unwrap_or_default();
            row.push_str(&format!(
                ",{:.1},{:.1},{:.1},{:.1},{:.1},{:.0},{:.1},{:.0},{:.0}",
                e.epre,
                e.ul_path_loss,
                e.p_ue,
                e.pucch1_snr,
                e.pusch_snr,
                e.cqi,
                e.dl_mcs,
                e.ul_mcs,
                e.ul_n_layer
            ));
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn sample(secs: u32, rate: f64, avg: f64, bytes: u64) -> Sample {
        Sample {
            timestamp: Local.with_ymd_and_hms(2024, 5, 1, 12, 0, secs).unwrap(),
            instant_rate_mbps: rate,
            avg_rate_mbps: avg,
            total_bytes: bytes,
            enrichment: None,
        }
    }

    fn three_samples() -> Vec<Sample> {
        vec![
            sample(0, 8.0, 0.0, 1_000_000),
            sample(1, 8.0, 8.0, 2_000_000),
            sample(2, 8.0, 16.0, 4_000_000),
        ]
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FieldSet::Basic.file_name(1));
        let exporter = Exporter::new(&path, 1, FieldSet::Basic);

        let mut console = Vec::new();
        let outcome = exporter.export(&[], &mut console);

        assert!(!path.exists());
        assert!(console.is_empty());
        assert!(outcome.saved_to.is_none());
        assert!(outcome.summary.is_none());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_basic_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FieldSet::Basic.file_name(4));
        let exporter = Exporter::new(&path, 4, FieldSet::Basic);

        let mut console = Vec::new();
        let outcome = exporter.export(&three_samples(), &mut console);
        assert_eq!(outcome.saved_to.as_deref(), Some(path.as_path()));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "timestamp,instant_rate_mbps,avg_rate_mbps,total_bytes");
        assert_eq!(lines[3], "2024-05-01 12:00:02.000000,8.00,16.00,4000000");

        let printed = String::from_utf8(console).unwrap();
        assert!(printed.contains("Data saved to"));
        assert!(printed.contains("Max Rate: 8.00 Mbps"));
        assert!(printed.contains("Average Rate: 8.00 Mbps"));

        let summary = outcome.summary.unwrap();
        assert_eq!(summary.max_rate_mbps, 8.0);
    }

    #[test]
    fn test_extended_export_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(FieldSet::Extended.file_name(2));
        let exporter = Exporter::new(&path, 2, FieldSet::Extended);

        let mut s = sample(0, 1.5, 0.0, 10);
        s.enrichment = Some(Enrichment {
            epre: -90.0,
            cqi: 11.0,
            ul_n_layer: 2.0,
            ..Enrichment::default()
        });

        let mut console = Vec::new();
        exporter.export(&[s], &mut console);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert_eq!(header.split(',').count(), 13);
        assert!(header.ends_with("dl_mcs,ul_mcs,ul_n_layer"));
        assert_eq!(
            lines.next().unwrap(),
            "2024-05-01 12:00:00.000000,1.50,0.00,10,-90.0,0.0,0.0,0.0,0.0,11,0.0,0,2"
        );

        let printed = String::from_utf8(console).unwrap();
        assert!(printed.contains("Signal Statistics:"));
    }

    #[test]
    fn test_write_failure_still_prints_statistics() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes File::create fail
        let path = dir.path().join("blocked");
        std::fs::create_dir(&path).unwrap();
        let exporter = Exporter::new(&path, 7, FieldSet::Basic);

        let mut console = Vec::new();
        let outcome = exporter.export(&three_samples(), &mut console);

        assert!(matches!(outcome.error, Some(MonitorError::Export(_))));
        assert!(outcome.saved_to.is_none());
        assert!(outcome.summary.is_some());

        let printed = String::from_utf8(console).unwrap();
        assert!(printed.contains("Failed to save data"));
        assert!(printed.contains("Statistics for UE[7]:"));
    }
}
