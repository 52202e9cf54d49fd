//! Telemetry sample model.

use chrono::{DateTime, Local};

/// Signal strength, quality and modulation fields reported for the
/// monitored UE's first cell. Only collected with [`FieldSet::Extended`].
///
/// [`FieldSet::Extended`]: super::FieldSet::Extended
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Enrichment {
    /// Downlink reference-signal power (dBm).
    pub epre: f64,
    /// Uplink path loss (dB).
    pub ul_path_loss: f64,
    /// UE transmit power (dBm).
    pub p_ue: f64,
    /// PUCCH SNR (dB).
    pub pucch1_snr: f64,
    /// PUSCH SNR (dB).
    pub pusch_snr: f64,
    /// Channel-quality indicator.
    pub cqi: f64,
    /// Downlink modulation-coding index.
    pub dl_mcs: f64,
    /// Uplink modulation-coding index.
    pub ul_mcs: f64,
    /// Uplink spatial layer count.
    pub ul_n_layer: f64,
}

impl Enrichment {
    /// Column names, in export order.
    pub const FIELDS: [&'static str; 9] = [
        "epre",
        "ul_path_loss",
        "p_ue",
        "pucch1_snr",
        "pusch_snr",
        "cqi",
        "dl_mcs",
        "ul_mcs",
        "ul_n_layer",
    ];

    /// Field values in the same order as [`Enrichment::FIELDS`].
    pub fn values(&self) -> [f64; 9] {
        [
            self.epre,
            self.ul_path_loss,
            self.p_ue,
            self.pucch1_snr,
            self.pusch_snr,
            self.cqi,
            self.dl_mcs,
            self.ul_mcs,
            self.ul_n_layer,
        ]
    }

    /// Inverse of [`Enrichment::values`].
    pub fn from_values(v: [f64; 9]) -> Self {
        Self {
            epre: v[0],
            ul_path_loss: v[1],
            p_ue: v[2],
            pucch1_snr: v[3],
            pusch_snr: v[4],
            cqi: v[5],
            dl_mcs: v[6],
            ul_mcs: v[7],
            ul_n_layer: v[8],
        }
    }
}

/// One record per successfully parsed telemetry message.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    /// Instantaneous downlink bitrate reported by the element.
    pub instant_rate_mbps: f64,
    /// Average rate since the previous sample. Negative after a counter reset.
    pub avg_rate_mbps: f64,
    /// Cumulative downlink byte counter as reported.
    pub total_bytes: u64,
    pub enrichment: Option<Enrichment>,
}

impl Sample {
    /// Total downlink volume in megabytes (1 MB = 1024 * 1024 bytes).
    pub fn total_megabytes(&self) -> f64 {
        bytes_to_megabytes(self.total_bytes)
    }
}

pub(crate) fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
