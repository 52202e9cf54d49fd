//! Telemetry extraction from raw response frames.
//!
//! Turns one inbound payload into at most one [`Reading`]. Only the first
//! UE, its first cell and its first bearer are inspected; a UE without a
//! bearer entry yields nothing.

use serde::Deserialize;

use super::sample::Enrichment;
use crate::error::MonitorError;
use crate::source::message::{CellEntry, UeGetResponse};

/// Which fields the monitor collects, exports and prints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FieldSet {
    /// Throughput only: instant rate, average rate, byte counter.
    Basic,
    /// Throughput plus signal strength, quality and modulation fields.
    #[default]
    Extended,
}

impl FieldSet {
    /// Export file name for the given UE.
    pub fn file_name(&self, ue_id: u32) -> String {
        match self {
            FieldSet::Basic => format!("ue_{}_throughput.csv", ue_id),
            FieldSet::Extended => format!("ue_{}_monitor.csv", ue_id),
        }
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, FieldSet::Extended)
    }
}

/// Values taken from one frame, before rate derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Correlation id echoed by the element, if any.
    pub message_id: Option<String>,
    pub instant_rate_mbps: f64,
    pub total_bytes: u64,
    pub enrichment: Option<Enrichment>,
}

/// Parses response frames according to a [`FieldSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    fields: FieldSet,
}

impl Extractor {
    pub fn new(fields: FieldSet) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> FieldSet {
        self.fields
    }

    /// Extract a reading from one raw payload.
    ///
    /// Returns `Ok(None)` for frames that are well formed but carry no
    /// sample (no UE, no cell or no bearer entry), [`MonitorError::Decode`]
    /// for payloads that are not JSON and [`MonitorError::Processing`] for
    /// JSON that does not have the response shape.
    pub fn extract(&self, payload: &str) -> Result<Option<Reading>, MonitorError> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|e| MonitorError::Decode(e.to_string()))?;
        let response: UeGetResponse =
            serde_json::from_value(value).map_err(|e| MonitorError::Processing(e.to_string()))?;
        Ok(self.extract_response(&response))
    }

    /// Extract a reading from an already decoded response.
    pub fn extract_response(&self, response: &UeGetResponse) -> Option<Reading> {
        let ue = response.ue_list.first()?;
        let cell = ue.cells.first()?;
        let erab = ue.erab_list.first()?;

        let enrichment = self.fields.is_extended().then(|| enrichment_from(cell));

        Some(Reading {
            message_id: response.message_id.clone(),
            instant_rate_mbps: cell.dl_bitrate.unwrap_or(0.0) / 1_000_000.0,
            total_bytes: erab.total_bytes(),
            enrichment,
        })
    }
}

fn enrichment_from(cell: &CellEntry) -> Enrichment {
    Enrichment {
        epre: cell.epre.unwrap_or(0.0),
        ul_path_loss: cell.ul_path_loss.unwrap_or(0.0),
        p_ue: cell.p_ue.unwrap_or(0.0),
        pucch1_snr: cell.pucch1_snr.unwrap_or(0.0),
        pusch_snr: cell.pusch_snr.unwrap_or(0.0),
        cqi: cell.cqi.unwrap_or(0.0),
        dl_mcs: cell.dl_mcs.unwrap_or(0.0),
        ul_mcs: cell.ul_mcs.unwrap_or(0.0),
        ul_n_layer: cell.ul_n_layer.unwrap_or(0.0),
    }
}
