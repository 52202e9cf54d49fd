//! Wire frames exchanged with the element.
//!
//! Only the parts of the `ue_get` response the monitor consumes are
//! modelled; unknown fields are ignored and every numeric field is
//! optional (`null` and absent both read as 0).

use serde::{Deserialize, Serialize};

/// Message name of the telemetry request.
pub const UE_GET: &str = "ue_get";

/// Telemetry request sent once per poll tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UeGetRequest {
    pub ue_id: u32,
    pub stats: bool,
    pub message: &'static str,
    pub message_id: String,
}

impl UeGetRequest {
    /// Build a statistics request for `ue_id` tagged with `message_id`.
    pub fn new(ue_id: u32, message_id: impl Into<String>) -> Self {
        Self {
            ue_id,
            stats: true,
            message: UE_GET,
            message_id: message_id.into(),
        }
    }
}

/// Response frame. Frames without `ue_list` deserialize to an empty list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UeGetResponse {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub ue_list: Vec<UeEntry>,
}

/// One UE in the response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UeEntry {
    #[serde(default)]
    pub cells: Vec<CellEntry>,
    #[serde(default)]
    pub erab_list: Vec<ErabEntry>,
}

/// Per-cell radio statistics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellEntry {
    #[serde(default)]
    pub epre: Option<f64>,
    #[serde(default)]
    pub ul_path_loss: Option<f64>,
    #[serde(default)]
    pub p_ue: Option<f64>,
    #[serde(default)]
    pub pucch1_snr: Option<f64>,
    #[serde(default)]
    pub pusch_snr: Option<f64>,
    #[serde(default)]
    pub cqi: Option<f64>,
    #[serde(default)]
    pub dl_mcs: Option<f64>,
    #[serde(default)]
    pub ul_mcs: Option<f64>,
    #[serde(default)]
    pub ul_n_layer: Option<f64>,
    /// Instantaneous downlink bitrate in bits per second.
    #[serde(default)]
    pub dl_bitrate: Option<f64>,
}

/// Bearer (E-RAB) entry carrying the cumulative downlink counter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErabEntry {
    /// Integer or float, depending on the element build.
    #[serde(default)]
    pub dl_total_bytes: Option<serde_json::Number>,
}

impl ErabEntry {
    /// The downlink counter as a byte count. Missing, negative or
    /// non-finite values read as 0; fractions are truncated.
    pub fn total_bytes(&self) -> u64 {
        let Some(n) = &self.dl_total_bytes else {
            return 0;
        };
        n.as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = UeGetRequest::new(7, "ENB_ue_get_3");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ue_id": 7,
                "stats": true,
                "message": "ue_get",
                "message_id": "ENB_ue_get_3"
            })
        );
    }

    #[test]
    fn test_response_tolerates_missing_and_null_fields() {
        let raw = r#"{
            "message": "ue_get",
            "ue_list": [{
                "enb_ue_id": 1,
                "cells": [{ "cqi": 12, "epre": null }],
                "erab_list": [{ "erab_id": 5 }]
            }]
        }"#;
        let response: UeGetResponse = serde_json::from_str(raw).unwrap();
        let ue = &response.ue_list[0];
        assert_eq!(ue.cells[0].cqi, Some(12.0));
        assert_eq!(ue.cells[0].epre, None);
        assert_eq!(ue.erab_list[0].dl_total_bytes, None);
        assert_eq!(ue.erab_list[0].total_bytes(), 0);
    }

    #[test]
    fn test_counter_accepts_any_json_number() {
        let erab = |raw: &str| serde_json::from_str::<ErabEntry>(raw).unwrap().total_bytes();
        assert_eq!(erab(r#"{"dl_total_bytes": 1048576}"#), 1_048_576);
        assert_eq!(erab(r#"{"dl_total_bytes": 1000000.0}"#), 1_000_000);
        assert_eq!(erab(r#"{"dl_total_bytes": 2500.75}"#), 2_500);
        assert_eq!(erab(r#"{"dl_total_bytes": -3}"#), 0);
        assert_eq!(erab(r#"{"dl_total_bytes": null}"#), 0);
    }

    #[test]
    fn test_unrelated_frame_has_no_ues() {
        let response: UeGetResponse =
            serde_json::from_str(r#"{"message":"ready","type":"ENB"}"#).unwrap();
        assert!(response.ue_list.is_empty());
    }
}
