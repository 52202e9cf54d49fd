//! # ue-monitor
//!
//! Live throughput and signal monitor for one UE attached to a
//! radio-access-network element.
//!
//! The monitor keeps a WebSocket session to the element, sends a `ue_get`
//! statistics request every poll interval, turns each response into a
//! [`Sample`] (instantaneous rate, average rate derived from the bearer's
//! byte counter and, optionally, signal fields), prints a live view and
//! writes the whole run to a CSV file when it stops.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ┌─────────┐  ue_get   ┌─────────┐  frames  ┌──────────────┐ │
//! │  │ monitor │──────────▶│ source  │─────────▶│ data         │ │
//! │  │ (poll)  │◀─ state ──│(session)│          │ (extract,    │ │
//! │  └────┬────┘           └─────────┘          │  rate, store)│ │
//! │       │ stop                                └──────┬───────┘ │
//! │       ▼                                            │         │
//! │  ┌─────────┐◀───────────────── samples ────────────┘         │
//! │  │ export  │──▶ ue_<id>_*.csv + statistics                   │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`monitor`]**: The poll driver ([`Monitor`]), its lifecycle and reconnect backoff
//! - **[`source`]**: The element session ([`WsSession`]) and the wire frames
//! - **[`data`]**: Extraction, rate derivation, sample storage and statistics
//! - **[`export`]**: CSV export and end-of-run statistics
//! - **[`report`]**: Console formatting of samples and statistics
//! - **[`config`]**: Layered configuration ([`MonitorConfig`])
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Monitor UE 1 on the default endpoint (ws://127.0.0.1:9001/)
//! ue-monitor --ue-id 1
//!
//! # Throughput only, against a remote element
//! ue-monitor --ue-id 1 --ws-url ws://10.0.0.2:9001/ --fields basic
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use ue_monitor::{Monitor, MonitorConfig};
//!
//! # tokio_test::block_on(async {
//! let monitor = Monitor::new(MonitorConfig::new(1));
//! let stop = monitor.stop_handle();
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     stop.stop();
//! });
//! let outcome = monitor.run(&mut std::io::stdout()).await;
//! println!("{:?}", outcome.saved_to);
//! # });
//! ```
//!
//! ### Deriving samples without a connection
//!
//! ```
//! use chrono::Local;
//! use ue_monitor::data::{Extractor, FieldSet, Recorder};
//!
//! let recorder = Recorder::new(Extractor::new(FieldSet::Basic));
//! let frame = r#"{"ue_list":[{"cells":[{"dl_bitrate":8000000}],"erab_list":[{"dl_total_bytes":1000000}]}]}"#;
//! let sample = recorder.ingest(frame, Local::now()).unwrap().unwrap();
//! assert_eq!(sample.instant_rate_mbps, 8.0);
//! assert_eq!(sample.avg_rate_mbps, 0.0);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod monitor;
pub mod report;
pub mod source;

// Re-export main types for convenience
pub use config::{MonitorConfig, Overrides, ReconnectPolicy};
pub use data::{Enrichment, Extractor, FieldSet, Recorder, Sample, SampleStore, Summary};
pub use error::MonitorError;
pub use export::{ExportOutcome, Exporter};
pub use monitor::{Backoff, Monitor, MonitorState, StopHandle};
pub use source::{SessionEvent, UeGetRequest, WsSession};
