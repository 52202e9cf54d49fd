//! Telemetry data models and processing.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing of duration strings used in configuration (e.g., "1s", "500ms")
//! - [`extract`]: Turning raw `ue_get` responses into [`Reading`]s
//! - [`rate`]: Average-rate derivation from the cumulative byte counter
//! - [`recorder`]: Serialized "derive rate, append sample" update
//! - [`sample`]: The [`Sample`] record and its optional [`Enrichment`]
//! - [`store`]: Append-only [`SampleStore`] and run [`Summary`]
//!
//! ## Data Flow
//!
//! ```text
//! raw frame (JSON text)
//!        │
//!        ▼
//! Extractor::extract() ──▶ Reading
//!        │
//!        ▼
//! Recorder::record() ──▶ Baseline::advance() ──▶ Sample
//!        │
//!        └──▶ SampleStore::push() ──▶ Summary (at export)
//! ```

pub mod duration;
pub mod extract;
pub mod rate;
pub mod recorder;
pub mod sample;
pub mod store;

pub use extract::{Extractor, FieldSet, Reading};
pub use rate::{compute_avg_rate, Baseline};
pub use recorder::Recorder;
pub use sample::{Enrichment, Sample};
pub use store::{SampleStore, Summary};
