//! Monitor configuration.
//!
//! Values are layered with the `config` crate: built-in defaults, then an
//! optional file, then `UE_MONITOR_*` environment variables, then CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::{duration, FieldSet};
use crate::error::MonitorError;

/// Default element endpoint.
pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:9001/";

/// Default prefix of the request correlation identifier.
pub const DEFAULT_MESSAGE_ID_PREFIX: &str = "ENB_ue_get_";

/// Prefix of environment variables read by [`MonitorConfig::load`].
pub const ENV_PREFIX: &str = "UE_MONITOR";

/// Everything the monitor needs to run.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    pub ws_url: String,
    pub ue_id: u32,
    #[serde(deserialize_with = "duration::deserialize")]
    pub poll_interval: Duration,
    pub fields: FieldSet,
    pub output_dir: PathBuf,
    pub message_id_prefix: String,
    /// Report 0 instead of a negative average rate after a counter reset.
    pub clamp_counter_reset: bool,
    /// How long to wait for in-flight frames after closing the session.
    #[serde(deserialize_with = "duration::deserialize")]
    pub drain_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl MonitorConfig {
    /// Configuration with defaults for everything but the UE id.
    pub fn new(ue_id: u32) -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            ue_id,
            poll_interval: Duration::from_secs(1),
            fields: FieldSet::default(),
            output_dir: PathBuf::from("."),
            message_id_prefix: DEFAULT_MESSAGE_ID_PREFIX.to_string(),
            clamp_counter_reset: false,
            drain_timeout: Duration::from_secs(2),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Assemble the configuration from defaults, an optional file, the
    /// environment and `overrides` (highest precedence).
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self, MonitorError> {
        let mut builder = Config::builder()
            .set_default("ws_url", DEFAULT_WS_URL)?
            .set_default("poll_interval", "1s")?
            .set_default("fields", "extended")?
            .set_default("output_dir", ".")?
            .set_default("message_id_prefix", DEFAULT_MESSAGE_ID_PREFIX)?
            .set_default("clamp_counter_reset", false)?
            .set_default("drain_timeout", "2s")?
            .set_default("reconnect.initial_delay", "1s")?
            .set_default("reconnect.max_delay", "30s")?
            .set_default("reconnect.multiplier", 2.0)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("ue_id", overrides.ue_id.map(i64::from))?
            .set_override_option("ws_url", overrides.ws_url.clone())?
            .set_override_option("poll_interval", overrides.poll_interval.clone())?
            .set_override_option("fields", overrides.fields.map(field_set_name))?
            .set_override_option(
                "output_dir",
                overrides.output_dir.as_ref().map(|p| p.display().to_string()),
            )?
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the poll driver cannot run with.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.poll_interval.is_zero() {
            return Err(config::ConfigError::Message(
                "poll_interval must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Path of the export file for this UE and field set.
    pub fn export_path(&self) -> PathBuf {
        self.output_dir.join(self.fields.file_name(self.ue_id))
    }
}

fn field_set_name(fields: FieldSet) -> &'static str {
    match fields {
        FieldSet::Basic => "basic",
        FieldSet::Extended => "extended",
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ue_id: Option<u32>,
    pub ws_url: Option<String>,
    pub poll_interval: Option<String>,
    pub fields: Option<FieldSet>,
    pub output_dir: Option<PathBuf>,
}

/// Capped exponential backoff between reconnection attempts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReconnectPolicy {
    #[serde(deserialize_with = "duration::deserialize")]
    pub initial_delay: Duration,
    #[serde(deserialize_with = "duration::deserialize")]
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Give up (and stop the monitor) after this many consecutive failed
    /// attempts. Unlimited when unset.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: None,
        }
    }
}
