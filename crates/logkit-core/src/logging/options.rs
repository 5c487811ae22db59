//! Logger options.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::encoder::Encoding;
use super::entry::Level;
use crate::error::{LogError, Result};

/// Zone used when none is configured
pub const DEFAULT_TIME_ZONE: &str = "Asia/Jakarta";

/// Directory used when an empty directory name is given
pub const DEFAULT_DIR: &str = "log";

pub const ENV_DEVELOPMENT: &str = "LOGKIT_DEVELOPMENT";
pub const ENV_TIME_ZONE: &str = "LOGKIT_TIME_ZONE";
pub const ENV_WITH_TRACE: &str = "LOGKIT_WITH_TRACE";
pub const ENV_REF_ID: &str = "LOGKIT_REF_ID";
pub const ENV_OUTPUT: &str = "LOGKIT_OUTPUT";

/// How a logger instance behaves.
///
/// ```
/// use logkit_core::LogOptions;
///
/// let opts = LogOptions::default()
///     .development()
///     .with_trace()
///     .with_ref_id("order-1234")
///     .with_output("stdout");
/// assert!(opts.development);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// Console encoding and debug threshold instead of JSON, info
    /// threshold and sampling
    pub development: bool,

    /// IANA zone name for file dates and timestamps
    pub time_zone: Option<String>,

    /// Attach a fresh `trace-id` to every record
    pub with_trace: bool,

    /// Attach `ref-id` to every record; empty means none
    pub ref_id: String,

    /// Extra sinks after the dated log file (`stdout`, `stderr` or paths)
    pub output: Vec<String>,
}

impl LogOptions {
    pub fn development(mut self) -> Self {
        self.development = true;
        self
    }

    pub fn with_time_zone(mut self, zone: impl Into<String>) -> Self {
        self.time_zone = Some(zone.into());
        self
    }

    pub fn with_trace(mut self) -> Self {
        self.with_trace = true;
        self
    }

    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = ref_id.into();
        self
    }

    /// Append an extra sink. Order is kept and duplicates are not removed.
    pub fn with_output(mut self, sink: impl Into<String>) -> Self {
        self.output.push(sink.into());
        self
    }

    /// Read options from `LOGKIT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut opts = Self::default();

        if let Some(v) = lookup(ENV_DEVELOPMENT) {
            opts.development = parse_bool(ENV_DEVELOPMENT, &v)?;
        }
        if let Some(v) = lookup(ENV_WITH_TRACE) {
            opts.with_trace = parse_bool(ENV_WITH_TRACE, &v)?;
        }
        opts.time_zone = lookup(ENV_TIME_ZONE).filter(|v| !v.trim().is_empty());
        opts.ref_id = lookup(ENV_REF_ID).unwrap_or_default();
        if let Some(v) = lookup(ENV_OUTPUT) {
            opts.output = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(opts)
    }

    /// Resolve the configured zone, or the default one.
    pub fn resolve_time_zone(&self) -> Result<Tz> {
        let name = self.time_zone.as_deref().unwrap_or(DEFAULT_TIME_ZONE);
        name
            .parse::<Tz>()
            .map_err(|_| LogError::TimeZone(name.to_string()))
    }

    pub fn min_level(&self) -> Level {
        if self.development {
            Level::Debug
        } else {
            Level::Info
        }
    }

    pub fn encoding(&self) -> Encoding {
        if self.development {
            Encoding::Console
        } else {
            Encoding::Json
        }
    }

    pub fn has_ref_id(&self) -> bool {
        !self.ref_id.is_empty()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(LogError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
