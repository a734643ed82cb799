//! Log output for the lead service.
//!
//! Plain text by default; `LOG_JSON=1` switches to one JSON object per line
//! for log shippers. `RUST_LOG` overrides the filter.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Service crates at `info`, request traces from tower-http, everything else at `warn`.
pub const DEFAULT_LOG_FILTER: &str =
    "warn,studio_leads=info,api=info,delivery=info,studio_core=info,telemetry=info,tower_http=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `1`, `true` or `yes` (any case) select JSON.
    pub fn from_flag(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("1" | "true" | "yes") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl TracingConfig {
    /// Build from the raw `LOG_JSON` and `RUST_LOG` values.
    pub fn from_env_values(log_json: Option<&str>, rust_log: Option<&str>) -> Self {
        let filter = rust_log
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_LOG_FILTER);
        Self {
            filter: filter.to_string(),
            format: LogFormat::from_flag(log_json),
        }
    }

    pub fn from_env() -> Self {
        let log_json = std::env::var("LOG_JSON").ok();
        let rust_log = std::env::var("RUST_LOG").ok();
        Self::from_env_values(log_json.as_deref(), rust_log.as_deref())
    }

    /// Parsed filter, falling back to the service default when invalid.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?,
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init()?,
    }

    tracing::info!(filter = %config.filter, format = ?config.format, "Logging initialized");
    Ok(())
}

pub fn init_tracing_from_env() -> Result<(), TryInitError> {
    init_tracing(&TracingConfig::from_env())
}
