//! Tracing subscriber setup
//!
//! Binaries built on this crate call [`init_tracing`] once at startup.
//! `RUST_LOG` takes precedence over the default filter; setting
//! `HEARTH_LOG_FORMAT=json` switches the output to one JSON object per line.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable selecting the log output format
pub const LOG_FORMAT_ENV: &str = "HEARTH_LOG_FORMAT";

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Parses a format name; anything other than `json` is pretty output
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }

    /// Reads the format from `HEARTH_LOG_FORMAT`
    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

/// Installs the global tracing subscriber
///
/// `default_filter` is used when `RUST_LOG` is unset or invalid, e.g.
/// `"hearth_shared=debug"`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let format = LogFormat::from_env();

    let json = (format == LogFormat::Json).then(|| fmt::layer().json());
    let pretty = (format == LogFormat::Pretty).then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()?;

    tracing::debug!(?format, "Tracing initialized");
    Ok(())
}
