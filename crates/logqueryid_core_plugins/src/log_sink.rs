//! Host log sink.
//!
//! Provides [`LogSinkExtension`], which installs the process-wide `tracing`
//! subscriber and exposes the effective configuration as a resource.
//!
//! # Lifecycle
//!
//! - **`init()`** resolves the level and format from the extension's builder
//!   settings, falling back to the host's `log_min_messages` and
//!   `log_destination` settings, publishes the [`LogSinkConfig`] resource and
//!   installs the subscriber. A subscriber that is already installed is left
//!   in place.
//! - **`fini()`** removes the resource.
//!
//! # Example
//!
//! ```
//! use logqueryid_core_plugins::{LogFormat, LogSinkExtension};
//! use tracing::Level;
//!
//! // Development: compact output with debug level
//! let dev = LogSinkExtension::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(LogFormat::Compact);
//!
//! // Only trace the queryId logger
//! let focused = LogSinkExtension::new()
//!     .with_env_filter("warn,logqueryid=trace");
//! ```

use logqueryid_host::backend::Backend;
use logqueryid_host::config::ConfigRegistry;
use logqueryid_host::extension::Extension;
use logqueryid_host::resource::Resource;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::severity::Severity;

/// Host setting holding the minimum severity written to the server log.
const LOG_MIN_MESSAGES: &str = "log_min_messages";

/// Host setting holding the comma-separated list of log destinations.
const LOG_DESTINATION: &str = "log_destination";

/// Severity used when `log_min_messages` is unset or invalid.
const DEFAULT_MIN_SEVERITY: Severity = Severity::Warning;

// ─────────────────────────────────────────────────────────────────────────────
// LogFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line output, as in a plain server log file (default).
    #[default]
    Compact,
    /// JSON objects, one per line.
    Json,
}

impl LogFormat {
    /// Picks the format for a `log_destination` value: JSON when the list
    /// contains `jsonlog`, compact otherwise.
    #[must_use]
    pub fn from_destination(destination: &str) -> Self {
        let json = destination
            .split(',')
            .any(|entry| entry.trim().eq_ignore_ascii_case("jsonlog"));
        if json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LogSinkConfig Resource
// ─────────────────────────────────────────────────────────────────────────────

/// Effective log sink configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSinkConfig {
    /// Most verbose level written.
    pub level: Level,
    /// Line format.
    pub format: LogFormat,
    /// Filter directive handed to [`EnvFilter`].
    pub filter: String,
}

impl Resource for LogSinkConfig {}

impl LogSinkConfig {
    /// Builds the subscriber filter. An invalid directive falls back to the
    /// plain level.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LogSinkExtension
// ─────────────────────────────────────────────────────────────────────────────

/// Log sink extension.
///
/// Builder settings take precedence over host configuration; anything left
/// unset is read from the backend's [`ConfigRegistry`] at load time.
///
/// # Resources Provided
///
/// | Resource | Description |
/// |----------|-------------|
/// | [`LogSinkConfig`] | Effective configuration (read-only) |
#[derive(Debug, Clone, Default)]
pub struct LogSinkExtension {
    level: Option<Level>,
    format: Option<LogFormat>,
    env_filter: Option<String>,
    span_events: bool,
}

impl LogSinkExtension {
    /// Creates a sink configured entirely from host settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the level derived from `log_min_messages`.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Overrides the format derived from `log_destination`.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets a filter directive (`target=level,...`) replacing the plain
    /// level filter.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Resolves the effective configuration against host settings.
    #[must_use]
    pub fn resolve(&self, config: &ConfigRegistry) -> LogSinkConfig {
        let level = self.level.unwrap_or_else(|| {
            config
                .get_config_option(LOG_MIN_MESSAGES)
                .and_then(|value| match value.parse::<Severity>() {
                    Ok(severity) => Some(severity),
                    Err(err) => {
                        tracing::warn!(%err, "ignoring {LOG_MIN_MESSAGES}");
                        None
                    }
                })
                .unwrap_or(DEFAULT_MIN_SEVERITY)
                .level()
        });
        let format = self.format.unwrap_or_else(|| {
            config
                .get_config_option(LOG_DESTINATION)
                .map_or(LogFormat::default(), LogFormat::from_destination)
        });
        let filter = self
            .env_filter
            .clone()
            .unwrap_or_else(|| level.as_str().to_ascii_lowercase());

        LogSinkConfig {
            level,
            format,
            filter,
        }
    }

    fn install(&self, sink: &LogSinkConfig) {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init().ok() leaves an already installed subscriber alone
        match sink.format {
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(sink.env_filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            LogFormat::Compact => {
                tracing_subscriber::registry()
                    .with(sink.env_filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(sink.env_filter())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
        }
    }
}

impl Extension for LogSinkExtension {
    fn init(&self, backend: &mut Backend) {
        let sink = self.resolve(backend.config());
        self.install(&sink);
        tracing::debug!(
            level = %sink.level,
            format = ?sink.format,
            filter = %sink.filter,
            "log sink initialized"
        );
        backend.insert_resource(sink);
    }

    fn fini(&self, backend: &mut Backend) {
        tracing::debug!("log sink shutting down");
        backend.remove_resource::<LogSinkConfig>();
    }

    fn name(&self) -> &str {
        "log_sink"
    }
}
