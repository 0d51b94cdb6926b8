//! Core infrastructure extensions for logqueryid.
//!
//! - [`LogSinkExtension`] - installs the process-wide `tracing` subscriber
//!   the host writes its server log through, configured from the host's
//!   `log_min_messages` and `log_destination` settings
//! - [`Severity`] - host message severities and their `tracing` levels
//!
//! # Example
//!
//! ```
//! use logqueryid_core_plugins::{LogFormat, LogSinkConfig, LogSinkExtension};
//! use logqueryid_host::backend::Backend;
//! use logqueryid_host::config::ConfigRegistry;
//!
//! let config = ConfigRegistry::new()
//!     .with("log_min_messages", "info")
//!     .with("log_destination", "stderr,jsonlog");
//!
//! let mut backend = Backend::new(config);
//! backend.load_extension(LogSinkExtension::new()).unwrap();
//!
//! let sink = backend.get_resource::<LogSinkConfig>().unwrap();
//! assert_eq!(sink.level, tracing::Level::INFO);
//! assert_eq!(sink.format, LogFormat::Json);
//! ```

mod log_sink;
mod severity;

pub use log_sink::{LogFormat, LogSinkConfig, LogSinkExtension};
pub use severity::{ParseSeverityError, Severity};
