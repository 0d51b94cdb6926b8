//! Host message severities.

use core::fmt;
use core::str::FromStr;

use tracing::Level;

/// Severity of a host log message, from least to most severe.
///
/// The host has more severities than `tracing` has levels; see
/// [`Severity::level`] for how they collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Most detailed developer output.
    Debug5,
    /// Developer output.
    Debug4,
    /// Developer output.
    Debug3,
    /// Developer output.
    Debug2,
    /// Least detailed developer output.
    Debug1,
    /// Informational message for the server log.
    Log,
    /// Informational message for the client.
    Info,
    /// Something the user may want to know about.
    Notice,
    /// Likely problem.
    Warning,
    /// Error aborting the current statement.
    Error,
    /// Error terminating the session.
    Fatal,
    /// Error terminating every session.
    Panic,
}

impl Severity {
    /// Every severity, least severe first.
    pub const ALL: [Severity; 12] = [
        Severity::Debug5,
        Severity::Debug4,
        Severity::Debug3,
        Severity::Debug2,
        Severity::Debug1,
        Severity::Log,
        Severity::Info,
        Severity::Notice,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
        Severity::Panic,
    ];

    /// Returns the `tracing` level messages of this severity are emitted at.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Severity::Debug5 | Severity::Debug4 | Severity::Debug3 | Severity::Debug2 => {
                Level::TRACE
            }
            Severity::Debug1 => Level::DEBUG,
            Severity::Log | Severity::Info => Level::INFO,
            Severity::Notice | Severity::Warning => Level::WARN,
            Severity::Error | Severity::Fatal | Severity::Panic => Level::ERROR,
        }
    }

    /// Returns the configuration spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug5 => "debug5",
            Severity::Debug4 => "debug4",
            Severity::Debug3 => "debug3",
            Severity::Debug2 => "debug2",
            Severity::Debug1 => "debug1",
            Severity::Log => "log",
            Severity::Info => "info",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
            Severity::Panic => "panic",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid severity: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    /// Parses a severity name, case-insensitively. `debug` is `debug2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name == "debug" {
            return Ok(Severity::Debug2);
        }
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str() == name)
            .ok_or_else(|| ParseSeverityError(s.to_owned()))
    }
}
