//! Error types raised by the host runtime.

/// Result of one executor lifecycle call.
pub type ExecResult = Result<(), ExecutorError>;

/// Failure raised while a query is executing.
///
/// Hooks must hand these back to their caller untouched: whichever value a
/// delegated call returns is the value the caller observes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    /// An error raised by a plan step or by a hook.
    #[error("{message}")]
    Raised {
        /// The error message.
        message: String,
    },

    /// The statement was canceled.
    #[error("canceling statement due to user request")]
    QueryCanceled,

    /// `executor_start` was called on a query that already has execution state.
    #[error("executor already started for this query")]
    AlreadyStarted,

    /// A run/finish call was made on a query that was never started.
    #[error("executor not started for this query")]
    NotStarted,

    /// Nested statements went deeper than the executor allows.
    #[error("stack depth limit exceeded: depth {depth} exceeds max {max}")]
    StackDepthExceeded {
        /// The depth that was attempted.
        depth: usize,
        /// The configured maximum.
        max: usize,
    },
}

impl ExecutorError {
    /// Creates a [`ExecutorError::Raised`] with the given message.
    #[must_use]
    pub fn raise(message: impl Into<String>) -> Self {
        Self::Raised {
            message: message.into(),
        }
    }
}

/// Errors from reading or interpreting configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A configuration file line could not be parsed.
    #[error("syntax error in configuration line {line}: {message}")]
    Syntax {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// The value is not an integer.
    #[error("invalid value for integer parameter: \"{0}\"")]
    InvalidInteger(String),

    /// The value carries a unit that is not valid for the parameter.
    #[error("invalid unit \"{unit}\" in value \"{value}\"")]
    InvalidUnit {
        /// The full value.
        value: String,
        /// The offending unit suffix.
        unit: String,
    },

    /// The value does not fit in a 32-bit integer after unit conversion.
    #[error("value \"{0}\" is out of range for an integer parameter")]
    OutOfRange(String),

    /// The value is not a recognized boolean spelling.
    #[error("parameter requires a Boolean value, got \"{0}\"")]
    InvalidBool(String),
}

/// Errors from the extension loading protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionError {
    /// The extension type is already loaded in this backend.
    #[error("extension '{0}' is already loaded")]
    AlreadyLoaded(String),

    /// The extension type is not loaded in this backend.
    #[error("extension '{0}' is not loaded")]
    NotLoaded(String),
}
