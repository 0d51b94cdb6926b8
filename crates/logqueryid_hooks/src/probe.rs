//! Collaborator detection at load time.
//!
//! The queryId line is only useful next to the output of two other
//! extensions: the statement-statistics extension, which computes the
//! fingerprint, and the plan explainer, which logs the plans the fingerprint
//! identifies. [`probe`] checks that both are in the host's preload list and
//! reports what it found.
//!
//! # Example
//!
//! ```
//! use logqueryid_hooks::probe::probe;
//! use logqueryid_host::config::ConfigRegistry;
//!
//! let config = ConfigRegistry::new()
//!     .with("shared_preload_libraries", "pg_stat_statements,auto_explain")
//!     .with("auto_explain.log_min_duration", "1s");
//!
//! let report = probe(&config);
//! assert!(report.enabled);
//! assert_eq!(report.log_min_duration, Some(1000));
//! ```

use logqueryid_host::config::{ConfigRegistry, GucUnit, parse_bool, parse_int};
use logqueryid_host::resource::Resource;

use crate::LOG_TARGET;

/// Host setting listing the libraries loaded at server start.
pub const SHARED_PRELOAD_LIBRARIES: &str = "shared_preload_libraries";

/// Library computing statement fingerprints.
pub const STATEMENT_STATISTICS: &str = "pg_stat_statements";

/// Library logging execution plans.
pub const PLAN_EXPLAINER: &str = "auto_explain";

/// Libraries that must both be preloaded for queryId logging.
pub const COLLABORATORS: [&str; 2] = [STATEMENT_STATISTICS, PLAN_EXPLAINER];

/// Plan explainer's duration threshold, in milliseconds.
pub const LOG_MIN_DURATION: &str = "auto_explain.log_min_duration";

/// Plan explainer's switch for logging nested statements.
pub const LOG_NESTED_STATEMENTS: &str = "auto_explain.log_nested_statements";

/// Value reported for an unparsable duration threshold.
const UNPARSABLE_DURATION: i32 = -1;

/// What [`probe`] found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// True iff every collaborator is preloaded.
    pub enabled: bool,
    /// Collaborators missing from the preload list.
    pub missing: Vec<&'static str>,
    /// Plan explainer duration threshold in milliseconds, if set; `-1` when
    /// the value did not parse.
    pub log_min_duration: Option<i32>,
    /// Plan explainer nested-statements switch, if set and a valid boolean.
    pub log_nested_statements: Option<bool>,
}

impl Resource for ProbeReport {}

/// Reads the collaborator settings from `config` and logs what it finds.
///
/// Emits one warning per missing collaborator and one informational line
/// saying whether queryId logging is enabled. An unset preload list counts
/// as both collaborators missing. Never fails.
#[must_use]
pub fn probe(config: &ConfigRegistry) -> ProbeReport {
    let preload = config.get_config_option(SHARED_PRELOAD_LIBRARIES);

    let missing: Vec<&'static str> = COLLABORATORS
        .into_iter()
        .filter(|name| !preload.is_some_and(|list| list.contains(name)))
        .collect();
    for name in &missing {
        tracing::warn!(target: LOG_TARGET, "pg_logqueryid: {name} not loaded");
    }

    let log_min_duration = config.get_config_option(LOG_MIN_DURATION).map(|value| {
        let millis = parse_int(value, GucUnit::Milliseconds).unwrap_or_else(|err| {
            tracing::debug!(target: LOG_TARGET, %err, "unparsable {LOG_MIN_DURATION}");
            UNPARSABLE_DURATION
        });
        tracing::info!(target: LOG_TARGET, "{LOG_MIN_DURATION}={millis}");
        millis
    });

    let log_nested_statements = config.get_config_option(LOG_NESTED_STATEMENTS).and_then(|value| {
        tracing::info!(target: LOG_TARGET, "{LOG_NESTED_STATEMENTS}={value}");
        parse_bool(value)
            .inspect_err(|err| {
                tracing::debug!(target: LOG_TARGET, %err, "unparsable {LOG_NESTED_STATEMENTS}");
            })
            .ok()
    });

    let enabled = missing.is_empty();
    if enabled {
        tracing::info!(target: LOG_TARGET, "logqueryid is enabled");
    } else {
        tracing::info!(target: LOG_TARGET, "logqueryid is not enabled");
    }

    ProbeReport {
        enabled,
        missing,
        log_min_duration,
        log_nested_statements,
    }
}
