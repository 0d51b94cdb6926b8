//! Integration tests for configuration files and value parsing.

use logqueryid_host::config::{ConfigRegistry, GucUnit, parse_bool, parse_int};
use logqueryid_host::error::ConfigError;
use proptest::prelude::*;

const SERVER_CONF: &str = "\
# -----------------------------
# PostgreSQL configuration file
# -----------------------------

shared_preload_libraries = 'pg_stat_statements,auto_explain'	# (change requires restart)
auto_explain.log_min_duration = '250ms'
auto_explain.log_nested_statements on
log_min_messages = warning
log_destination = 'stderr'
application_name = 'it''s me'
";

#[test]
fn server_conf_parses() {
    let config = ConfigRegistry::parse(SERVER_CONF).expect("configuration should parse");

    assert_eq!(
        config.get_config_option("shared_preload_libraries"),
        Some("pg_stat_statements,auto_explain")
    );
    assert_eq!(
        config.get_config_option("AUTO_EXPLAIN.LOG_MIN_DURATION"),
        Some("250ms")
    );
    assert_eq!(
        config
            .get_config_option("auto_explain.log_nested_statements")
            .map(parse_bool),
        Some(Ok(true))
    );
    assert_eq!(config.get_config_option("application_name"), Some("it's me"));
    assert_eq!(config.len(), 6);
}

#[test]
fn malformed_line_is_located() {
    let err = ConfigRegistry::parse("a = 1\nb = 'open\nc = 3\n").expect_err("should fail");
    assert!(matches!(err, ConfigError::Syntax { line: 2, .. }));
}

#[test]
fn huge_values_with_units_are_out_of_range() {
    let huge = "100000000000000000000000000000000000000";
    for (suffix, unit) in [
        ("d", GucUnit::Milliseconds),
        ("h", GucUnit::Seconds),
        ("TB", GucUnit::Kilobytes),
    ] {
        let value = format!("{huge}{suffix}");
        assert_eq!(
            parse_int(&value, unit),
            Err(ConfigError::OutOfRange(value.clone())),
            "{value} should be out of range"
        );
    }
    assert!(matches!(
        parse_int(&format!("-{huge}d"), GucUnit::Milliseconds),
        Err(ConfigError::OutOfRange(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Plain integers parse to themselves in any unit.
    #[test]
    fn prop_plain_integers_parse(value in any::<i32>()) {
        prop_assert_eq!(parse_int(&value.to_string(), GucUnit::None), Ok(value));
        prop_assert_eq!(parse_int(&value.to_string(), GucUnit::Milliseconds), Ok(value));
    }

    /// Seconds convert to milliseconds exactly while in range.
    #[test]
    fn prop_seconds_scale_to_milliseconds(secs in -3_000_000i64..3_000_000i64) {
        let expected = secs * 1000;
        let parsed = parse_int(&format!("{secs}s"), GucUnit::Milliseconds);
        if let Ok(expected) = i32::try_from(expected) {
            prop_assert_eq!(parsed, Ok(expected));
        } else {
            prop_assert!(matches!(parsed, Err(ConfigError::OutOfRange(_))));
        }
    }

    /// Any quoted value survives escaping with doubled quotes.
    #[test]
    fn prop_quoted_values_are_preserved(value in "[ -~]{0,24}") {
        let escaped = value.replace('\\', "\\\\").replace('\'', "''");
        let text = format!("setting = '{escaped}'\n");
        let config = ConfigRegistry::parse(&text).expect("quoted value should parse");
        prop_assert_eq!(config.get_config_option("setting"), Some(value.as_str()));
    }
}
