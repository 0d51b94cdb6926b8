//! Host-wide configuration registry.
//!
//! Settings are text values keyed by case-insensitive names, exactly as they
//! appear in the server configuration file. Interpreting a value (as an
//! integer with units, or as a boolean) is up to the reader, through
//! [`parse_int`] and [`parse_bool`].
//!
//! # Example
//!
//! ```
//! use logqueryid_host::config::{ConfigRegistry, GucUnit, parse_int};
//!
//! let config = ConfigRegistry::parse(
//!     "shared_preload_libraries = 'pg_stat_statements,auto_explain'\n\
//!      auto_explain.log_min_duration = 250ms  # log slow statements\n",
//! )
//! .unwrap();
//!
//! let duration = config.get_config_option("auto_explain.log_min_duration").unwrap();
//! assert_eq!(parse_int(duration, GucUnit::Milliseconds), Ok(250));
//! assert!(config.get_config_option("SHARED_PRELOAD_LIBRARIES").is_some());
//! ```

use hashbrown::HashMap;

use crate::error::ConfigError;

// ─────────────────────────────────────────────────────────────────────────────
// ConfigRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// One configuration entry, remembering the spelling it was set with.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Setting {
    name: String,
    value: String,
}

/// Key-value store of string settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRegistry {
    /// Settings keyed by lower-cased name.
    settings: HashMap<String, Setting>,
}

impl ConfigRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        self.settings
            .insert(
                key,
                Setting {
                    name,
                    value: value.into(),
                },
            )
            .map(|old| old.value)
    }

    /// Sets a value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Removes a value, returning it.
    pub fn reset(&mut self, name: &str) -> Option<String> {
        self.settings
            .remove(&name.to_ascii_lowercase())
            .map(|old| old.value)
    }

    /// Returns the value of a setting, or `None` if it is not set.
    #[must_use]
    pub fn get_config_option(&self, name: &str) -> Option<&str> {
        self.settings
            .get(&name.to_ascii_lowercase())
            .map(|setting| setting.value.as_str())
    }

    /// Returns the number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Returns true if nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Iterates over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.settings
            .values()
            .map(|setting| (setting.name.as_str(), setting.value.as_str()))
    }

    /// Parses configuration file text.
    ///
    /// Each non-blank line is `name = value` or `name value`. Values may be
    /// single-quoted, with `''` or `\'` for an embedded quote. `#` starts a
    /// comment outside quotes. A later line overrides an earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Syntax`] with the 1-based line number of the
    /// first malformed line.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            if let Some((name, value)) = parse_line(line).map_err(|message| ConfigError::Syntax {
                line: line_no,
                message,
            })? {
                registry.set(name, value);
            }
        }
        Ok(registry)
    }
}

/// Parses one configuration line. `Ok(None)` for blank and comment lines.
fn parse_line(line: &str) -> Result<Option<(String, String)>, String> {
    let rest = line.trim_start();
    if rest.is_empty() || rest.starts_with('#') {
        return Ok(None);
    }

    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return Err(format!("expected a parameter name, found {:?}", rest));
    }
    let (name, rest) = rest.split_at(name_len);

    let mut rest = rest.trim_start();
    if let Some(stripped) = rest.strip_prefix('=') {
        rest = stripped.trim_start();
    }

    let (value, rest) = if let Some(quoted) = rest.strip_prefix('\'') {
        parse_quoted(quoted).ok_or_else(|| format!("unterminated quoted value for {name}"))?
    } else {
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '#')
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(format!("missing value for {name}"));
        }
        (rest[..end].to_string(), &rest[end..])
    };

    let trailing = rest.trim_start();
    if !(trailing.is_empty() || trailing.starts_with('#')) {
        return Err(format!("unexpected text after value of {name}: {trailing:?}"));
    }

    Ok(Some((name.to_string(), value)))
}

/// Reads a quoted value after its opening quote. Returns the unescaped value
/// and the text after the closing quote.
fn parse_quoted(input: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\'' => {
                if let Some((_, '\'')) = chars.peek() {
                    chars.next();
                    value.push('\'');
                } else {
                    return Some((value, &input[i + 1..]));
                }
            }
            '\\' => {
                let (_, escaped) = chars.next()?;
                value.push(escaped);
            }
            _ => value.push(c),
        }
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Value Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Base unit of an integer setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GucUnit {
    /// Plain number; unit suffixes are rejected.
    #[default]
    None,
    /// Kilobytes; accepts `B`, `kB`, `MB`, `GB`, `TB`.
    Kilobytes,
    /// Milliseconds; accepts `us`, `ms`, `s`, `min`, `h`, `d`.
    Milliseconds,
    /// Seconds; accepts the same suffixes as milliseconds.
    Seconds,
}

/// Size of a memory unit in bytes.
fn memory_unit(suffix: &str) -> Option<i128> {
    match suffix {
        "B" => Some(1),
        "kB" => Some(1 << 10),
        "MB" => Some(1 << 20),
        "GB" => Some(1 << 30),
        "TB" => Some(1 << 40),
        _ => None,
    }
}

/// Length of a time unit in microseconds.
fn time_unit(suffix: &str) -> Option<i128> {
    match suffix {
        "us" => Some(1),
        "ms" => Some(1_000),
        "s" => Some(1_000_000),
        "min" => Some(60_000_000),
        "h" => Some(3_600_000_000),
        "d" => Some(86_400_000_000),
        _ => None,
    }
}

/// Parses an integer setting, converting a unit suffix into `unit`.
///
/// Accepts an optional sign, then decimal, `0x` hexadecimal, or leading-zero
/// octal digits, then optional whitespace and a unit. Conversions round to
/// the nearest whole base unit.
///
/// # Errors
///
/// - [`ConfigError::InvalidInteger`] for anything that is not a number
/// - [`ConfigError::InvalidUnit`] for a suffix not valid for `unit`
/// - [`ConfigError::OutOfRange`] if the result does not fit in an `i32`
pub fn parse_int(value: &str, unit: GucUnit) -> Result<i32, ConfigError> {
    let invalid = || ConfigError::InvalidInteger(value.to_string());
    let trimmed = value.trim();

    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits_start) = if unsigned.starts_with("0x") || unsigned.starts_with("0X") {
        (16, &unsigned[2..])
    } else if unsigned.len() > 1
        && unsigned.starts_with('0')
        && unsigned.as_bytes()[1].is_ascii_digit()
    {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    let digits_len = digits_start
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits_start.len());
    if digits_len == 0 {
        return Err(invalid());
    }
    let (digits, suffix) = digits_start.split_at(digits_len);
    let magnitude = i128::from_str_radix(digits, radix)
        .map_err(|_| ConfigError::OutOfRange(value.to_string()))?;
    let mut number = if negative { -magnitude } else { magnitude };

    let suffix = suffix.trim_start();
    if !suffix.is_empty() {
        let (from, to) = match unit {
            GucUnit::None => (None, 1),
            GucUnit::Kilobytes => (memory_unit(suffix), 1 << 10),
            GucUnit::Milliseconds => (time_unit(suffix), 1_000),
            GucUnit::Seconds => (time_unit(suffix), 1_000_000),
        };
        let from = from.ok_or_else(|| ConfigError::InvalidUnit {
            value: value.to_string(),
            unit: suffix.to_string(),
        })?;
        let out_of_range = || ConfigError::OutOfRange(value.to_string());
        let scaled = number.checked_mul(from).ok_or_else(out_of_range)?;
        // round half away from zero
        number = scaled
            .checked_add(scaled.signum() * (to / 2))
            .ok_or_else(out_of_range)?
            / to;
    }

    i32::try_from(number).map_err(|_| ConfigError::OutOfRange(value.to_string()))
}

/// Parses a boolean setting.
///
/// Accepts, case-insensitively: `on`, `off`, `1`, `0`, and any non-empty
/// prefix of `true`, `false`, `yes`, `no`. `of` is accepted for `off`; a bare
/// `o` is ambiguous and rejected.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBool`] for any other spelling.
pub fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    let lowered = value.trim().to_ascii_lowercase();
    let candidate = lowered.as_str();
    let is_prefix_of = |word: &str| !candidate.is_empty() && word.starts_with(candidate);

    match candidate {
        "on" | "1" => Ok(true),
        "of" | "off" | "0" => Ok(false),
        _ if is_prefix_of("true") || is_prefix_of("yes") => Ok(true),
        _ if is_prefix_of("false") || is_prefix_of("no") => Ok(false),
        _ => Err(ConfigError::InvalidBool(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        let mut config = ConfigRegistry::new();
        assert_eq!(config.set("Shared_Preload_Libraries", "a"), None);
        assert_eq!(config.get_config_option("shared_preload_libraries"), Some("a"));
        assert_eq!(
            config.set("SHARED_PRELOAD_LIBRARIES", "b"),
            Some("a".to_string())
        );
        assert_eq!(config.len(), 1);
        assert_eq!(config.reset("shared_preload_libraries"), Some("b".into()));
        assert!(config.is_empty());
    }

    #[test]
    fn iter_keeps_original_spelling() {
        let config = ConfigRegistry::new().with("Auto_Explain.Log_Min_Duration", "10");
        let pairs: Vec<_> = config.iter().collect();
        assert_eq!(pairs, vec![("Auto_Explain.Log_Min_Duration", "10")]);
    }

    #[test]
    fn parse_line_forms() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("# comment"), Ok(None));
        assert_eq!(
            parse_line("work_mem = 4MB"),
            Ok(Some(("work_mem".into(), "4MB".into())))
        );
        assert_eq!(
            parse_line("work_mem 4MB # trailing"),
            Ok(Some(("work_mem".into(), "4MB".into())))
        );
        assert_eq!(
            parse_line("search_path = 'it''s, \\'quoted\\''"),
            Ok(Some(("search_path".into(), "it's, 'quoted'".into())))
        );
        assert_eq!(
            parse_line("x = ''"),
            Ok(Some(("x".into(), String::new())))
        );
        assert!(parse_line("= 4").is_err());
        assert!(parse_line("work_mem =").is_err());
        assert!(parse_line("a = 'unterminated").is_err());
        assert!(parse_line("a = 1 2").is_err());
    }

    #[test]
    fn parse_reports_line_number() {
        let err = ConfigRegistry::parse("a = 1\n\nb = 'oops\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 3, .. }));
    }

    #[test]
    fn parse_later_lines_win() {
        let config = ConfigRegistry::parse("a = 1\nA = 2\n").unwrap();
        assert_eq!(config.get_config_option("a"), Some("2"));
    }

    #[test]
    fn parse_int_plain() {
        assert_eq!(parse_int("42", GucUnit::None), Ok(42));
        assert_eq!(parse_int(" -1 ", GucUnit::None), Ok(-1));
        assert_eq!(parse_int("+7", GucUnit::None), Ok(7));
        assert_eq!(parse_int("0x1F", GucUnit::None), Ok(31));
        assert_eq!(parse_int("010", GucUnit::None), Ok(8));
        assert_eq!(parse_int("0", GucUnit::None), Ok(0));
    }

    #[test]
    fn parse_int_rejects_junk() {
        assert!(matches!(
            parse_int("abc", GucUnit::None),
            Err(ConfigError::InvalidInteger(_))
        ));
        assert!(matches!(
            parse_int("", GucUnit::Milliseconds),
            Err(ConfigError::InvalidInteger(_))
        ));
        assert!(matches!(
            parse_int("10ms", GucUnit::None),
            Err(ConfigError::InvalidUnit { .. })
        ));
        assert!(matches!(
            parse_int("10MB", GucUnit::Milliseconds),
            Err(ConfigError::InvalidUnit { .. })
        ));
        assert!(matches!(
            parse_int("99999999999", GucUnit::None),
            Err(ConfigError::OutOfRange(_))
        ));
    }

    #[test]
    fn parse_int_converts_units() {
        assert_eq!(parse_int("250ms", GucUnit::Milliseconds), Ok(250));
        assert_eq!(parse_int("2 s", GucUnit::Milliseconds), Ok(2_000));
        assert_eq!(parse_int("1min", GucUnit::Milliseconds), Ok(60_000));
        assert_eq!(parse_int("1500us", GucUnit::Milliseconds), Ok(2));
        assert_eq!(parse_int("1h", GucUnit::Seconds), Ok(3_600));
        assert_eq!(parse_int("1d", GucUnit::Seconds), Ok(86_400));
        assert_eq!(parse_int("4MB", GucUnit::Kilobytes), Ok(4_096));
        assert_eq!(parse_int("-1", GucUnit::Milliseconds), Ok(-1));
    }

    #[test]
    fn parse_bool_spellings() {
        for spelling in ["on", "ON", "true", "t", "tr", "yes", "y", "1"] {
            assert_eq!(parse_bool(spelling), Ok(true), "{spelling}");
        }
        for spelling in ["off", "of", "false", "f", "no", "n", "0", "FALSE"] {
            assert_eq!(parse_bool(spelling), Ok(false), "{spelling}");
        }
        for spelling in ["", "o", "maybe", "onn", "2"] {
            assert!(parse_bool(spelling).is_err(), "{spelling}");
        }
    }
}
