use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Variable mapping produced by parsing, keyed by variable name.
pub type Env = BTreeMap<String, Value>;

/// A resolved variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// `false` for `false`, zero, NaN and the empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::String(value) => !value.is_empty(),
            Self::Number(value) => *value != 0.0 && !value.is_nan(),
            Self::Bool(value) => *value,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(value) => f.write_str(value),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => fmt_number(*value, f),
        }
    }
}

/// Shortest round-trip digits, switching to exponent form below `1e-6` and
/// from `1e21` up, like JavaScript number-to-string conversion.
fn fmt_number(value: f64, f: &mut Formatter<'_>) -> std::fmt::Result {
    if value.is_infinite() {
        return f.write_str(if value < 0.0 { "-Infinity" } else { "Infinity" });
    }
    if value == 0.0 {
        return f.write_str("0");
    }

    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) && !value.is_nan() {
        let formatted = format!("{value:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                write!(f, "{mantissa}e+{exponent}")
            }
            _ => f.write_str(&formatted),
        };
    }

    write!(f, "{value}")
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Escape and variable expansion behavior for non-single-quoted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionMode {
    /// Unescape backslashes and expand `$VAR` and `${VAR}` references.
    #[default]
    Expand,
    /// Keep values exactly as they read after quote stripping.
    Disabled,
}

/// Parser configuration, fixed when a [`Parser`](crate::Parser) is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub booleans: bool,
    pub numbers: bool,
    pub substitution_mode: SubstitutionMode,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coerce `true`/`false` (any case) to [`Value::Bool`].
    pub fn booleans(mut self, booleans: bool) -> Self {
        self.booleans = booleans;
        self
    }

    /// Coerce values with a leading numeric prefix to [`Value::Number`].
    pub fn numbers(mut self, numbers: bool) -> Self {
        self.numbers = numbers;
        self
    }

    pub fn substitution_mode(mut self, substitution_mode: SubstitutionMode) -> Self {
        self.substitution_mode = substitution_mode;
        self
    }
}

/// Summary of a load or apply operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped_existing: usize,
    pub files_read: usize,
}

/// Render a mapping as `KEY=value` lines in key order, values unquoted.
pub fn to_dotenv_string(env: &Env) -> String {
    let mut out = String::new();
    for (key, value) in env {
        out.push_str(key);
        out.push('=');
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_display_without_trailing_fraction() {
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::Number(2.75).to_string(), "2.75");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
    }

    #[test]
    fn numbers_switch_to_exponent_form_at_the_edges() {
        assert_eq!(Value::Number(1e21).to_string(), "1e+21");
        assert_eq!(Value::Number(-2.5e30).to_string(), "-2.5e+30");
        assert_eq!(Value::Number(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::Number(1e-7).to_string(), "1e-7");
        assert_eq!(Value::Number(1.5e-7).to_string(), "1.5e-7");
        assert_eq!(Value::Number(0.000001).to_string(), "0.000001");
    }

    #[test]
    fn truthiness_follows_falsy_values() {
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::Bool(true).is_truthy());
    }

    #[test]
    fn accessors_match_variant() {
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from("x").as_bool(), None);
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(2.5).as_f64(), Some(2.5));
    }

    #[test]
    fn dotenv_string_is_sorted_by_key() {
        let mut env = Env::new();
        env.insert("B".to_owned(), Value::from(false));
        env.insert("A".to_owned(), Value::from("a b "));
        env.insert("C".to_owned(), Value::from(7.0));

        assert_eq!(to_dotenv_string(&env), "A=a b \nB=false\nC=7\n");
    }
}
