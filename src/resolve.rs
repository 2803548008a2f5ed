//! Turning a raw value into a [`Value`].
//!
//! Steps run in a fixed order and each may finish early: quote stripping,
//! boolean coercion, numeric coercion, then unescaping and `$VAR` expansion
//! for values that were not single-quoted.

use crate::model::{Env, ParseOptions, SubstitutionMode, Value};

pub(crate) fn resolve_value(raw: &str, options: &ParseOptions, env: &Env) -> Value {
    let stripped = strip_quotes(raw);

    if options.booleans
        && let Some(value) = coerce_bool(stripped)
    {
        return Value::Bool(value);
    }

    if options.numbers
        && let Some(value) = parse_float_prefix(stripped)
    {
        return Value::Number(value);
    }

    Value::String(finalize_string(raw, stripped, options.substitution_mode, env))
}

fn strip_quotes(raw: &str) -> &str {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

fn coerce_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse the longest numeric prefix of `input`, ignoring leading whitespace.
///
/// Accepts an optional sign followed by `Infinity`, or by digits with an
/// optional fraction and exponent. Anything after the prefix is ignored.
pub(crate) fn parse_float_prefix(input: &str) -> Option<f64> {
    let input = input.trim_start();
    let bytes = input.as_bytes();

    let mut end = 0usize;
    let negative = match bytes.first() {
        Some(b'-') => {
            end = 1;
            true
        }
        Some(b'+') => {
            end = 1;
            false
        }
        _ => false,
    };

    if input[end..].starts_with("Infinity") {
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0usize;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    input[..end].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|byte| byte.is_ascii_digit()).count()
}

fn finalize_string(raw: &str, stripped: &str, mode: SubstitutionMode, env: &Env) -> String {
    if mode == SubstitutionMode::Disabled || raw.starts_with('\'') {
        return stripped.to_owned();
    }

    substitute(raw, unescape(stripped), env)
}

/// Drop every backslash that precedes a character other than `$`.
pub(crate) fn unescape(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_owned();
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\'
            && let Some(&next) = chars.peek()
            && next != '$'
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(ch);
    }

    out
}

/// A `$NAME`, `${NAME}` or backslash-escaped reference found in a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reference<'a> {
    /// Matched text, including any leading backslash and braces.
    pub span: &'a str,
    pub name: &'a str,
    pub escaped: bool,
}

/// Expand the references found in `raw` inside `working`.
///
/// Each reference replaces the first occurrence of its matched text in the
/// working value, in the order the references appear in `raw`. Absent and
/// falsy values (`false`, `0`, empty) expand to nothing.
pub(crate) fn substitute(raw: &str, mut working: String, env: &Env) -> String {
    for reference in references(raw) {
        let replacement = if reference.escaped {
            reference.span[1..].to_owned()
        } else {
            env.get(reference.name)
                .filter(|value| value.is_truthy())
                .map(Value::to_string)
                .unwrap_or_default()
        };
        working = working.replacen(reference.span, &replacement, 1);
    }
    working
}

/// Non-overlapping references in `raw`, left to right.
pub(crate) fn references(raw: &str) -> Vec<Reference<'_>> {
    let mut found = Vec::new();
    let mut idx = 0usize;
    while idx < raw.len() {
        match match_reference(raw, idx) {
            Some(reference) => {
                idx += reference.span.len();
                found.push(reference);
            }
            None => idx += 1,
        }
    }
    found
}

fn match_reference(raw: &str, start: usize) -> Option<Reference<'_>> {
    let bytes = raw.as_bytes();
    let escaped = bytes[start] == b'\\';
    let dollar = if escaped { start + 1 } else { start };
    if bytes.get(dollar) != Some(&b'$') {
        return None;
    }

    let mut name_start = dollar + 1;
    if bytes.get(name_start) == Some(&b'{') {
        name_start += 1;
    }

    let name_len = bytes[name_start..]
        .iter()
        .take_while(|byte| is_name_byte(**byte))
        .count();
    if name_len == 0 {
        return None;
    }

    let name_end = name_start + name_len;
    let mut end = name_end;
    if bytes.get(end) == Some(&b'}') {
        end += 1;
    }

    Some(Reference {
        span: &raw[start..end],
        name: &raw[name_start..name_end],
        escaped,
    })
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_uppercase() || byte.is_ascii_digit() || byte == b'_'
}
