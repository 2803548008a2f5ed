//! Line splitting and the single-line assignment grammar.
//!
//! ```text
//! line       = [ "export" ws+ ] key separator [ value ] [ ws* "#" any* ]
//! key        = ( ascii-word | "." )+
//! separator  = ws* "=" ws* | ":" ws
//! value      = "'" ( "\'" | not-' )* "'" | '"' ( '\"' | not-" )* '"' | ( not-# )+
//! ```
//!
//! Blank lines and full-line comments are ignored before the grammar is tried.
//! A quote-led value that cannot be read as a quoted span is read as an
//! unquoted run, as long as the opening quote appears again later on the line.

/// Outcome of classifying a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    /// Whitespace only, or a full-line comment.
    Blank,
    Assignment(Assignment<'a>),
    Invalid,
}

/// A line accepted by the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Assignment<'a> {
    pub key: &'a str,
    /// Value text as written, outer quotes included. Empty when absent.
    pub raw: &'a str,
}

/// Split a document on `\n` only, numbering lines from 1.
///
/// `\r` stays attached to its line.
pub(crate) fn lines(input: &str) -> impl Iterator<Item = (u32, &str)> {
    input
        .split('\n')
        .enumerate()
        .map(|(idx, line)| (idx as u32 + 1, line))
}

pub(crate) fn classify(line: &str) -> Line<'_> {
    if is_ignorable(line) {
        return Line::Blank;
    }

    // `export = 1` assigns to a key named `export`, so the prefix is only
    // taken when the remainder still matches.
    if let Some(rest) = split_export(line)
        && let Some(assignment) = match_assignment(rest)
    {
        return Line::Assignment(assignment);
    }

    match match_assignment(line) {
        Some(assignment) => Line::Assignment(assignment),
        None => Line::Invalid,
    }
}

pub(crate) fn is_ignorable(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn split_export(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("export")?;
    let trimmed = rest.trim_start();
    (trimmed.len() < rest.len()).then_some(trimmed)
}

fn match_assignment(input: &str) -> Option<Assignment<'_>> {
    let key_end = scan_key(input)?;
    let (key, rest) = input.split_at(key_end);
    let value_input = scan_separator(rest)?;
    let raw = scan_value(value_input)?;
    Some(Assignment { key, raw })
}

/// Length of the leading key, if there is one.
fn scan_key(input: &str) -> Option<usize> {
    let end = input
        .find(|ch: char| !is_key_char(ch))
        .unwrap_or(input.len());
    (end > 0).then_some(end)
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

/// Consume the separator and return the text where the value starts.
///
/// The colon form takes exactly one whitespace character; any further
/// whitespace belongs to the value.
fn scan_separator(input: &str) -> Option<&str> {
    if let Some(rest) = input.strip_prefix(':') {
        let ws = rest.chars().next().filter(|ch| ch.is_whitespace())?;
        return Some(&rest[ws.len_utf8()..]);
    }

    let rest = input.trim_start().strip_prefix('=')?;
    Some(rest.trim_start())
}

/// Return the raw value text, or `None` if the rest of the line is malformed.
fn scan_value(input: &str) -> Option<&str> {
    match input.chars().next() {
        None | Some('#') => Some(""),
        Some(quote @ ('\'' | '"')) => scan_quoted(input, quote as u8).or_else(|| {
            // An opening quote that never appears again is unterminated.
            input[1..].contains(quote).then(|| scan_unquoted(input))
        }),
        Some(_) => Some(scan_unquoted(input)),
    }
}

/// Everything up to the first `#`, trailing whitespace included.
fn scan_unquoted(input: &str) -> &str {
    let end = input.find('#').unwrap_or(input.len());
    &input[..end]
}

/// Match a quoted span starting at `input[0]`.
///
/// Every quote inside the span must be backslash-escaped. The longest span
/// followed by a valid tail wins; an escaped quote may also close the span
/// when nothing longer fits.
fn scan_quoted(input: &str, quote: u8) -> Option<&str> {
    let bytes = input.as_bytes();
    let mut closings = Vec::new();
    for idx in 1..bytes.len() {
        if bytes[idx] != quote {
            continue;
        }
        closings.push(idx);
        if bytes[idx - 1] != b'\\' {
            break;
        }
    }

    closings
        .into_iter()
        .rev()
        .find(|&end| is_comment_tail(&input[end + 1..]))
        .map(|end| &input[..=end])
}

/// Whitespace, optionally followed by a `#` comment.
fn is_comment_tail(input: &str) -> bool {
    let rest = input.trim_start();
    rest.is_empty() || rest.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(line: &str) -> (&str, &str) {
        match classify(line) {
            Line::Assignment(Assignment { key, raw }) => (key, raw),
            other => panic!("expected assignment for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn ignores_blank_and_comment_lines() {
        for line in ["", "   ", "\t", "\r", "# comment", "   # indented", "#"] {
            assert_eq!(classify(line), Line::Blank, "line {line:?}");
        }
    }

    #[test]
    fn accepts_equals_and_colon_separators() {
        assert_eq!(assignment("A=1"), ("A", "1"));
        assert_eq!(assignment("A = 1"), ("A", "1"));
        assert_eq!(assignment("A   =1"), ("A", "1"));
        assert_eq!(assignment("A: 1"), ("A", "1"));
        assert_eq!(assignment("A:\t1"), ("A", "1"));
    }

    #[test]
    fn colon_separator_takes_one_whitespace_character() {
        assert_eq!(assignment("A:  x"), ("A", " x"));
        assert_eq!(assignment("A:\t  1"), ("A", "  1"));
        assert_eq!(assignment("A:  \"x\""), ("A", " \"x\""));
        assert_eq!(assignment("A:  # note"), ("A", " "));
    }

    #[test]
    fn colon_separator_requires_whitespace() {
        assert_eq!(classify("A:1"), Line::Invalid);
        assert_eq!(classify("A :1"), Line::Invalid);
        assert_eq!(classify("A : 1"), Line::Invalid);
    }

    #[test]
    fn keys_allow_word_characters_and_dots() {
        assert_eq!(assignment("app.port_2=8080"), ("app.port_2", "8080"));
        assert_eq!(classify("BAD-KEY=1"), Line::Invalid);
        assert_eq!(classify("BAD KEY=1"), Line::Invalid);
        assert_eq!(classify("=1"), Line::Invalid);
    }

    #[test]
    fn leading_whitespace_before_key_is_rejected() {
        assert_eq!(classify("  A=1"), Line::Invalid);
    }

    #[test]
    fn export_prefix_is_stripped() {
        assert_eq!(assignment("export A=1"), ("A", "1"));
        assert_eq!(assignment("export   A: 1"), ("A", "1"));
        assert_eq!(assignment("exportA=1"), ("exportA", "1"));
        assert_eq!(assignment("export = 1"), ("export", "1"));
        assert_eq!(assignment("export=1"), ("export", "1"));
        assert_eq!(classify("export A"), Line::Invalid);
    }

    #[test]
    fn missing_value_is_empty() {
        assert_eq!(assignment("A="), ("A", ""));
        assert_eq!(assignment("A=   "), ("A", ""));
        assert_eq!(assignment("A= # note"), ("A", ""));
        assert_eq!(assignment("A=#note"), ("A", ""));
        assert_eq!(assignment("A: "), ("A", ""));
        assert_eq!(assignment("A: # note"), ("A", ""));
    }

    #[test]
    fn unquoted_values_keep_trailing_whitespace() {
        assert_eq!(assignment("A=hello world  "), ("A", "hello world  "));
        assert_eq!(assignment("A=hello # note"), ("A", "hello "));
        assert_eq!(assignment("A=b\r"), ("A", "b\r"));
    }

    #[test]
    fn quoted_values_keep_their_quotes() {
        assert_eq!(assignment("A='raw value'"), ("A", "'raw value'"));
        assert_eq!(assignment("A=\"x # y\" # note"), ("A", "\"x # y\""));
        assert_eq!(assignment("A=\"quoted\"\r"), ("A", "\"quoted\""));
        assert_eq!(assignment("A=''"), ("A", "''"));
    }

    #[test]
    fn quoted_values_accept_escaped_quotes() {
        assert_eq!(assignment(r#"A="say \"hi\"""#), ("A", r#""say \"hi\"""#));
        assert_eq!(assignment(r"A='it\'s'"), ("A", r"'it\'s'"));
    }

    #[test]
    fn escaped_quote_closes_span_when_nothing_longer_fits() {
        assert_eq!(assignment(r#"A="a\" # note"#), ("A", r#""a\""#));
    }

    #[test]
    fn unterminated_quotes_are_invalid() {
        assert_eq!(classify("A=\"open"), Line::Invalid);
        assert_eq!(classify("A='open"), Line::Invalid);
        assert_eq!(classify("A='open # it is"), Line::Invalid);
    }

    #[test]
    fn closed_quotes_with_trailing_text_read_as_unquoted() {
        assert_eq!(assignment("A='it's'"), ("A", "'it's'"));
        assert_eq!(assignment("A=\"a\"b"), ("A", "\"a\"b"));
        assert_eq!(assignment("A='a' 'b'"), ("A", "'a' 'b'"));
        assert_eq!(assignment("A=\"a # b\"c"), ("A", "\"a "));
    }

    #[test]
    fn lines_split_on_newline_only() {
        let collected: Vec<_> = lines("A=1\r\nB=2\n").collect();
        assert_eq!(collected, vec![(1, "A=1\r"), (2, "B=2"), (3, "")]);
    }
}
