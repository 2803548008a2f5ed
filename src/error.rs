use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid UTF-8 input: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
}

/// A line that is neither blank, a comment, nor a valid assignment.
///
/// Parsing stops at the first such line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("envc: Invalid line: {text}")]
pub struct ParseError {
    /// 1-based line number within the document.
    pub line: u32,
    /// The offending line, exactly as it appeared.
    pub text: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: u32, text: &str, kind: ParseErrorKind) -> Self {
        Self {
            line,
            text: text.to_owned(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid line syntax")]
    InvalidLineSyntax,
}
