use std::collections::BTreeSet;
use std::io::BufRead;

use crate::error::{Error, ParseError, ParseErrorKind};
use crate::grammar::{self, Assignment, Line};
use crate::model::{Env, ParseOptions, Value};
use crate::resolve::resolve_value;

/// Parse dotenv text into a fresh mapping with default options.
pub fn parse_str(input: &str) -> Result<Env, Error> {
    parse_str_with_options(input, ParseOptions::default())
}

/// Parse dotenv text into a fresh mapping.
pub fn parse_str_with_options(input: &str, options: ParseOptions) -> Result<Env, Error> {
    let mut parser = Parser::new(options);
    parser.parse(input)?;
    Ok(parser.into_env())
}

/// Parse dotenv entries from UTF-8 bytes.
pub fn parse_bytes(input: &[u8], options: ParseOptions) -> Result<Env, Error> {
    let text = std::str::from_utf8(input)?;
    parse_str_with_options(text, options)
}

/// Parse dotenv entries from a buffered reader.
pub fn parse_reader<R: BufRead>(mut reader: R, options: ParseOptions) -> Result<Env, Error> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    parse_bytes(&buf, options)
}

/// Line-by-line dotenv parser that owns its variable mapping.
///
/// Every accepted line is written into the mapping before the next line is
/// resolved, so `$VAR` references see earlier lines and any seeded values,
/// but not later lines. Repeated calls to [`Parser::parse`] keep
/// accumulating into the same mapping.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    env: Env,
    options: ParseOptions,
    assignments: usize,
    assigned_keys: BTreeSet<String>,
}

/// A resolved assignment on its way into the mapping.
#[derive(Debug)]
struct Node<'a> {
    key: &'a str,
    value: Value,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self::with_env(Env::new(), options)
    }

    /// Build a parser whose mapping starts out as `env`.
    ///
    /// Parsed keys overwrite seeded ones.
    pub fn with_env(env: Env, options: ParseOptions) -> Self {
        Self {
            env,
            options,
            assignments: 0,
            assigned_keys: BTreeSet::new(),
        }
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    pub fn into_env(self) -> Env {
        self.env
    }

    /// Number of assignment lines accepted so far.
    pub fn assignments(&self) -> usize {
        self.assignments
    }

    /// Keys written by parsed lines, as opposed to seeded or injected ones.
    pub fn assigned_keys(&self) -> &BTreeSet<String> {
        &self.assigned_keys
    }

    /// Parse `input` into the mapping and return it.
    ///
    /// Stops at the first line that is neither blank, a comment, nor a valid
    /// assignment. Lines before it have already been applied.
    pub fn parse(&mut self, input: &str) -> Result<&mut Env, ParseError> {
        for (line_num, line) in grammar::lines(input) {
            if let Some(node) = self.parse_line(line_num, line)? {
                self.accumulate(node);
            }
        }

        Ok(&mut self.env)
    }

    fn parse_line<'a>(&self, line_num: u32, line: &'a str) -> Result<Option<Node<'a>>, ParseError> {
        match grammar::classify(line) {
            Line::Blank => Ok(None),
            Line::Invalid => Err(ParseError::new(
                line_num,
                line,
                ParseErrorKind::InvalidLineSyntax,
            )),
            Line::Assignment(Assignment { key, raw }) => Ok(Some(Node {
                key,
                value: resolve_value(raw, &self.options, &self.env),
            })),
        }
    }

    fn accumulate(&mut self, node: Node<'_>) {
        if !self.assigned_keys.contains(node.key) {
            self.assigned_keys.insert(node.key.to_owned());
        }
        self.env.insert(node.key.to_owned(), node.value);
        self.assignments += 1;
    }
}
