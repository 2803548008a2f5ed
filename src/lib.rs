//! Parse `.env` documents into typed variable mappings.
//!
//! Each line is an assignment (`KEY=value`, `KEY: value`, optionally prefixed
//! by `export`), a comment, or blank. Values may be single-quoted (taken
//! literally), double-quoted or bare (backslash escapes and `$VAR` / `${VAR}`
//! expansion against earlier lines), and can optionally be coerced to
//! booleans or numbers.
//!
//! [`Parser`] owns the mapping it fills, so a caller can seed it and read it
//! back. [`EnvLoader`] reads files, and the `unsafe` convenience loaders
//! (`dotenv`, `from_path`, `from_paths`) also write into the process
//! environment, so callers must guarantee no concurrent environment access.

pub mod env;
mod error;
mod grammar;
mod loader;
mod model;
mod parser;
mod resolve;

pub use error::{Error, ParseError, ParseErrorKind};
pub use loader::{EnvLoader, dotenv, from_path, from_paths};
pub use model::{Env, LoadReport, ParseOptions, SubstitutionMode, Value, to_dotenv_string};
pub use parser::{Parser, parse_bytes, parse_reader, parse_str, parse_str_with_options};
