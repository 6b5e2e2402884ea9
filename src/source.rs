//! Grammar source acquisition
//!
//! Fetches the yacc grammar from a local path or URL and reduces it to the EBNF text
//! the rest of the crate works on.

pub mod bison;
pub mod fetch;

pub use bison::to_ebnf;
pub use fetch::fetch;

use crate::grammar::GrammarError;
use std::fmt;

#[derive(Debug)]
pub enum SourceError {
    Io { location: String, message: String },
    Http { location: String, message: String },
    Status { location: String, status: u16 },
    NotUtf8 { location: String },
    /// The yacc file has no `%%` rules section
    MissingRules,
    /// The extracted rules do not form a valid grammar
    Grammar(GrammarError),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io { location, message } => {
                write!(f, "Cannot read '{}': {}", location, message)
            }
            SourceError::Http { location, message } => {
                write!(f, "Cannot fetch '{}': {}", location, message)
            }
            SourceError::Status { location, status } => {
                write!(f, "Fetching '{}' returned HTTP {}", location, status)
            }
            SourceError::NotUtf8 { location } => write!(f, "'{}' is not UTF-8 text", location),
            SourceError::MissingRules => write!(f, "No '%%' rules section in grammar source"),
            SourceError::Grammar(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<GrammarError> for SourceError {
    fn from(err: GrammarError) -> Self {
        SourceError::Grammar(err)
    }
}
