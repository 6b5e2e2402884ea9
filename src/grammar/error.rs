//! Errors raised while parsing and transforming grammars
//!
//! Every variant is derived from the input alone. None of them is transient, so callers
//! never retry: a failure means the grammar or the statement list needs fixing.

use std::fmt;

/// 1-based line/column of a token in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Compute the position of a byte offset
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let before = &source[..offset.min(source.len())];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// Malformed grammar text
    Syntax { position: Position, message: String },
    DuplicateDefinition {
        name: String,
        position: Option<Position>,
    },
    /// A production that was asked for, or referenced, does not exist
    UndefinedProduction {
        name: String,
        referenced_from: Option<String>,
    },
    /// The inline set cannot be ordered; `names` is the offending cycle
    CyclicInline { names: Vec<String> },
    /// Descend requires exactly one alternative to survive filtering
    AmbiguousDescend { name: String, remaining: usize },
    /// Filtering removed every alternative of `name`
    NoMatch { name: String },
}

impl GrammarError {
    /// Taxonomy name reported to users
    pub fn kind(&self) -> &'static str {
        match self {
            GrammarError::Syntax { .. } => "SyntaxError",
            GrammarError::DuplicateDefinition { .. } => "DuplicateDefinitionError",
            GrammarError::UndefinedProduction { .. } => "UndefinedProductionError",
            GrammarError::CyclicInline { .. } => "CyclicInlineError",
            GrammarError::AmbiguousDescend { .. } => "AmbiguousDescendError",
            GrammarError::NoMatch { .. } => "NoMatchError",
        }
    }

    pub(crate) fn syntax(source: &str, offset: usize, message: impl Into<String>) -> Self {
        GrammarError::Syntax {
            position: Position::from_offset(source, offset),
            message: message.into(),
        }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.kind())?;
        match self {
            GrammarError::Syntax { position, message } => write!(f, "{} at {}", message, position),
            GrammarError::DuplicateDefinition { name, position } => match position {
                Some(position) => write!(f, "production '{}' redefined at {}", name, position),
                None => write!(f, "production '{}' is already defined", name),
            },
            GrammarError::UndefinedProduction {
                name,
                referenced_from,
            } => match referenced_from {
                Some(from) => write!(f, "'{}' (referenced from '{}') is not defined", name, from),
                None => write!(f, "'{}' is not defined", name),
            },
            GrammarError::CyclicInline { names } => {
                write!(f, "cannot inline recursive productions: {}", names.join(" -> "))
            }
            GrammarError::AmbiguousDescend { name, remaining } => write!(
                f,
                "cannot descend into '{}': {} alternatives remain after filtering",
                name, remaining
            ),
            GrammarError::NoMatch { name } => {
                write!(f, "filters removed every alternative of '{}'", name)
            }
        }
    }
}

impl std::error::Error for GrammarError {}
