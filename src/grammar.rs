//! Grammar model, parser and serializer
//!
//! Text flows `parse` -> [`Grammar`] -> [`Grammar::to_ebnf`], and the serialized form
//! parses back into an equal grammar.

pub mod ast;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokens;

pub use ast::{Alternative, Grammar, Modifier, Production, Symbol};
pub use error::{GrammarError, Position};
pub use parser::parse;
