//! # sqldiagram
//!
//! Turns a yacc SQL grammar into per-statement railroad diagrams.
//!
//! The bison source is reduced to EBNF ([`source`]), parsed into a [`grammar::Grammar`],
//! and transformed per statement ([`transform`]): helper productions are inlined,
//! alternatives filtered, and only what the statement can reach is kept. The
//! [`pipeline`] runs one such job per statement spec and hands the results to a
//! [`render::Renderer`].

pub mod config;
pub mod grammar;
pub mod pipeline;
pub mod render;
pub mod source;
pub mod transform;

pub use grammar::{parse, Grammar, GrammarError};
