//! Grammar serialization
//!
//! Two notations are produced:
//!
//! - the native one, read back by [`parse`](super::parse):
//!
//!   ```text
//!   drop_stmt:
//!       'DROP' 'TABLE' name
//!     | 'DROP' 'INDEX' name
//!     ;
//!   ```
//!
//! - the W3C `name ::= ...` notation understood by the railroad diagram generator.
//!   It has no escapes, so literals are unescaped and a literal holding `'` is
//!   written in double quotes.
//!
//! Productions are written in grammar order, separated by a blank line.

use std::fmt::{self, Write};

use super::ast::{Alternative, Grammar, Production, Symbol};

/// Placeholder for an empty first alternative. The lexer skips it as a comment.
const EMPTY_MARKER: &str = "/* EMPTY */";

fn write_production(out: &mut String, production: &Production) -> fmt::Result {
    writeln!(out, "{}:", production.name())?;
    for (i, alternative) in production.alternatives.iter().enumerate() {
        match (i, alternative.is_empty()) {
            (0, true) => writeln!(out, "    {}", EMPTY_MARKER)?,
            (0, false) => writeln!(out, "    {}", alternative.text())?,
            (_, true) => writeln!(out, "  |")?,
            (_, false) => writeln!(out, "  | {}", alternative.text())?,
        }
    }
    writeln!(out, "  ;")
}

fn write_production_w3c(out: &mut String, production: &Production) -> fmt::Result {
    write!(out, "{} ::=", production.name())?;
    for (i, alternative) in production.alternatives.iter().enumerate() {
        if i > 0 {
            write!(out, "\n  |")?;
        }
        if !alternative.is_empty() {
            out.push(' ');
            write_sequence_w3c(out, alternative);
        }
    }
    writeln!(out)
}

fn write_sequence_w3c(out: &mut String, alternative: &Alternative) {
    for (i, symbol) in alternative.symbols().iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_symbol_w3c(out, symbol);
    }
}

fn write_symbol_w3c(out: &mut String, symbol: &Symbol) {
    match symbol {
        Symbol::Literal(text) => {
            let mut literal = String::with_capacity(text.len());
            let mut chars = text.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => literal.extend(chars.next()),
                    _ => literal.push(c),
                }
            }
            let quote = if literal.contains('\'') { '"' } else { '\'' };
            out.push(quote);
            out.push_str(&literal);
            out.push(quote);
        }
        Symbol::Reference(name) | Symbol::Terminal(name) => out.push_str(name),
        Symbol::Group {
            alternatives,
            modifier,
        } => {
            out.push('(');
            for (i, alternative) in alternatives.iter().enumerate() {
                if i > 0 {
                    out.push_str(" | ");
                }
                write_sequence_w3c(out, alternative);
            }
            out.push(')');
            out.push_str(modifier.suffix());
        }
    }
}

impl Production {
    pub fn to_ebnf(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = write_production(&mut out, self);
        out
    }
}

impl Grammar {
    /// Render in the native notation
    pub fn to_ebnf(&self) -> String {
        let mut out = String::new();
        for (i, production) in self.productions().iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = write_production(&mut out, production);
        }
        out
    }

    /// Render in W3C notation for the railroad diagram generator
    pub fn to_w3c(&self) -> String {
        let mut out = String::new();
        for (i, production) in self.productions().iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = write_production_w3c(&mut out, production);
        }
        out
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ebnf())
    }
}
