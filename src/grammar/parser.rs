//! EBNF grammar parser
//!
//! Grammar text is a sequence of rules:
//!
//! ```text
//! name: alt1 | alt2 | ... ;
//! ```
//!
//! where an alternative is a whitespace separated run of `'literals'`, bare
//! identifiers and parenthesized groups, each optionally followed by `?`, `*` or `+`.
//! `::=` is accepted in place of `:`. An alternative may be empty.
//!
//! The body of a rule is read in a single left-to-right pass. Open groups live on an
//! explicit stack of frames, so nesting depth is bounded only by memory.
//!
//! Bare identifiers must name a production somewhere in the text. The one exception is
//! upper-case token names such as `IDENT` or `SCONST`: when nothing defines them they
//! become [`Symbol::Terminal`]s instead of dangling references.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

use super::ast::{Alternative, Grammar, Modifier, Production, Symbol};
use super::error::{GrammarError, Position};
use super::tokens::{tokenize_with_spans, Token};

/// Shape of a lexer token name that may stay undefined
static TERMINAL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap());

/// Parse grammar text into a [`Grammar`], preserving definition order
pub fn parse(source: &str) -> Result<Grammar, GrammarError> {
    let tokens = tokenize_with_spans(source).map_err(|e| {
        let found = &source[e.span.clone()];
        GrammarError::syntax(source, e.span.start, format!("unexpected '{}'", found))
    })?;
    Parser::new(source, tokens).parse()
}

/// Rule heads are the only place an identifier is directly followed by a definition
/// marker, which lets references be resolved while the bodies are read.
fn defined_names<'a>(source: &'a str, tokens: &[(Token, Range<usize>)]) -> HashSet<&'a str> {
    tokens
        .windows(2)
        .filter(|pair| pair[0].0 == Token::Ident && pair[1].0 == Token::Define)
        .map(|pair| &source[pair[0].1.clone()])
        .collect()
}

/// One level of grouping: finished alternatives plus the sequence being read
struct Frame {
    alternatives: Vec<Alternative>,
    current: Vec<Symbol>,
    opened_at: usize,
}

impl Frame {
    fn new(opened_at: usize) -> Self {
        Self {
            alternatives: Vec::new(),
            current: Vec::new(),
            opened_at,
        }
    }

    fn close_alternative(&mut self) {
        let symbols = std::mem::take(&mut self.current);
        self.alternatives.push(Alternative::new(symbols));
    }

    fn finish(mut self) -> Vec<Alternative> {
        self.close_alternative();
        self.alternatives
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(Token, Range<usize>)>,
    defined: HashSet<&'a str>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: Vec<(Token, Range<usize>)>) -> Self {
        let defined = defined_names(source, &tokens);
        Self {
            source,
            tokens,
            defined,
            pos: 0,
        }
    }

    fn next(&mut self) -> Option<(Token, Range<usize>)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn slice(&self, span: &Range<usize>) -> &'a str {
        &self.source[span.clone()]
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> GrammarError {
        GrammarError::syntax(self.source, offset, message)
    }

    fn parse(mut self) -> Result<Grammar, GrammarError> {
        let mut grammar = Grammar::new();

        while let Some((token, span)) = self.next() {
            if token != Token::Ident {
                return Err(self.error(
                    span.start,
                    format!("expected a production name, found '{}'", self.slice(&span)),
                ));
            }
            let name = self.slice(&span);
            match self.next() {
                Some((Token::Define, _)) => {}
                Some((_, other)) => {
                    return Err(self.error(
                        other.start,
                        format!("expected ':' after production name '{}'", name),
                    ))
                }
                None => {
                    return Err(self.error(
                        self.source.len(),
                        format!("expected ':' after production name '{}'", name),
                    ))
                }
            }

            let alternatives = self.parse_body(name, span.start)?;
            if grammar.contains(name) {
                return Err(GrammarError::DuplicateDefinition {
                    name: name.to_string(),
                    position: Some(Position::from_offset(self.source, span.start)),
                });
            }
            grammar.insert(Production::new(name, alternatives))?;
        }

        Ok(grammar)
    }

    /// Read alternatives up to and including the terminating `;`
    fn parse_body(&mut self, name: &str, rule_start: usize) -> Result<Vec<Alternative>, GrammarError> {
        let mut stack: Vec<Frame> = Vec::new();
        let mut top = Frame::new(rule_start);

        loop {
            let Some((token, span)) = self.next() else {
                if stack.is_empty() {
                    return Err(self.error(
                        rule_start,
                        format!("rule '{}' is missing its terminating ';'", name),
                    ));
                }
                return Err(self.error(top.opened_at, "unterminated group"));
            };

            match token {
                Token::Ident => {
                    if self.peek() == Some(Token::Define) {
                        return Err(self.error(
                            rule_start,
                            format!("rule '{}' is missing its terminating ';'", name),
                        ));
                    }
                    let symbol = self.resolve(&span)?;
                    top.current.push(symbol);
                }
                Token::Literal => {
                    let text = self.slice(&span);
                    top.current.push(Symbol::literal(&text[1..text.len() - 1]));
                }
                Token::UnterminatedLiteral => {
                    return Err(self.error(span.start, "unterminated literal"));
                }
                Token::Pipe => top.close_alternative(),
                Token::OpenParen => {
                    let parent = std::mem::replace(&mut top, Frame::new(span.start));
                    stack.push(parent);
                }
                Token::CloseParen => {
                    let Some(parent) = stack.pop() else {
                        return Err(self.error(span.start, "unbalanced ')'"));
                    };
                    let group = std::mem::replace(&mut top, parent);
                    top.current.push(Symbol::group(group.finish(), Modifier::None));
                }
                Token::Question | Token::Star | Token::Plus => {
                    let modifier = match token {
                        Token::Question => Modifier::Optional,
                        Token::Star => Modifier::ZeroOrMore,
                        _ => Modifier::OneOrMore,
                    };
                    let Some(last) = top.current.pop() else {
                        return Err(self.error(
                            span.start,
                            format!("'{}' has nothing to apply to", self.slice(&span)),
                        ));
                    };
                    top.current.push(apply_modifier(last, modifier));
                }
                Token::Semicolon => {
                    if !stack.is_empty() {
                        return Err(self.error(top.opened_at, "unterminated group"));
                    }
                    return Ok(top.finish());
                }
                Token::Define => {
                    return Err(self.error(span.start, "unexpected definition marker"));
                }
            }
        }
    }

    fn resolve(&self, span: &Range<usize>) -> Result<Symbol, GrammarError> {
        let ident = self.slice(span);
        if self.defined.contains(ident) {
            Ok(Symbol::reference(ident))
        } else if TERMINAL_NAME.is_match(ident) {
            Ok(Symbol::Terminal(ident.to_string()))
        } else {
            Err(self.error(
                span.start,
                format!("reference to undefined production '{}'", ident),
            ))
        }
    }
}

/// Attach a modifier to the preceding symbol. Bare symbols become one-element groups
/// so every modifier lives on a group.
fn apply_modifier(symbol: Symbol, modifier: Modifier) -> Symbol {
    match symbol {
        Symbol::Group {
            alternatives,
            modifier: Modifier::None,
        } => Symbol::group(alternatives, modifier),
        other => Symbol::group(vec![Alternative::new(vec![other])], modifier),
    }
}
