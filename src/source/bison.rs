//! yacc/bison rules to EBNF
//!
//! Only the rules section (between the first two `%%` lines) is kept. Within it:
//!
//! - comments and `{ ... }` action blocks are dropped, mid-rule actions included
//! - `%prec TOKEN` and `%empty` are dropped
//! - `"..."` string aliases become single-quoted literals
//! - upper-case token names become quoted keywords (`ALTER` -> `'ALTER'`), except the
//!   lexical tokens listed in `bare_tokens` (`IDENT`, `SCONST`, ...), which stay bare
//! - a rule that omits its `;` gets one
//!
//! The result is parsed and re-serialized so the output is canonical EBNF.

use once_cell::sync::Lazy;
use regex::Regex;

use super::SourceError;
use crate::grammar::tokens::{tokenize_with_spans, Token};
use crate::grammar::{parse, GrammarError};

static KEYWORD_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap());

/// Convert a yacc grammar into EBNF text
pub fn to_ebnf<S: AsRef<str>>(source: &str, bare_tokens: &[S]) -> Result<String, SourceError> {
    let rules = rules_section(source).ok_or(SourceError::MissingRules)?;
    let bare: Vec<&str> = bare_tokens.iter().map(|s| s.as_ref()).collect();
    let stripped = strip_rules(rules, &bare);
    let terminated = terminate_rules(&stripped)?;
    let grammar = parse(&terminated)?;
    tracing::info!(productions = grammar.len(), "extracted EBNF from yacc source");
    Ok(grammar.to_ebnf())
}

/// Text between the first and second `%%` lines (or the end of input)
fn rules_section(source: &str) -> Option<&str> {
    let mut offset = 0;
    let mut start = None;
    for line in source.split_inclusive('\n') {
        if line.trim() == "%%" {
            match start {
                None => start = Some(offset + line.len()),
                Some(begin) => return Some(&source[begin..offset]),
            }
        }
        offset += line.len();
    }
    start.map(|begin| &source[begin..])
}

fn strip_rules(rules: &str, bare_tokens: &[&str]) -> String {
    let chars: Vec<char> = rules.chars().collect();
    let mut out = String::with_capacity(rules.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '/' if next == Some('*') => {
                i = skip_block_comment(&chars, i);
                out.push(' ');
            }
            '/' if next == Some('/') => i = skip_line_comment(&chars, i),
            '{' => {
                i = skip_action(&chars, i);
                out.push(' ');
            }
            '\'' => {
                let end = skip_quoted(&chars, i, '\'');
                out.extend(&chars[i..end]);
                i = end;
            }
            '"' => {
                let end = skip_quoted(&chars, i, '"');
                let inner_end = if end > i + 1 && chars[end - 1] == '"' {
                    end - 1
                } else {
                    end
                };
                out.push('\'');
                for &ch in &chars[i + 1..inner_end] {
                    if ch == '\'' {
                        out.push('\\');
                    }
                    out.push(ch);
                }
                out.push('\'');
                i = end;
            }
            '%' => {
                let (directive, end) = read_ident(&chars, i + 1);
                i = end;
                if directive == "prec" {
                    // Skip the precedence token that follows
                    while i < chars.len() && chars[i].is_whitespace() {
                        i += 1;
                    }
                    i = match chars.get(i) {
                        Some('\'') => skip_quoted(&chars, i, '\''),
                        _ => read_ident(&chars, i).1,
                    };
                }
                out.push(' ');
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let (ident, end) = read_ident(&chars, i);
                if KEYWORD_TOKEN.is_match(&ident) && !bare_tokens.contains(&ident.as_str()) {
                    out.push('\'');
                    out.push_str(&ident);
                    out.push('\'');
                } else {
                    out.push_str(&ident);
                }
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

/// Index just past the closing quote, honouring backslash escapes
fn skip_quoted(chars: &[char], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '\n' => return i,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

fn skip_block_comment(chars: &[char], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return i + 2;
        }
        i += 1;
    }
    chars.len()
}

fn skip_line_comment(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i] != '\n' {
        i += 1;
    }
    i
}

/// Index just past the brace closing the action opened at `start`
fn skip_action(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '{' => {
                depth += 1;
                i += 1;
            }
            '}' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return i;
                }
            }
            '"' | '\'' | '`' => i = skip_quoted(chars, i, chars[i]),
            '/' if chars.get(i + 1) == Some(&'*') => i = skip_block_comment(chars, i),
            '/' if chars.get(i + 1) == Some(&'/') => i = skip_line_comment(chars, i),
            _ => i += 1,
        }
    }
    chars.len()
}

/// Insert `;` where a new rule starts before the previous one was closed
fn terminate_rules(text: &str) -> Result<String, GrammarError> {
    let tokens = tokenize_with_spans(text).map_err(|e| {
        GrammarError::syntax(
            text,
            e.span.start,
            format!("unexpected '{}' in grammar rules", &text[e.span.clone()]),
        )
    })?;

    let mut out = String::with_capacity(text.len() + 16);
    let mut copied = 0;
    let mut in_rule = false;
    for (i, (token, span)) in tokens.iter().enumerate() {
        match token {
            Token::Ident if in_rule && tokens.get(i + 1).map(|t| t.0) == Some(Token::Define) => {
                out.push_str(&text[copied..span.start]);
                out.push_str(";\n");
                copied = span.start;
            }
            Token::Define => in_rule = true,
            Token::Semicolon => in_rule = false,
            _ => {}
        }
    }
    out.push_str(&text[copied..]);
    if in_rule {
        out.push_str("\n;\n");
    }
    Ok(out)
}
