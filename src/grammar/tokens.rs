//! Token definitions for EBNF grammar text
//!
//! Tokenization is handled entirely by logos. Whitespace and comments never reach the
//! parser; they are skipped here.
use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip(r"[ \t\r\n\f]+|//[^\n]*|/\*([^*]|\*+[^*/])*\*+/", allow_greedy = true))]
pub enum Token {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // Quoted terminal, backslash escapes allowed
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Literal,

    // A quote that never closes on its line
    #[regex(r"'([^'\\\n]|\\.)*")]
    UnterminatedLiteral,

    // yacc style `name:` and W3C style `name ::=`
    #[token(":")]
    #[token("::=")]
    Define,

    #[token("|")]
    Pipe,
    #[token(";")]
    Semicolon,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,

    #[token("?")]
    Question,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
}

/// A token that logos could not match, with its span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub span: Range<usize>,
}

/// Tokenize a string, keeping spans. Stops at the first unrecognized input.
pub fn tokenize_with_spans(source: &str) -> Result<Vec<(Token, Range<usize>)>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(LexError { span: lexer.span() }),
        }
    }

    Ok(tokens)
}
