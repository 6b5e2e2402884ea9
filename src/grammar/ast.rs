//! Structured grammar model
//!
//! A [`Grammar`] maps production names to [`Production`]s in definition order. Each
//! production holds an ordered list of [`Alternative`]s, and each alternative is a
//! sequence of [`Symbol`]s.
//!
//! Every alternative keeps its canonical rendered text next to its symbols. The text is
//! what include/exclude patterns are matched against, so it is recomputed whenever the
//! symbols change and is never edited directly:
//!
//! - literals render quoted: `'DROP'`
//! - references and terminals render bare: `name`, `IDENT`
//! - groups render parenthesized with their modifier: `('B' | 'C')*`
//! - symbols are separated by a single space

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::error::GrammarError;

/// Repetition/optionality suffix on a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Modifier {
    None,
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Modifier {
    pub fn suffix(&self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Optional => "?",
            Modifier::ZeroOrMore => "*",
            Modifier::OneOrMore => "+",
        }
    }
}

/// A token in a production body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Symbol {
    /// Quoted terminal. Holds the text between the quotes exactly as written.
    Literal(String),
    /// Non-terminal, resolved against the owning grammar
    Reference(String),
    /// Bare upper-case token name with no production (e.g. `IDENT`)
    Terminal(String),
    /// Parenthesized alternation with an optional modifier
    Group {
        alternatives: Vec<Alternative>,
        modifier: Modifier,
    },
}

impl Symbol {
    pub fn literal(text: impl Into<String>) -> Self {
        Symbol::Literal(text.into())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Symbol::Reference(name.into())
    }

    pub fn group(alternatives: Vec<Alternative>, modifier: Modifier) -> Self {
        Symbol::Group {
            alternatives,
            modifier,
        }
    }

    /// The referenced production name, if this is a reference
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Symbol::Reference(name) => Some(name),
            _ => None,
        }
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Symbol::Literal(text) => {
                out.push('\'');
                out.push_str(text);
                out.push('\'');
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
                    out.push_str(alternative.text());
                }
                out.push(')');
                out.push_str(modifier.suffix());
            }
        }
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Symbol::Reference(name) => out.push(name),
            Symbol::Group { alternatives, .. } => {
                for alternative in alternatives {
                    alternative.collect_references(out);
                }
            }
            Symbol::Literal(_) | Symbol::Terminal(_) => {}
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render_into(&mut out);
        f.write_str(&out)
    }
}

/// One right-hand-side choice of a production.
///
/// Symbols are private so the rendered text cannot drift from them; use
/// [`Alternative::set_symbols`] to change the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alternative {
    symbols: Vec<Symbol>,
    #[serde(skip)]
    text: String,
}

impl Alternative {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let text = render_sequence(&symbols);
        Self { symbols, text }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }

    /// Canonical rendered form used for pattern matching
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn set_symbols(&mut self, symbols: Vec<Symbol>) {
        self.text = render_sequence(&symbols);
        self.symbols = symbols;
    }

    /// If the alternative is exactly one reference, its name
    pub fn sole_reference(&self) -> Option<&str> {
        match self.symbols.as_slice() {
            [symbol] => symbol.as_reference(),
            _ => None,
        }
    }

    /// Referenced production names in textual order, nested groups included
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        for symbol in &self.symbols {
            symbol.collect_references(out);
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn render_sequence(symbols: &[Symbol]) -> String {
    let mut out = String::new();
    for (i, symbol) in symbols.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        symbol.render_into(&mut out);
    }
    out
}

/// A named rule with its ordered alternatives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Production {
    name: String,
    pub alternatives: Vec<Alternative>,
}

impl Production {
    pub fn new(name: impl Into<String>, alternatives: Vec<Alternative>) -> Self {
        Self {
            name: name.into(),
            alternatives,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Referenced production names in textual order. May contain repeats.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for alternative in &self.alternatives {
            alternative.collect_references(&mut out);
        }
        out
    }

    pub fn references_name(&self, name: &str) -> bool {
        self.references().contains(&name)
    }
}

/// Productions keyed by name, kept in definition order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grammar {
    productions: Vec<Production>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a production. Names are unique; a second definition is rejected rather
    /// than merged or replaced.
    pub fn insert(&mut self, production: Production) -> Result<(), GrammarError> {
        if self.index.contains_key(production.name()) {
            return Err(GrammarError::DuplicateDefinition {
                name: production.name().to_string(),
                position: None,
            });
        }
        self.index
            .insert(production.name().to_string(), self.productions.len());
        self.productions.push(production);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Production> {
        self.index.get(name).map(|&i| &self.productions[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Remove a production, keeping the order of the others
    pub fn remove(&mut self, name: &str) -> Option<Production> {
        let position = self.index.remove(name)?;
        let production = self.productions.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(production)
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Mutable access to every production. Names stay fixed, only bodies can change.
    pub fn productions_mut(&mut self) -> impl Iterator<Item = &mut Production> {
        self.productions.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.productions.iter().map(|p| p.name())
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(symbols: Vec<Symbol>) -> Alternative {
        Alternative::new(symbols)
    }

    #[test]
    fn test_alternative_text_renders_canonically() {
        let alternative = seq(vec![
            Symbol::literal("DROP"),
            Symbol::Terminal("IDENT".into()),
            Symbol::group(
                vec![
                    seq(vec![Symbol::literal("B")]),
                    seq(vec![Symbol::reference("c")]),
                ],
                Modifier::ZeroOrMore,
            ),
        ]);
        assert_eq!(alternative.text(), "'DROP' IDENT ('B' | c)*");
    }

    #[test]
    fn test_set_symbols_refreshes_text() {
        let mut alternative = seq(vec![Symbol::literal("A")]);
        alternative.set_symbols(vec![Symbol::reference("b"), Symbol::literal("C")]);
        assert_eq!(alternative.text(), "b 'C'");
    }

    #[test]
    fn test_empty_alternative_renders_empty() {
        assert_eq!(Alternative::empty().text(), "");
        assert!(Alternative::empty().is_empty());
    }

    #[test]
    fn test_references_walk_nested_groups_in_order() {
        let production = Production::new(
            "stmt",
            vec![
                seq(vec![
                    Symbol::reference("a"),
                    Symbol::group(vec![seq(vec![Symbol::reference("b")])], Modifier::None),
                ]),
                seq(vec![Symbol::reference("c"), Symbol::reference("a")]),
            ],
        );
        assert_eq!(production.references(), vec!["a", "b", "c", "a"]);
    }

    #[test]
    fn test_grammar_rejects_duplicates() {
        let mut grammar = Grammar::new();
        grammar
            .insert(Production::new("a", vec![Alternative::empty()]))
            .unwrap();
        let err = grammar
            .insert(Production::new("a", vec![Alternative::empty()]))
            .unwrap_err();
        assert!(matches!(err, GrammarError::DuplicateDefinition { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_remove_keeps_order_and_index() {
        let mut grammar = Grammar::new();
        for name in ["a", "b", "c"] {
            grammar
                .insert(Production::new(name, vec![Alternative::empty()]))
                .unwrap();
        }
        assert!(grammar.remove("b").is_some());
        assert_eq!(grammar.names().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(grammar.get("c").map(|p| p.name()), Some("c"));
        assert!(grammar.remove("b").is_none());
    }
}
