//! Production inlining
//!
//! Inlining `name` replaces every `Reference(name)` in the rest of the grammar with the
//! body of `name` and then deletes its definition:
//!
//! - a single-alternative body is spliced in place, without parentheses
//! - a multi-alternative body becomes a group, `a (b | c) d`
//! - a multi-alternative body with an empty arm becomes an optional group of the
//!   remaining arms, `a (b | c)? d`
//! - a reference that is the whole alternative is replaced by the body's alternatives,
//!   extending the enclosing alternation instead of nesting a group
//!
//! The last rule is applied as a normalization of every production that was touched,
//! not at the moment a reference is replaced. An alternative can become a lone group
//! only after another name is inlined (`a b` with an empty `a`), so the alternation is
//! flattened once substitution is done:
//!
//! - an alternative that is only an unmodified group joins the enclosing alternation
//! - an alternative that is only an optional group joins it, followed by an empty arm
//! - only the first empty arm of an alternation is kept
//!
//! This makes inlining a set of unrelated names independent of the order they are
//! given in. Names in one request are processed dependencies-first, so when `a`
//! references `b` and both are inlined, `b` is already expanded inside `a` by the time
//! `a` is spliced elsewhere. All checks run before the grammar is touched: a failed
//! request leaves it exactly as it was.

use std::collections::HashMap;

use crate::grammar::{Alternative, Grammar, GrammarError, Modifier, Symbol};

/// Inline `names` into `grammar`
pub fn inline<S: AsRef<str>>(grammar: &mut Grammar, names: &[S]) -> Result<(), GrammarError> {
    let mut requested: Vec<&str> = Vec::new();
    for name in names {
        let name = name.as_ref();
        if !requested.contains(&name) {
            requested.push(name);
        }
    }

    for name in &requested {
        if !grammar.contains(name) {
            return Err(GrammarError::UndefinedProduction {
                name: name.to_string(),
                referenced_from: None,
            });
        }
    }

    let order = dependency_order(grammar, &requested)?;
    tracing::debug!(order = ?order, "inlining productions");

    for name in order {
        let Some(production) = grammar.remove(&name) else {
            continue;
        };
        let expansion = Expansion::new(&name, &production.alternatives);
        for referrer in grammar.productions_mut() {
            if referrer.references_name(&name) {
                expansion.apply(&mut referrer.alternatives);
            }
        }
    }
    Ok(())
}

/// Order `requested` so every name comes after the requested names its body uses.
/// A back edge in the walk means the set is recursive and cannot be inlined.
fn dependency_order(grammar: &Grammar, requested: &[&str]) -> Result<Vec<String>, GrammarError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        name: &str,
        grammar: &Grammar,
        requested: &[&str],
        marks: &mut HashMap<String, Mark>,
        path: &mut Vec<String>,
        order: &mut Vec<String>,
    ) -> Result<(), GrammarError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| n == name).unwrap_or(0);
                let mut names = path[start..].to_vec();
                names.push(name.to_string());
                return Err(GrammarError::CyclicInline { names });
            }
            None => {}
        }

        marks.insert(name.to_string(), Mark::Visiting);
        path.push(name.to_string());
        if let Some(production) = grammar.get(name) {
            for dependency in production.references() {
                if requested.contains(&dependency) {
                    visit(dependency, grammar, requested, marks, path, order)?;
                }
            }
        }
        path.pop();
        marks.insert(name.to_string(), Mark::Done);
        order.push(name.to_string());
        Ok(())
    }

    let mut marks = HashMap::new();
    let mut order = Vec::new();
    for name in requested {
        visit(name, grammar, requested, &mut marks, &mut Vec::new(), &mut order)?;
    }
    Ok(order)
}

/// The body of one inlined production, ready to splice into referrers
struct Expansion<'a> {
    name: &'a str,
    /// What replaces a reference inside a sequence
    in_sequence: Vec<Symbol>,
}

impl<'a> Expansion<'a> {
    fn new(name: &'a str, alternatives: &[Alternative]) -> Self {
        Self {
            name,
            in_sequence: sequence_form(alternatives),
        }
    }

    fn apply(&self, alternatives: &mut Vec<Alternative>) {
        let substituted = alternatives
            .drain(..)
            .map(|alternative| self.substitute(alternative))
            .collect();
        *alternatives = normalize(substituted);
    }

    fn substitute(&self, alternative: Alternative) -> Alternative {
        let mut symbols = Vec::with_capacity(alternative.symbols().len());
        for symbol in alternative.into_symbols() {
            match symbol {
                Symbol::Reference(name) if name == self.name => {
                    symbols.extend(self.in_sequence.iter().cloned());
                }
                Symbol::Group {
                    alternatives,
                    modifier,
                } => {
                    let alternatives = alternatives
                        .into_iter()
                        .map(|alternative| self.substitute(alternative))
                        .collect();
                    symbols.push(Symbol::group(alternatives, modifier));
                }
                other => symbols.push(other),
            }
        }
        Alternative::new(symbols)
    }
}

fn sequence_form(alternatives: &[Alternative]) -> Vec<Symbol> {
    if let [only] = alternatives {
        return only.symbols().to_vec();
    }

    let filled: Vec<Alternative> = alternatives
        .iter()
        .filter(|a| !a.is_empty())
        .cloned()
        .collect();
    match filled.len() {
        0 => Vec::new(),
        n if n < alternatives.len() => vec![Symbol::group(filled, Modifier::Optional)],
        _ => vec![Symbol::group(alternatives.to_vec(), Modifier::None)],
    }
}

/// Flatten lone groups into the enclosing alternation, innermost first, and drop
/// repeated empty arms
fn normalize(alternatives: Vec<Alternative>) -> Vec<Alternative> {
    let mut out = Alternation::default();
    for alternative in alternatives {
        let mut symbols: Vec<Symbol> = alternative
            .into_symbols()
            .into_iter()
            .map(normalize_symbol)
            .collect();

        if let [Symbol::Group {
            modifier: Modifier::None | Modifier::Optional,
            ..
        }] = symbols.as_slice()
        {
            if let Some(Symbol::Group {
                alternatives,
                modifier,
            }) = symbols.pop()
            {
                out.extend(alternatives);
                if modifier == Modifier::Optional {
                    out.push(Alternative::empty());
                }
            }
            continue;
        }
        out.push(Alternative::new(symbols));
    }
    out.arms
}

fn normalize_symbol(symbol: Symbol) -> Symbol {
    match symbol {
        Symbol::Group {
            alternatives,
            modifier,
        } => Symbol::group(normalize(alternatives), modifier),
        other => other,
    }
}

#[derive(Default)]
struct Alternation {
    arms: Vec<Alternative>,
    has_empty: bool,
}

impl Alternation {
    fn push(&mut self, alternative: Alternative) {
        if alternative.is_empty() {
            if self.has_empty {
                return;
            }
            self.has_empty = true;
        }
        self.arms.push(alternative);
    }

    fn extend(&mut self, alternatives: Vec<Alternative>) {
        for alternative in alternatives {
            self.push(alternative);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse;

    fn texts(grammar: &Grammar, name: &str) -> Vec<String> {
        grammar
            .get(name)
            .unwrap()
            .alternatives
            .iter()
            .map(|a| a.text().to_string())
            .collect()
    }

    #[test]
    fn test_multi_alternative_body_is_grouped() {
        let mut grammar = parse("stmt: 'A' sub ; sub: 'B' | 'C' ;").unwrap();
        inline(&mut grammar, &["sub"]).unwrap();
        assert_eq!(texts(&grammar, "stmt"), vec!["'A' ('B' | 'C')"]);
        assert!(!grammar.contains("sub"));
    }

    #[test]
    fn test_single_alternative_body_is_spliced() {
        let mut grammar = parse("stmt: 'A' sub 'D' ; sub: 'B' 'C' ;").unwrap();
        inline(&mut grammar, &["sub"]).unwrap();
        assert_eq!(texts(&grammar, "stmt"), vec!["'A' 'B' 'C' 'D'"]);
    }

    #[test]
    fn test_sole_reference_extends_alternation() {
        let mut grammar = parse("stmt: 'A' | sub ; sub: 'B' | 'C' ;").unwrap();
        inline(&mut grammar, &["sub"]).unwrap();
        assert_eq!(texts(&grammar, "stmt"), vec!["'A'", "'B'", "'C'"]);
    }

    #[test]
    fn test_empty_arm_becomes_optional_group() {
        let mut grammar = parse("stmt: 'DROP' opt_column name ; opt_column: | 'COLUMN' ; name: IDENT ;")
            .unwrap();
        inline(&mut grammar, &["opt_column"]).unwrap();
        assert_eq!(texts(&grammar, "stmt"), vec!["'DROP' ('COLUMN')? name"]);
    }

    #[test]
    fn test_sole_reference_with_empty_arm_keeps_one_empty() {
        let mut grammar = parse("stmt: 'A' | sub ; sub: | 'B' | ;").unwrap();
        inline(&mut grammar, &["sub"]).unwrap();
        assert_eq!(texts(&grammar, "stmt"), vec!["'A'", "'B'", ""]);
    }

    #[test]
    fn test_lone_group_left_by_an_empty_body_joins_the_alternation() {
        let source = "c: a b ; a: ; b: 'p' | 'q' ;";

        let mut forward = parse(source).unwrap();
        inline(&mut forward, &["a", "b"]).unwrap();
        let mut backward = parse(source).unwrap();
        inline(&mut backward, &["b", "a"]).unwrap();

        assert_eq!(forward.to_ebnf(), "c:\n    'p'\n  | 'q'\n  ;\n");
        assert_eq!(backward, forward);
    }

    #[test]
    fn test_empty_bodies_collapse_to_one_empty_arm() {
        let source = "p0: | ; p1: p0 p2 ; p2: ;";

        let mut forward = parse(source).unwrap();
        inline(&mut forward, &["p0", "p2"]).unwrap();
        let mut backward = parse(source).unwrap();
        inline(&mut backward, &["p2", "p0"]).unwrap();

        assert_eq!(forward.to_ebnf(), "p1:\n    /* EMPTY */\n  ;\n");
        assert_eq!(backward, forward);
    }

    #[test]
    fn test_lone_optional_group_left_in_a_group_is_flattened() {
        let source = "c: 'x' (a b | 'z') ; a: ; b: | 'p' ;";

        let mut forward = parse(source).unwrap();
        inline(&mut forward, &["a", "b"]).unwrap();
        let mut backward = parse(source).unwrap();
        inline(&mut backward, &["b", "a"]).unwrap();

        assert_eq!(texts(&forward, "c"), vec!["'x' ('p' |  | 'z')"]);
        assert_eq!(backward, forward);
    }

    #[test]
    fn test_untouched_productions_are_not_normalized() {
        let mut grammar = parse("stmt: ('A' | 'B') ; other: 'C' sub ; sub: 'D' ;").unwrap();
        inline(&mut grammar, &["sub"]).unwrap();
        assert_eq!(texts(&grammar, "stmt"), vec!["('A' | 'B')"]);
        assert_eq!(texts(&grammar, "other"), vec!["'C' 'D'"]);
    }

    #[test]
    fn test_references_inside_groups() {
        let mut grammar = parse("stmt: ('A' sub)* ; sub: 'B' | 'C' ;").unwrap();
        inline(&mut grammar, &["sub"]).unwrap();
        assert_eq!(texts(&grammar, "stmt"), vec!["('A' ('B' | 'C'))*"]);
    }

    #[test]
    fn test_dependencies_are_expanded_first() {
        let mut grammar = parse("stmt: a ';' ; a: 'X' b ; b: 'Y' | 'Z' ;").unwrap();
        inline(&mut grammar, &["a", "b"]).unwrap();
        assert_eq!(texts(&grammar, "stmt"), vec!["'X' ('Y' | 'Z') ';'"]);
        assert_eq!(grammar.names().collect::<Vec<_>>(), vec!["stmt"]);

        let mut reversed = parse("stmt: a ';' ; a: 'X' b ; b: 'Y' | 'Z' ;").unwrap();
        inline(&mut reversed, &["b", "a"]).unwrap();
        assert_eq!(reversed, grammar);
    }

    #[test]
    fn test_direct_recursion_is_rejected() {
        let mut grammar = parse("stmt: list ; list: list ',' 'x' | 'x' ;").unwrap();
        let before = grammar.clone();
        let err = inline(&mut grammar, &["list"]).unwrap_err();
        assert_eq!(
            err,
            GrammarError::CyclicInline {
                names: vec!["list".into(), "list".into()]
            }
        );
        assert_eq!(grammar, before);
    }

    #[test]
    fn test_indirect_recursion_through_inline_set_is_rejected() {
        let mut grammar = parse("stmt: a ; a: 'x' b | 'y' ; b: '(' a ')' ;").unwrap();
        let before = grammar.clone();
        let err = inline(&mut grammar, &["a", "b"]).unwrap_err();
        assert_eq!(
            err,
            GrammarError::CyclicInline {
                names: vec!["a".into(), "b".into(), "a".into()]
            }
        );
        assert_eq!(grammar, before);
    }

    #[test]
    fn test_recursion_outside_the_set_is_fine() {
        let mut grammar = parse("expr: '(' wrapped ')' | 'x' ; wrapped: expr ;").unwrap();
        inline(&mut grammar, &["wrapped"]).unwrap();
        assert_eq!(texts(&grammar, "expr"), vec!["'(' expr ')'", "'x'"]);
    }

    #[test]
    fn test_undefined_name_leaves_grammar_untouched() {
        let mut grammar = parse("stmt: 'A' sub ; sub: 'B' ;").unwrap();
        let before = grammar.clone();
        let err = inline(&mut grammar, &["sub", "nope"]).unwrap_err();
        assert_eq!(
            err,
            GrammarError::UndefinedProduction {
                name: "nope".into(),
                referenced_from: None
            }
        );
        assert_eq!(grammar, before);
    }

    #[test]
    fn test_repeated_names_are_inlined_once() {
        let mut grammar = parse("stmt: 'A' sub ; sub: 'B' ;").unwrap();
        inline(&mut grammar, &["sub", "sub"]).unwrap();
        assert_eq!(texts(&grammar, "stmt"), vec!["'A' 'B'"]);
    }
}
