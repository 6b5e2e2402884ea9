//! Per-statement grammar reduction
//!
//! Every job parses its own [`Grammar`] from the shared base text, so inlining in one
//! job can never be observed by another.

use regex::Regex;
use std::collections::BTreeMap;

use super::spec::StatementSpec;
use crate::grammar::{parse, Grammar, GrammarError};
use crate::transform::{inline, Extraction};

/// Parse `ebnf`, inline `names`, then extract `target` with its reachable productions
pub fn reduce<S: AsRef<str>>(
    ebnf: &str,
    names: &[S],
    target: &str,
    descend: bool,
    include: Option<&Regex>,
    exclude: Option<&Regex>,
) -> Result<Grammar, GrammarError> {
    let mut grammar = parse(ebnf)?;
    inline(&mut grammar, names)?;
    let reduced = Extraction::new(target)
        .descend(descend)
        .include(include)
        .exclude(exclude)
        .run(&grammar)?;
    tracing::debug!(
        root = target,
        descend,
        productions = reduced.len(),
        "reduced grammar"
    );
    Ok(reduced)
}

/// Apply literal substring replacements in key order
pub fn apply_replacements(text: &str, replace: &BTreeMap<String, String>) -> String {
    replace
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
}

/// EBNF for one statement diagram
pub fn statement_ebnf(base: &str, spec: &StatementSpec) -> Result<String, GrammarError> {
    let reduced = reduce(
        base,
        &spec.inline,
        spec.target(),
        false,
        spec.include.as_ref(),
        spec.exclude.as_ref(),
    )?;
    Ok(apply_replacements(&reduced.to_ebnf(), &spec.replace))
}

/// EBNF for the whole-grammar page: everything reachable from `root`, wrapper dropped
pub fn grammar_ebnf(base: &str, root: &str) -> Result<String, GrammarError> {
    let no_inline: &[&str] = &[];
    Ok(reduce(base, no_inline, root, true, None, None)?.to_ebnf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "
        stmt_block: stmt ;
        stmt: drop_stmt | show_stmt ;
        drop_stmt: 'DROP' 'TABLE' name opt_cascade | 'DROP' 'INDEX' name ;
        opt_cascade: 'CASCADE' | ;
        show_stmt: 'SHOW' 'TABLES' ;
        name: IDENT ;
    ";

    #[test]
    fn test_statement_with_inline_and_include() {
        let spec = StatementSpec::new("drop_table")
            .with_stmt("drop_stmt")
            .with_inline(["opt_cascade"])
            .with_include(Regex::new("'DROP' 'TABLE'").unwrap());
        assert_eq!(
            statement_ebnf(BASE, &spec).unwrap(),
            "drop_stmt:\n    'DROP' 'TABLE' name ('CASCADE')?\n  ;\n\nname:\n    IDENT\n  ;\n"
        );
    }

    #[test]
    fn test_replacements_run_after_extraction() {
        let spec = StatementSpec::new("show_stmt").with_replacement("'TABLES'", "'DATABASES'");
        assert_eq!(
            statement_ebnf(BASE, &spec).unwrap(),
            "show_stmt:\n    'SHOW' 'DATABASES'\n  ;\n"
        );
    }

    #[test]
    fn test_replacement_order_is_by_key() {
        let mut replace = BTreeMap::new();
        replace.insert("b".to_string(), "c".to_string());
        replace.insert("a".to_string(), "b".to_string());
        assert_eq!(apply_replacements("a", &replace), "c");
    }

    #[test]
    fn test_grammar_descends_past_root() {
        let text = grammar_ebnf(BASE, "stmt_block").unwrap();
        assert!(text.starts_with("stmt:\n"));
        assert!(!text.contains("stmt_block"));
        assert!(text.contains("opt_cascade:\n"));
    }

    #[test]
    fn test_jobs_do_not_share_mutations() {
        let inlined = StatementSpec::new("drop_stmt").with_inline(["opt_cascade"]);
        let plain = StatementSpec::new("drop_stmt");
        assert!(!statement_ebnf(BASE, &inlined).unwrap().contains("opt_cascade"));
        assert!(statement_ebnf(BASE, &plain).unwrap().contains("opt_cascade:\n"));
    }

    #[test]
    fn test_missing_inline_target() {
        let spec = StatementSpec::new("drop_stmt").with_inline(["nope"]);
        assert!(matches!(
            statement_ebnf(BASE, &spec),
            Err(GrammarError::UndefinedProduction { name, .. }) if name == "nope"
        ));
    }
}
