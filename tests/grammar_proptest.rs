//! Property-based tests over generated grammars
//!
//! Grammars are built as text: productions `p0..pN` whose alternatives mix literals,
//! terminals, references to other productions and modified groups.

use proptest::prelude::*;
use regex::Regex;
use sqldiagram::grammar::{parse, Grammar, GrammarError};
use sqldiagram::transform::{inline, AlternativeFilter, Extraction};
use std::collections::{HashSet, VecDeque};

fn modifier() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(""), Just("?"), Just("*"), Just("+")]
}

fn simple_symbol(productions: usize) -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z]{1,6}".prop_map(|word| format!("'{}'", word)),
        (0..productions).prop_map(|i| format!("p{}", i)),
        Just("IDENT".to_string()),
    ]
}

fn symbol(productions: usize) -> impl Strategy<Value = String> {
    let group = (
        prop::collection::vec(
            prop::collection::vec(simple_symbol(productions), 1..3).prop_map(|s| s.join(" ")),
            1..3,
        ),
        modifier(),
    )
        .prop_map(|(alternatives, modifier)| format!("({}){}", alternatives.join(" | "), modifier));
    prop_oneof![
        3 => simple_symbol(productions),
        1 => (simple_symbol(productions), modifier()).prop_map(|(s, m)| format!("{}{}", s, m)),
        1 => group,
    ]
}

fn grammar_text() -> impl Strategy<Value = String> {
    (1usize..6).prop_flat_map(|count| {
        let alternative = prop::collection::vec(symbol(count), 0..4).prop_map(|s| s.join(" "));
        prop::collection::vec(prop::collection::vec(alternative, 1..4), count).prop_map(
            |productions| {
                productions
                    .iter()
                    .enumerate()
                    .map(|(i, alternatives)| format!("p{}: {} ;", i, alternatives.join(" | ")))
                    .collect::<Vec<_>>()
                    .join("\n")
            },
        )
    })
}

fn pattern() -> impl Strategy<Value = Regex> {
    prop_oneof![
        Just("'[A-M]"),
        Just("p0"),
        Just("IDENT"),
        Just(r"\("),
        Just("^$"),
    ]
    .prop_map(|p| Regex::new(p).unwrap())
}

/// Names reachable from `root`, computed independently of the extractor
fn reachable(grammar: &Grammar, root: &str) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([root.to_string()]);
    while let Some(name) = queue.pop_front() {
        if !seen.insert(name.clone()) {
            continue;
        }
        if let Some(production) = grammar.get(&name) {
            queue.extend(production.references().into_iter().map(String::from));
        }
    }
    seen
}

proptest! {
    #[test]
    fn test_serialize_then_parse_is_identity(text in grammar_text()) {
        let grammar = parse(&text).unwrap();
        let reparsed = parse(&grammar.to_ebnf()).unwrap();
        prop_assert_eq!(reparsed, grammar);
    }

    #[test]
    fn test_filter_partitions_alternatives(
        text in grammar_text(),
        include in prop::option::of(pattern()),
        exclude in prop::option::of(pattern()),
    ) {
        let grammar = parse(&text).unwrap();
        let filter = AlternativeFilter::new(include.as_ref(), exclude.as_ref());
        for production in grammar.productions() {
            let expected: Vec<_> = production
                .alternatives
                .iter()
                .filter(|alt| {
                    let text = alt.text();
                    include.as_ref().map_or(true, |re| re.is_match(text))
                        && !exclude.as_ref().map_or(false, |re| re.is_match(text))
                })
                .cloned()
                .collect();

            match filter.apply(production) {
                Ok(kept) => prop_assert_eq!(kept.alternatives, expected),
                Err(err) => {
                    prop_assert!(expected.is_empty());
                    prop_assert_eq!(err, GrammarError::NoMatch { name: production.name().to_string() });
                }
            }
        }
    }

    #[test]
    fn test_extraction_is_exactly_the_closure(text in grammar_text()) {
        let grammar = parse(&text).unwrap();
        let extracted = Extraction::new("p0").run(&grammar).unwrap();

        prop_assert_eq!(extracted.productions()[0].name(), "p0");
        let names: HashSet<String> = extracted.names().map(String::from).collect();
        prop_assert_eq!(names.len(), extracted.len());
        prop_assert_eq!(names, reachable(&grammar, "p0"));
    }

    #[test]
    fn test_inlining_disjoint_names_commutes(
        text in grammar_text(),
        first in any::<prop::sample::Index>(),
        second in any::<prop::sample::Index>(),
    ) {
        let grammar = parse(&text).unwrap();
        let a = format!("p{}", first.index(grammar.len()));
        let b = format!("p{}", second.index(grammar.len()));

        // Only pairs that neither reference each other nor themselves are disjoint
        let (pa, pb) = (grammar.get(&a).unwrap(), grammar.get(&b).unwrap());
        let disjoint = a != b
            && !pa.references_name(&a)
            && !pa.references_name(&b)
            && !pb.references_name(&b)
            && !pb.references_name(&a);
        if !disjoint {
            return Ok(());
        }

        let mut stepwise = grammar.clone();
        inline(&mut stepwise, &[a.as_str()]).unwrap();
        inline(&mut stepwise, &[b.as_str()]).unwrap();

        let mut at_once = grammar.clone();
        inline(&mut at_once, &[b.as_str(), a.as_str()]).unwrap();

        prop_assert_eq!(stepwise.to_ebnf(), at_once.to_ebnf());
    }
}
