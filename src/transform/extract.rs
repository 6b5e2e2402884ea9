//! Reachability extraction
//!
//! Produces the smallest grammar that still defines everything a target production
//! uses: the (possibly filtered or descended) root, followed by every production
//! reachable from it in breadth-first discovery order. The source grammar is only read.

use regex::Regex;
use std::collections::{HashSet, VecDeque};

use super::filter::AlternativeFilter;
use crate::grammar::{Grammar, GrammarError, Production};

/// Parameters for one extraction
#[derive(Debug, Clone, Copy)]
pub struct Extraction<'a> {
    pub target: &'a str,
    /// Drop the target wrapper in favour of its single surviving alternative
    pub descend: bool,
    pub include: Option<&'a Regex>,
    pub exclude: Option<&'a Regex>,
}

impl<'a> Extraction<'a> {
    pub fn new(target: &'a str) -> Self {
        Self {
            target,
            descend: false,
            include: None,
            exclude: None,
        }
    }

    pub fn descend(mut self, descend: bool) -> Self {
        self.descend = descend;
        self
    }

    pub fn include(mut self, pattern: Option<&'a Regex>) -> Self {
        self.include = pattern;
        self
    }

    pub fn exclude(mut self, pattern: Option<&'a Regex>) -> Self {
        self.exclude = pattern;
        self
    }

    /// Build the minimal sub-grammar, root production first
    pub fn run(&self, grammar: &Grammar) -> Result<Grammar, GrammarError> {
        let target = grammar
            .get(self.target)
            .ok_or_else(|| GrammarError::UndefinedProduction {
                name: self.target.to_string(),
                referenced_from: None,
            })?;

        let filtered = AlternativeFilter::new(self.include, self.exclude).apply(target)?;
        let root = if self.descend {
            descend_into(grammar, filtered)?
        } else {
            filtered
        };

        let closure = closure(grammar, root)?;
        tracing::debug!(
            root = self.target,
            productions = closure.len(),
            "extracted reachable productions"
        );
        Ok(closure)
    }
}

/// Replace a filtered wrapper with its only alternative. An alternative that is a single
/// reference hands the root over to the referenced production.
fn descend_into(grammar: &Grammar, wrapper: Production) -> Result<Production, GrammarError> {
    if wrapper.alternatives.len() != 1 {
        return Err(GrammarError::AmbiguousDescend {
            name: wrapper.name().to_string(),
            remaining: wrapper.alternatives.len(),
        });
    }

    let alternative = &wrapper.alternatives[0];
    match alternative.sole_reference() {
        Some(inner) => grammar.get(inner).cloned().ok_or_else(|| {
            GrammarError::UndefinedProduction {
                name: inner.to_string(),
                referenced_from: Some(wrapper.name().to_string()),
            }
        }),
        None => Ok(wrapper),
    }
}

fn closure(grammar: &Grammar, root: Production) -> Result<Grammar, GrammarError> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(root.name().to_string());

    let mut out = Grammar::new();
    let mut queue: VecDeque<Production> = VecDeque::new();
    queue.push_back(root);

    while let Some(production) = queue.pop_front() {
        for name in production.references() {
            if !seen.insert(name.to_string()) {
                continue;
            }
            let found = grammar.get(name).cloned().ok_or_else(|| {
                GrammarError::UndefinedProduction {
                    name: name.to_string(),
                    referenced_from: Some(production.name().to_string()),
                }
            })?;
            queue.push_back(found);
        }
        out.insert(production)?;
    }
    Ok(out)
}

/// Extract `target` and serialize the result as EBNF text
pub fn extract(
    grammar: &Grammar,
    target: &str,
    descend: bool,
    include: Option<&Regex>,
    exclude: Option<&Regex>,
) -> Result<String, GrammarError> {
    let extracted = Extraction::new(target)
        .descend(descend)
        .include(include)
        .exclude(exclude)
        .run(grammar)?;
    Ok(extracted.to_ebnf())
}
