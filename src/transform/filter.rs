//! Alternative filtering
//!
//! An alternative is kept iff it matches `include` (when given) and does not match
//! `exclude` (when given). Patterns run against the rendered alternative text, e.g.
//! `'DROP' 'TABLE' name`, never against the original source.

use regex::Regex;

use crate::grammar::{Alternative, GrammarError, Production};

#[derive(Debug, Clone, Copy, Default)]
pub struct AlternativeFilter<'a> {
    include: Option<&'a Regex>,
    exclude: Option<&'a Regex>,
}

impl<'a> AlternativeFilter<'a> {
    pub fn new(include: Option<&'a Regex>, exclude: Option<&'a Regex>) -> Self {
        Self { include, exclude }
    }

    pub fn keeps(&self, alternative: &Alternative) -> bool {
        let text = alternative.text();
        self.include.map_or(true, |re| re.is_match(text))
            && self.exclude.map_or(true, |re| !re.is_match(text))
    }

    /// Filter a production's alternatives, preserving their order
    pub fn apply(&self, production: &Production) -> Result<Production, GrammarError> {
        let alternatives: Vec<Alternative> = production
            .alternatives
            .iter()
            .filter(|alternative| self.keeps(alternative))
            .cloned()
            .collect();

        if alternatives.is_empty() {
            return Err(GrammarError::NoMatch {
                name: production.name().to_string(),
            });
        }
        Ok(Production::new(production.name(), alternatives))
    }
}

/// Convenience wrapper around [`AlternativeFilter::apply`]
pub fn filter(
    production: &Production,
    include: Option<&Regex>,
    exclude: Option<&Regex>,
) -> Result<Production, GrammarError> {
    AlternativeFilter::new(include, exclude).apply(production)
}
