//! Statement specifications
//!
//! A statement spec names one diagram to produce: which production to extract, what to
//! inline into it first, which of its alternatives to keep, and any textual touch-ups
//! applied to the extracted EBNF. Lists are written in YAML; see
//! `defaults/statements.yaml` for the built-in one.

use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

const DEFAULT_SPECS: &str = include_str!("../../defaults/statements.yaml");

#[derive(Debug, Clone)]
pub struct StatementSpec {
    pub name: String,
    /// Production to extract; `None` means the production called `name`
    pub stmt: Option<String>,
    pub inline: Vec<String>,
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
    pub replace: BTreeMap<String, String>,
}

impl StatementSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stmt: None,
            inline: Vec::new(),
            include: None,
            exclude: None,
            replace: BTreeMap::new(),
        }
    }

    pub fn with_stmt(mut self, stmt: impl Into<String>) -> Self {
        self.stmt = Some(stmt.into());
        self
    }

    pub fn with_inline<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inline = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include(mut self, pattern: Regex) -> Self {
        self.include = Some(pattern);
        self
    }

    pub fn with_exclude(mut self, pattern: Regex) -> Self {
        self.exclude = Some(pattern);
        self
    }

    pub fn with_replacement(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.replace.insert(from.into(), to.into());
        self
    }

    /// The production this spec extracts
    pub fn target(&self) -> &str {
        self.stmt.as_deref().unwrap_or(&self.name)
    }

    /// File the rendered diagram is written to
    pub fn output_file_name(&self) -> String {
        format!("{}.html", self.name.replacen("_stmt", "", 1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// The document is not a YAML list of spec records
    Yaml(String),
    InvalidPattern {
        spec: String,
        pattern: String,
        message: String,
    },
    EmptyName,
    DuplicateName(String),
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::Yaml(msg) => write!(f, "Invalid statement specs: {}", msg),
            SpecError::InvalidPattern {
                spec,
                pattern,
                message,
            } => write!(
                f,
                "Invalid pattern '{}' in statement spec '{}': {}",
                pattern, spec, message
            ),
            SpecError::EmptyName => write!(f, "Statement spec with an empty name"),
            SpecError::DuplicateName(name) => {
                write!(f, "Statement spec '{}' is defined more than once", name)
            }
        }
    }
}

impl std::error::Error for SpecError {}

/// On-disk record, before patterns are compiled
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpecRecord {
    name: String,
    #[serde(default)]
    stmt: Option<String>,
    #[serde(default)]
    inline: Vec<String>,
    #[serde(default)]
    include: Option<String>,
    #[serde(default)]
    exclude: Option<String>,
    #[serde(default)]
    replace: BTreeMap<String, String>,
}

fn compile(spec: &str, pattern: Option<String>) -> Result<Option<Regex>, SpecError> {
    pattern
        .map(|pattern| {
            Regex::new(&pattern).map_err(|err| SpecError::InvalidPattern {
                spec: spec.to_string(),
                pattern: pattern.clone(),
                message: err.to_string(),
            })
        })
        .transpose()
}

impl TryFrom<SpecRecord> for StatementSpec {
    type Error = SpecError;

    fn try_from(record: SpecRecord) -> Result<Self, Self::Error> {
        if record.name.trim().is_empty() {
            return Err(SpecError::EmptyName);
        }
        let include = compile(&record.name, record.include)?;
        let exclude = compile(&record.name, record.exclude)?;
        Ok(StatementSpec {
            name: record.name,
            stmt: record.stmt.filter(|stmt| !stmt.is_empty()),
            inline: record.inline,
            include,
            exclude,
            replace: record.replace,
        })
    }
}

/// Parse a YAML list of statement specs, compiling their patterns
pub fn load_specs(yaml: &str) -> Result<Vec<StatementSpec>, SpecError> {
    let records: Vec<SpecRecord> =
        serde_yaml::from_str(yaml).map_err(|err| SpecError::Yaml(err.to_string()))?;

    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(records.len());
    for record in records {
        let spec = StatementSpec::try_from(record)?;
        if !seen.insert(spec.name.clone()) {
            return Err(SpecError::DuplicateName(spec.name));
        }
        specs.push(spec);
    }
    Ok(specs)
}

/// The built-in statement list
pub fn default_specs() -> Result<Vec<StatementSpec>, SpecError> {
    load_specs(DEFAULT_SPECS)
}
