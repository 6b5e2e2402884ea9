//! Settings for grammar fetching, diagram output and the railroad service
//!
//! The grammar URL, the bare token list, output paths and service parameters ship in
//! `defaults/sqldiagram.default.toml`. `--config` files and flags such as `--addr` or
//! `--out` replace individual keys. The resulting [`Settings`] value is handed to the
//! commands that need it.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/sqldiagram.default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub source: SourceSettings,
    pub output: OutputSettings,
    pub railroad: RailroadSettings,
}

/// Where the yacc grammar lives and how its tokens are treated
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    pub addr: String,
    pub bare_tokens: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    pub base_dir: PathBuf,
    pub grammar_file: String,
    pub grammar_link: String,
    pub grammar_root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RailroadSettings {
    pub url: String,
    pub width: u32,
    pub options: Vec<String>,
}

/// Builds [`Settings`] from the shipped defaults plus whatever the command line adds
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Settings as shipped: the cockroach grammar, `../_includes/sql/diagrams` and the
    /// public railroad service
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Read a TOML file given with `--config`; its keys win over the shipped ones.
    /// The file has to exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Replace one dotted key such as `source.addr` or `output.base_dir`
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Fails when a layer leaves a field missing or mistyped
    pub fn build(self) -> Result<Settings, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<Settings, ConfigError> {
    Loader::new().build()
}
