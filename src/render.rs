//! Diagram rendering
//!
//! A [`Renderer`] turns an EBNF fragment into the markup written to disk. Statement
//! diagrams and the whole-grammar page are separate calls because they are
//! post-processed differently.

pub mod html;
pub mod railroad;
pub mod text;

pub use railroad::RailroadService;
pub use text::EbnfRenderer;

use async_trait::async_trait;
use std::fmt;

use crate::grammar::GrammarError;

#[derive(Debug)]
pub enum RenderError {
    /// The EBNF handed to the renderer did not parse
    Grammar(GrammarError),
    Http(String),
    Status { status: u16, body: String },
    /// Expected element missing from the generated page
    MissingTag(String),
    /// A page could not be serialized back to HTML
    Html(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Grammar(err) => write!(f, "{}", err),
            RenderError::Http(msg) => write!(f, "Diagram service request failed: {}", msg),
            RenderError::Status { status, body } => {
                write!(f, "Diagram service returned HTTP {}: {}", status, body)
            }
            RenderError::MissingTag(tag) => write!(f, "No <{}> element in generated page", tag),
            RenderError::Html(msg) => write!(f, "Failed to write HTML: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<GrammarError> for RenderError {
    fn from(err: GrammarError) -> Self {
        RenderError::Grammar(err)
    }
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Markup for one statement: the diagram of its root production
    async fn statement_diagram(&self, ebnf: &str) -> Result<String, RenderError>;

    /// Markup for the page holding every production of the grammar
    async fn grammar_diagram(&self, ebnf: &str) -> Result<String, RenderError>;
}
