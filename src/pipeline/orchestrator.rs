//! Concurrent diagram generation
//!
//! [`Orchestrator::run`] launches one task per statement spec plus one for the
//! whole-grammar page, waits for all of them, and only then decides whether the run
//! succeeded. A failed run reports every spec that failed along with the first error in
//! launch order. Tasks share only the immutable base EBNF and the renderer.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::job::{grammar_ebnf, statement_ebnf};
use super::spec::StatementSpec;
use crate::grammar::GrammarError;
use crate::render::{RenderError, Renderer};

/// Rendered markup and the file it belongs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagram {
    pub file_name: String,
    pub markup: String,
}

#[derive(Debug)]
pub enum JobError {
    Grammar(GrammarError),
    Render(RenderError),
    /// The task panicked or was cancelled
    Aborted(String),
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Grammar(err) => write!(f, "{}", err),
            JobError::Render(err) => write!(f, "{}", err),
            JobError::Aborted(msg) => write!(f, "Job aborted: {}", msg),
        }
    }
}

impl std::error::Error for JobError {}

impl From<GrammarError> for JobError {
    fn from(err: GrammarError) -> Self {
        JobError::Grammar(err)
    }
}

impl From<RenderError> for JobError {
    fn from(err: RenderError) -> Self {
        JobError::Render(err)
    }
}

#[derive(Debug)]
pub struct RunError {
    /// Names of the failed jobs, in launch order
    pub failed: Vec<String>,
    /// Error of the first failed job
    pub first: JobError,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.failed.first().map(String::as_str).unwrap_or_default();
        write!(f, "{}: {}", first, self.first)?;
        if self.failed.len() > 1 {
            write!(f, " (failed: {})", self.failed.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for RunError {}

pub struct Orchestrator {
    renderer: Arc<dyn Renderer>,
    specs: Vec<Arc<StatementSpec>>,
    grammar_root: String,
    grammar_file: String,
}

impl Orchestrator {
    pub fn new(renderer: Arc<dyn Renderer>, specs: Vec<StatementSpec>) -> Self {
        Self {
            renderer,
            specs: specs.into_iter().map(Arc::new).collect(),
            grammar_root: "stmt_block".to_string(),
            grammar_file: "grammar.html".to_string(),
        }
    }

    /// Production the whole-grammar page descends from
    pub fn with_grammar_root(mut self, root: impl Into<String>) -> Self {
        self.grammar_root = root.into();
        self
    }

    pub fn with_grammar_file(mut self, file_name: impl Into<String>) -> Self {
        self.grammar_file = file_name.into();
        self
    }

    /// Render the whole-grammar page followed by every statement diagram
    pub async fn run(&self, base: Arc<str>) -> Result<Vec<Diagram>, RunError> {
        let mut names = Vec::with_capacity(self.specs.len() + 1);
        let mut handles = Vec::with_capacity(self.specs.len() + 1);

        names.push(self.grammar_root.clone());
        handles.push(tokio::spawn(render_grammar(
            Arc::clone(&self.renderer),
            Arc::clone(&base),
            self.grammar_root.clone(),
            self.grammar_file.clone(),
        )));

        for spec in &self.specs {
            names.push(spec.name.clone());
            handles.push(tokio::spawn(render_statement(
                Arc::clone(&self.renderer),
                Arc::clone(&base),
                Arc::clone(spec),
            )));
        }

        let results = futures::future::join_all(handles).await;

        let mut diagrams = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        let mut first = None;
        for (name, result) in names.into_iter().zip(results) {
            let outcome = result.unwrap_or_else(|err| Err(JobError::Aborted(err.to_string())));
            match outcome {
                Ok(diagram) => diagrams.push(diagram),
                Err(err) => {
                    tracing::warn!(job = %name, error = %err, "job failed");
                    failed.push(name);
                    first.get_or_insert(err);
                }
            }
        }

        match first {
            Some(first) => Err(RunError { failed, first }),
            None => Ok(diagrams),
        }
    }
}

async fn render_grammar(
    renderer: Arc<dyn Renderer>,
    base: Arc<str>,
    root: String,
    file_name: String,
) -> Result<Diagram, JobError> {
    tracing::info!(root = %root, renderer = renderer.name(), "rendering grammar");
    let ebnf = grammar_ebnf(&base, &root)?;
    let markup = renderer.grammar_diagram(&ebnf).await?;
    Ok(Diagram { file_name, markup })
}

async fn render_statement(
    renderer: Arc<dyn Renderer>,
    base: Arc<str>,
    spec: Arc<StatementSpec>,
) -> Result<Diagram, JobError> {
    tracing::info!(
        spec = %spec.name,
        stmt = spec.target(),
        inline = ?spec.inline,
        "rendering statement"
    );
    let ebnf = statement_ebnf(&base, &spec)?;
    let markup = renderer.statement_diagram(&ebnf).await?;
    tracing::info!(spec = %spec.name, "statement rendered");
    Ok(Diagram {
        file_name: spec.output_file_name(),
        markup,
    })
}

/// Write every diagram under `base_dir`, creating it when missing
pub async fn write_diagrams(base_dir: &Path, diagrams: &[Diagram]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(base_dir).await?;
    for diagram in diagrams {
        let path = base_dir.join(&diagram.file_name);
        tokio::fs::write(&path, diagram.markup.as_bytes()).await?;
        tracing::debug!(path = %path.display(), "wrote diagram");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Renderer for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn statement_diagram(&self, ebnf: &str) -> Result<String, RenderError> {
            Ok(ebnf.to_string())
        }

        async fn grammar_diagram(&self, ebnf: &str) -> Result<String, RenderError> {
            Ok(format!("<div>{}</div>", ebnf))
        }
    }

    const BASE: &str = "
        stmt_block: stmt ;
        stmt: drop_stmt | show_stmt ;
        drop_stmt: 'DROP' 'TABLE' name | 'DROP' 'INDEX' name ;
        show_stmt: 'SHOW' 'TABLES' ;
        name: IDENT ;
    ";

    #[tokio::test]
    async fn test_grammar_page_comes_first() {
        let orchestrator = Orchestrator::new(
            Arc::new(Echo),
            vec![StatementSpec::new("show_stmt"), StatementSpec::new("drop_stmt")],
        );
        let diagrams = orchestrator.run(Arc::from(BASE)).await.unwrap();
        let files: Vec<&str> = diagrams.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(files, vec!["grammar.html", "show.html", "drop.html"]);
        assert!(diagrams[0].markup.starts_with("<div>stmt:\n"));
    }

    #[tokio::test]
    async fn test_every_failure_is_reported() {
        let orchestrator = Orchestrator::new(
            Arc::new(Echo),
            vec![
                StatementSpec::new("missing_stmt"),
                StatementSpec::new("show_stmt"),
                StatementSpec::new("drop_stmt").with_inline(["nope"]),
            ],
        );
        let err = orchestrator.run(Arc::from(BASE)).await.unwrap_err();
        assert_eq!(err.failed, vec!["missing_stmt", "drop_stmt"]);
        assert!(matches!(
            err.first,
            JobError::Grammar(GrammarError::UndefinedProduction { ref name, .. }) if name == "missing_stmt"
        ));
        assert!(err.to_string().starts_with("missing_stmt: UndefinedProductionError"));
    }
}
