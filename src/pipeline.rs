//! Statement diagram generation
//!
//! Statement specs ([`spec`]) drive per-statement reductions ([`job`]) that the
//! [`orchestrator`] runs concurrently against a renderer.

pub mod job;
pub mod orchestrator;
pub mod spec;

pub use job::{apply_replacements, grammar_ebnf, reduce, statement_ebnf};
pub use orchestrator::{write_diagrams, Diagram, JobError, Orchestrator, RunError};
pub use spec::{default_specs, load_specs, SpecError, StatementSpec};
