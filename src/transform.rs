//! Grammar transformations: inlining, alternative filtering and reachability extraction
//!
//! A statement diagram is produced by running them in that order on a freshly parsed
//! grammar.

pub mod extract;
pub mod filter;
pub mod inline;

pub use extract::{extract, Extraction};
pub use filter::{filter, AlternativeFilter};
pub use inline::inline;
