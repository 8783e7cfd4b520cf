//! tagtrace-core - Core library for requirements traceability matrices
//!
//! This crate provides the building blocks for:
//! - Extracting bracket annotations from free-form documents
//! - Collecting tag definitions and coverage relationships across documents
//! - Checking coverage against a type-dependency rule graph
//! - Flattening the result into report tables
//!
//! # Features
//!
//! - `walk` - Enable [`WalkSources`] for gitignore-aware directory walking (brings in `ignore`)
//! - `parallel` - Enable parallel reading in [`PathSources`] (brings in `rayon`)
//!
//! # Annotation Syntax
//!
//! Annotations can appear anywhere in a line of prose or a code comment:
//!
//! ```markdown
//! [H1:] The tank can burst when pressure exceeds its rating.
//! [R1:] A relief valve shall open above 8 bar. [=>H1]
//! [**D1**:] Spring-loaded valve, set point 8 bar. [=>R1]
//! ```
//!
//! - `[X:]` defines tag `X` with the rest of the line as its text
//! - `[X=>Y]` records that `X` covers `Y`
//! - an omitted left tag (`[=>Y]`) inherits the last left tag seen, even
//!   from an earlier line or document
//! - a bare type (`[I=>D1]`) is anonymous and becomes `I:<document>:<line>`
//!
//! # Building Reports
//!
//! ```
//! use tagtrace_core::{MemorySources, TraceConfig, TraceReport, scan};
//!
//! let result = scan(
//!     MemorySources::new()
//!         .add("hazards.md", "[H1:] Overpressure")
//!         .add("reqs.md", "[R1:] Relief valve [=>H1]"),
//! )
//! .unwrap();
//!
//! let report = TraceReport::generate(&result, &TraceConfig::default());
//! assert_eq!(report.requirements.rows.len(), 2);
//! assert_eq!(report.requirements.rows[0].missing.as_deref(), Some("D"));
//! ```

mod lexer;
mod rules;
mod scanner;
mod sources;
mod table;
mod tag;

pub use lexer::{SourceSpan, TagOp, TagRef, TagRefs, extract, strip_tags};
pub use rules::{
    CoverageEngine, CoverageRow, DESIGN_TRACING, IMPLEMENTATION_TYPE, PRIMARY_TYPES,
    REQUIREMENT_TRACING, Requirement, RowEntry, RuleGraph, TYPE_NAMES, TraceConfig, TypeName,
    TypeRule,
};
pub use scanner::{
    Definition, Definitions, Diagnostic, DiagnosticKind, Relationship, ScanResult, Scanner,
};
pub use sources::{
    Document, MemorySources, PathSources, SUPPORTED_EXTENSIONS, Sources, is_supported_extension,
};
pub use table::{TableRow, TraceReport, TraceTable, format_entry};
pub use tag::{Tag, TagLocation, id_suffix, is_tag_id, type_of};

#[cfg(feature = "walk")]
pub use sources::WalkSources;

/// Load documents from any source and scan them in order
pub fn scan(sources: impl Sources) -> eyre::Result<ScanResult> {
    let documents = sources.documents()?;
    Ok(ScanResult::from_documents(&documents))
}
