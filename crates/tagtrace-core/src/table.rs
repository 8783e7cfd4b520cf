//! Trace tables: coverage rows flattened into report columns

use crate::rules::{CoverageEngine, RowEntry, RuleGraph, TraceConfig};
use crate::scanner::{Definitions, Diagnostic, DiagnosticKind, Relationship, ScanResult};
use crate::tag::Tag;
use facet::Facet;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// One report row, one cell per column
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct TableRow {
    /// Formatted cross-references; empty string for an empty cell
    pub cells: Vec<String>,
    /// The coverage chain behind this row
    pub tags: Vec<Tag>,
    /// Type whose coverage is missing at the end of this row
    #[facet(default)]
    pub missing: Option<String>,
}

/// A traceability matrix for one rule graph
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct TraceTable {
    pub title: String,
    /// Column type codes, in rule graph key order
    pub columns: Vec<String>,
    /// Column display names
    pub header: Vec<String>,
    pub rows: Vec<TableRow>,
    /// Problems found while building, e.g. coverage cycles
    pub diagnostics: Vec<Diagnostic>,
}

impl TraceTable {
    pub fn build(
        title: impl Into<String>,
        definitions: &Definitions,
        relationships: &[Relationship],
        rules: &RuleGraph,
        config: &TraceConfig,
    ) -> Self {
        let title = title.into();
        let engine = CoverageEngine::new(relationships, rules);
        let columns: Vec<String> = rules.type_codes().map(str::to_string).collect();
        let header = columns
            .iter()
            .map(|code| config.type_name(code).to_string())
            .collect();

        let mut done: HashSet<Tag> = HashSet::new();
        let mut cycles: HashSet<Vec<Tag>> = HashSet::new();
        let mut rows = Vec::new();
        let mut diagnostics = Vec::new();

        for column in &columns {
            for definition in definitions.of_type(column) {
                if done.contains(&definition.tag) {
                    continue;
                }

                for row in engine.rows(&[], &definition.tag) {
                    let cells = columns
                        .iter()
                        .map(|code| {
                            row.find(code)
                                .map(|entry| format_entry(entry, definitions, config))
                                .unwrap_or_default()
                        })
                        .collect();
                    done.extend(row.tags().cloned());

                    if let Some(path) = row.cycle() {
                        if cycles.insert(path.clone()) {
                            diagnostics.push(cycle_diagnostic(path, definitions));
                        }
                    }

                    rows.push(TableRow {
                        cells,
                        tags: row.tags().cloned().collect(),
                        missing: row.missing().map(str::to_string),
                    });
                }
                done.insert(definition.tag.clone());
            }
        }

        debug!(%title, rows = rows.len(), "built trace table");
        Self {
            title,
            columns,
            header,
            rows,
            diagnostics,
        }
    }

    /// Rows that end in a missing-coverage marker
    pub fn missing_count(&self) -> usize {
        self.rows.iter().filter(|row| row.missing.is_some()).count()
    }
}

/// The two tables produced per run
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct TraceReport {
    pub requirements: TraceTable,
    pub design: TraceTable,
}

impl TraceReport {
    pub fn generate(scan: &ScanResult, config: &TraceConfig) -> Self {
        let report = Self {
            requirements: TraceTable::build(
                "Requirement Tracing",
                &scan.definitions,
                &scan.relationships,
                &config.requirement_rules,
                config,
            ),
            design: TraceTable::build(
                "Design Tracing",
                &scan.definitions,
                &scan.relationships,
                &config.design_rules,
                config,
            ),
        };
        info!(
            definitions = scan.definitions.len(),
            relationships = scan.relationships.len(),
            missing = report.missing_count(),
            "generated trace report"
        );
        report
    }

    pub fn tables(&self) -> [&TraceTable; 2] {
        [&self.requirements, &self.design]
    }

    pub fn missing_count(&self) -> usize {
        self.tables().iter().map(|t| t.missing_count()).sum()
    }
}

/// Render one row entry as a cross-reference cell.
pub fn format_entry(entry: &RowEntry, definitions: &Definitions, config: &TraceConfig) -> String {
    let RowEntry::Tag(tag) = entry else {
        return entry.to_string();
    };
    let type_code = tag.type_code();

    if config.is_primary(type_code) {
        if let Some(definition) = definitions.get(tag) {
            let label = if definition.text.is_empty() {
                tag.to_string()
            } else {
                format!("{tag} {}", escape_link_text(&definition.text))
            };
            return format!(
                "<a id=\"{tag}\"></a>[{label}]({}#{tag})",
                definition.document
            );
        }
    }

    if config.is_implementation(type_code) {
        if let Some(location) = tag.location() {
            return format!(
                "<a id=\"{tag}\"></a>[{}:{}]({}#L{})",
                location.base_name(),
                location.line,
                location.document,
                location.line
            );
        }
    }

    format!("<a id=\"{tag}\"></a>{tag}")
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

fn cycle_diagnostic(path: Vec<Tag>, definitions: &Definitions) -> Diagnostic {
    let (document, line) = path
        .first()
        .and_then(|tag| definitions.get(tag))
        .map(|d| (d.document.clone(), d.line))
        .unwrap_or_default();
    let diagnostic = Diagnostic {
        document,
        line,
        kind: DiagnosticKind::CoverageCycle { path },
    };
    warn!("{diagnostic}");
    diagnostic
}
