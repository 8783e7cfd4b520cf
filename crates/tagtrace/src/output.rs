//! Output formatting for trace reports

use eyre::Result;
use facet::Facet;
use owo_colors::OwoColorize;
use tagtrace_core::{Diagnostic, ScanResult, TraceConfig, TraceReport, TraceTable};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Some(Self::Markdown),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render both tables plus scan diagnostics in the specified format
pub fn render_report(
    scan: &ScanResult,
    report: &TraceReport,
    config: &TraceConfig,
    format: OutputFormat,
    verbose: bool,
) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(render_markdown(scan, report)),
        OutputFormat::Text => Ok(render_text(scan, report, config, verbose)),
        OutputFormat::Json => render_json(scan, report),
    }
}

fn render_markdown(scan: &ScanResult, report: &TraceReport) -> String {
    let mut output = String::new();

    for table in report.tables() {
        output.push_str(&format!("## {}\n\n", table.title));
        output.push_str(&markdown_table(table));
        output.push('\n');

        if !table.diagnostics.is_empty() {
            output.push_str("### Diagnostics\n\n");
            push_diagnostics(&mut output, &table.diagnostics);
            output.push('\n');
        }
    }

    if !scan.diagnostics.is_empty() {
        output.push_str("## Diagnostics\n\n");
        push_diagnostics(&mut output, &scan.diagnostics);
        output.push('\n');
    }

    output
}

/// GitHub-flavored pipe table
pub fn markdown_table(table: &TraceTable) -> String {
    let mut output = String::new();

    let header: Vec<String> = table.header.iter().map(|h| escape_cell(h)).collect();
    output.push_str(&format!("| {} |\n", header.join(" | ")));
    output.push_str(&format!("|{}\n", " --- |".repeat(header.len())));

    for row in &table.rows {
        let cells: Vec<String> = row.cells.iter().map(|c| escape_cell(c)).collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    output
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
}

fn push_diagnostics(output: &mut String, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        output.push_str(&format!("- {}\n", diagnostic));
    }
}

fn render_text(
    scan: &ScanResult,
    report: &TraceReport,
    config: &TraceConfig,
    verbose: bool,
) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str(&format!(
        "Scanned {} definitions and {} relationships\n",
        scan.definitions.len().to_string().green(),
        scan.relationships.len().to_string().green()
    ));

    for table in report.tables() {
        output.push('\n');
        output.push_str(&format!("{} {}\n", "##".bold(), table.title.cyan().bold()));

        let missing = table.missing_count();
        let missing_str = if missing == 0 {
            missing.to_string().green().to_string()
        } else {
            missing.to_string().yellow().to_string()
        };
        output.push_str(&format!(
            "Rows: {} ({} with missing coverage)\n",
            table.rows.len(),
            missing_str
        ));

        // Gaps: the last tag on the row lacks coverage of the missing type
        for row in &table.rows {
            if let (Some(missing), Some(last)) = (&row.missing, row.tags.last()) {
                output.push_str(&format!(
                    "  {} {} has no {}\n",
                    "?".yellow().bold(),
                    last.as_str().yellow(),
                    config.type_name(missing)
                ));
            }
        }

        if verbose {
            for row in &table.rows {
                let chain: Vec<&str> = row.tags.iter().map(|t| t.as_str()).collect();
                output.push_str(&format!("  {}\n", chain.join(" -> ").dimmed()));
            }
        }

        for diagnostic in &table.diagnostics {
            output.push_str(&format!("  {} {}\n", "!".red().bold(), diagnostic));
        }
    }

    if !scan.diagnostics.is_empty() {
        output.push('\n');
        output.push_str(&format!(
            "{} {} diagnostics:\n",
            "!".yellow().bold(),
            scan.diagnostics.len()
        ));
        for diagnostic in &scan.diagnostics {
            output.push_str(&format!("  {} {}\n", "-".yellow(), diagnostic));
        }
    }

    output
}

#[derive(Facet)]
struct JsonReport {
    definitions: usize,
    relationships: usize,
    tables: Vec<TraceTable>,
    diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Facet)]
struct JsonDiagnostic {
    document: String,
    line: usize,
    message: String,
}

fn render_json(scan: &ScanResult, report: &TraceReport) -> Result<String> {
    let json_report = JsonReport {
        definitions: scan.definitions.len(),
        relationships: scan.relationships.len(),
        tables: report.tables().into_iter().cloned().collect(),
        diagnostics: scan
            .diagnostics
            .iter()
            .chain(report.tables().into_iter().flat_map(|t| &t.diagnostics))
            .map(|d| JsonDiagnostic {
                document: d.document.clone(),
                line: d.line,
                message: d.to_string(),
            })
            .collect(),
    };

    facet_json::to_string_pretty(&json_report)
        .map_err(|e| eyre::eyre!("JSON serialization failed: {}", e))
}
