//! Integration tests: fixture documents through scanning and both reports

use std::path::Path;
use tagtrace_core::{
    DiagnosticKind, MemorySources, ScanResult, Tag, TraceConfig, TraceReport, TraceTable, scan,
};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

const FIXTURES: &[&str] = &[
    "hazards.md",
    "requirements.md",
    "design.md",
    "tests.md",
    "src/valve.rs",
];

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(Path::new(FIXTURES_DIR).join(name))
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", name, e))
}

fn scan_fixtures() -> ScanResult {
    let sources = FIXTURES
        .iter()
        .fold(MemorySources::new(), |sources, name| {
            sources.add(*name, read_fixture(name))
        });
    scan(sources).expect("memory sources never fail")
}

/// The tag behind each cell (or the raw marker / empty string)
fn cell_tags(table: &TraceTable) -> Vec<Vec<String>> {
    table
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| match cell.strip_prefix("<a id=\"") {
                    Some(rest) => rest.split('"').next().unwrap_or("").to_string(),
                    None => cell.clone(),
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_fixture_definitions() {
    let result = scan_fixtures();

    assert!(
        result.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        result.diagnostics
    );

    let ids: Vec<String> = result.definitions.iter().map(|d| d.tag.to_string()).collect();
    assert_eq!(
        ids,
        vec![
            "H1",
            "H2",
            "H3",
            "R1",
            "R2",
            "R3",
            "D1",
            "D2",
            "T1",
            "T2",
            "TR1",
            "I:src/valve.rs:2",
        ]
    );

    let r1 = result.definitions.get(&Tag::new("R1")).unwrap();
    assert_eq!(r1.document, "requirements.md");
    assert_eq!(r1.line, 3);
    assert_eq!(r1.text, "The relief valve shall open above 8 bar.");

    let r2 = result.definitions.get(&Tag::new("R2")).unwrap();
    assert_eq!(r2.text, "Pressure shall be displayed to the operator.");
}

#[test]
fn test_fixture_relationships_carry_context() {
    let result = scan_fixtures();
    let pairs: Vec<(String, String)> = result
        .relationships
        .iter()
        .map(|r| {
            (
                r.source.to_string(),
                r.target.as_ref().map(Tag::to_string).unwrap_or_default(),
            )
        })
        .collect();

    let expect = |s: &str, t: &str| (s.to_string(), t.to_string());
    assert_eq!(
        pairs,
        vec![
            expect("R1", "H1"),
            expect("R2", "H1"),
            expect("R2", "H2"),
            expect("R3", "H2"),
            expect("D1", "R1"),
            expect("D2", "R2"),
            expect("T1", "R1"),
            expect("T1", "D1"),
            expect("T2", "R2"),
            expect("TR1", "T1"),
            expect("I:src/valve.rs:2", "D1"),
        ]
    );
}

#[test]
fn test_requirement_tracing_report() {
    let result = scan_fixtures();
    let report = TraceReport::generate(&result, &TraceConfig::default());
    let table = &report.requirements;

    assert_eq!(table.columns, vec!["H", "R", "D", "T", "TR"]);
    assert_eq!(
        cell_tags(table),
        vec![
            vec!["H1", "R1", "D1", "", ""],
            vec!["H1", "R1", "", "T1", "TR1"],
            vec!["H1", "R2", "D2", "", ""],
            vec!["H1", "R2", "", "T2", "TR? ⚠️"],
            vec!["H2", "R2", "D2", "", ""],
            vec!["H2", "R2", "", "T2", "TR? ⚠️"],
            vec!["H2", "R3", "D? ⚠️", "", ""],
            vec!["H2", "R3", "", "T? ⚠️", ""],
            vec!["H3", "R? ⚠️", "", "", ""],
        ]
    );
    assert_eq!(table.missing_count(), 5);

    assert_eq!(
        table.rows[0].cells[0],
        "<a id=\"H1\"></a>[H1 Tank overpressure leads to rupture.](hazards.md#H1)"
    );
}

#[test]
fn test_design_tracing_report() {
    let result = scan_fixtures();
    let report = TraceReport::generate(&result, &TraceConfig::default());
    let table = &report.design;

    assert_eq!(
        table.header,
        vec!["Design Specification", "Implementation", "Test", "Test Record"]
    );
    assert_eq!(
        cell_tags(table),
        vec![
            vec!["D1", "I:src/valve.rs:2", "", ""],
            vec!["D1", "", "T1", "TR1"],
            vec!["D2", "I? ⚠️", "", ""],
            vec!["D2", "", "T? ⚠️", ""],
            vec!["", "", "T2", "TR? ⚠️"],
        ]
    );
    assert_eq!(
        table.rows[0].cells[1],
        "<a id=\"I:src/valve.rs:2\"></a>[valve.rs:2](src/valve.rs#L2)"
    );
    assert_eq!(report.missing_count(), 8);
}

#[test]
fn test_every_definition_reaches_the_table() {
    let result = scan_fixtures();
    let config = TraceConfig::default();
    let report = TraceReport::generate(&result, &config);

    for definition in result.definitions.iter() {
        let tag = definition.tag.as_str();
        let anchor = format!("<a id=\"{tag}\">");
        let found = report.tables().iter().any(|table| {
            table
                .rows
                .iter()
                .any(|row| row.cells.iter().any(|cell| cell.starts_with(&anchor)))
        });
        assert!(found, "{tag} does not appear in any report");
    }
}

#[test]
fn test_custom_rule_graph_with_cycle() {
    let result = scan(
        MemorySources::new()
            .add("a.md", "[R1:] first [=>R2]")
            .add("b.md", "[R2:] second [=>R1]"),
    )
    .unwrap();

    let config = TraceConfig {
        requirement_rules: tagtrace_core::RuleGraph::from_table(&[("R", &["R"])]),
        ..TraceConfig::default()
    };
    let report = TraceReport::generate(&result, &config);

    assert_eq!(report.requirements.rows.len(), 1);
    let cycles: Vec<_> = report
        .requirements
        .diagnostics
        .iter()
        .filter(|d| matches!(d.kind, DiagnosticKind::CoverageCycle { .. }))
        .collect();
    assert_eq!(cycles.len(), 1);
    assert_eq!(
        cycles[0].to_string(),
        "a.md:1: coverage cycle detected: R1 -> R2 -> R1"
    );
}
