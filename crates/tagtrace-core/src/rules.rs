//! Coverage rules and the engine that checks them
//!
//! A [`RuleGraph`] says which types must cover a tag of a given type: with
//! `R -> [D, T]` every requirement needs at least one design spec and at
//! least one test pointing at it. Whether several covering items are enough
//! is left to a reviewer; only the zero-coverage case is flagged.

use crate::scanner::Relationship;
use crate::tag::Tag;
use facet::Facet;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Requirement tracing: hazards down to test records.
pub const REQUIREMENT_TRACING: &[(&str, &[&str])] = &[
    ("H", &["R"]),
    ("R", &["D", "T"]),
    ("D", &[]),
    ("T", &["TR"]),
    ("TR", &[]),
];

/// Design tracing: design specs down to code and test records.
pub const DESIGN_TRACING: &[(&str, &[&str])] = &[
    ("D", &["I", "T"]),
    ("I", &[]),
    ("T", &["TR"]),
    ("TR", &[]),
];

pub const TYPE_NAMES: &[(&str, &str)] = &[
    ("H", "Hazard"),
    ("R", "Requirement"),
    ("D", "Design Specification"),
    ("T", "Test"),
    ("TR", "Test Record"),
    ("I", "Implementation"),
];

pub const PRIMARY_TYPES: &[&str] = &["H", "R", "D", "T", "TR"];

pub const IMPLEMENTATION_TYPE: &str = "I";

/// Types that must cover one type
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct TypeRule {
    pub type_code: String,
    #[facet(default)]
    pub covered_by: Vec<String>,
}

/// Ordered type-dependency graph. Key order is also report column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Facet)]
#[facet(transparent)]
pub struct RuleGraph(Vec<TypeRule>);

impl RuleGraph {
    pub fn new(rules: Vec<TypeRule>) -> Self {
        Self(rules)
    }

    pub fn from_table(table: &[(&str, &[&str])]) -> Self {
        Self::new(
            table
                .iter()
                .map(|(type_code, covered_by)| TypeRule {
                    type_code: type_code.to_string(),
                    covered_by: covered_by.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        )
    }

    pub fn requirement_tracing() -> Self {
        Self::from_table(REQUIREMENT_TRACING)
    }

    pub fn design_tracing() -> Self {
        Self::from_table(DESIGN_TRACING)
    }

    /// Type codes in key order
    pub fn type_codes(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|rule| rule.type_code.as_str())
    }

    /// Types required to cover `type_code`; empty when it is terminal or unknown
    pub fn required(&self, type_code: &str) -> &[String] {
        self.0
            .iter()
            .find(|rule| rule.type_code == type_code)
            .map(|rule| rule.covered_by.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_terminal(&self, type_code: &str) -> bool {
        self.required(type_code).is_empty()
    }

}

/// Display name for a type code
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct TypeName {
    pub type_code: String,
    pub name: String,
}

/// Everything that parameterizes report generation
///
/// Built once and passed by reference; runs never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct TraceConfig {
    pub requirement_rules: RuleGraph,
    pub design_rules: RuleGraph,
    pub type_names: Vec<TypeName>,
    /// Types defined in documents, rendered as links to their definition
    pub primary_types: Vec<String>,
    /// Type of anonymous code annotations, rendered as links to a code location
    pub implementation_type: String,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            requirement_rules: RuleGraph::requirement_tracing(),
            design_rules: RuleGraph::design_tracing(),
            type_names: TYPE_NAMES
                .iter()
                .map(|(type_code, name)| TypeName {
                    type_code: type_code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            primary_types: PRIMARY_TYPES.iter().map(|t| t.to_string()).collect(),
            implementation_type: IMPLEMENTATION_TYPE.to_string(),
        }
    }
}

impl TraceConfig {
    /// Human-readable name, falling back to the code itself
    pub fn type_name<'a>(&'a self, type_code: &'a str) -> &'a str {
        self.type_names
            .iter()
            .find(|t| t.type_code == type_code)
            .map(|t| t.name.as_str())
            .unwrap_or(type_code)
    }

    pub fn is_primary(&self, type_code: &str) -> bool {
        self.primary_types.iter().any(|t| t == type_code)
    }

    pub fn is_implementation(&self, type_code: &str) -> bool {
        self.implementation_type == type_code
    }
}

/// Covering tags of one required type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement<'a> {
    pub type_code: &'a str,
    /// In relationship-list order
    pub sources: Vec<&'a Tag>,
}

impl Requirement<'_> {
    pub fn is_satisfied(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// One element of a coverage row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Facet)]
#[repr(u8)]
pub enum RowEntry {
    Tag(Tag),
    /// No tag of this type covers the previous entry
    Missing(String),
    /// The chain came back to this tag
    Cycle(Tag),
}

impl RowEntry {
    pub fn type_code(&self) -> &str {
        match self {
            RowEntry::Tag(tag) | RowEntry::Cycle(tag) => tag.type_code(),
            RowEntry::Missing(type_code) => type_code,
        }
    }

    pub fn tag(&self) -> Option<&Tag> {
        match self {
            RowEntry::Tag(tag) | RowEntry::Cycle(tag) => Some(tag),
            RowEntry::Missing(_) => None,
        }
    }
}

impl Display for RowEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RowEntry::Tag(tag) => write!(f, "{tag}"),
            RowEntry::Missing(type_code) => write!(f, "{type_code}? ⚠️"),
            RowEntry::Cycle(tag) => write!(f, "{tag} ↻"),
        }
    }
}

/// One path from a root tag down through coverage links
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
#[facet(transparent)]
pub struct CoverageRow(Vec<RowEntry>);

impl CoverageRow {
    pub fn entries(&self) -> &[RowEntry] {
        &self.0
    }

    /// Tags on the row, without markers
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter().filter_map(|entry| match entry {
            RowEntry::Tag(tag) => Some(tag),
            _ => None,
        })
    }

    /// First entry whose type code is `type_code`
    pub fn find(&self, type_code: &str) -> Option<&RowEntry> {
        self.0.iter().find(|entry| entry.type_code() == type_code)
    }

    /// The type whose coverage is missing, if the row ends in a gap
    pub fn missing(&self) -> Option<&str> {
        match self.0.last() {
            Some(RowEntry::Missing(type_code)) => Some(type_code),
            _ => None,
        }
    }

    /// The closed loop, if the row ends by revisiting a tag
    ///
    /// The loop is rotated to start at its smallest tag, so the same loop
    /// entered from different tags yields the same path.
    pub fn cycle(&self) -> Option<Vec<Tag>> {
        let Some(RowEntry::Cycle(repeated)) = self.0.last() else {
            return None;
        };
        let start = self.tags().position(|tag| tag == repeated)?;
        let mut path: Vec<Tag> = self.tags().skip(start).cloned().collect();
        let smallest = path
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(i, _)| i)?;
        path.rotate_left(smallest);
        path.push(path[0].clone());
        Some(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<RowEntry>> for CoverageRow {
    fn from(entries: Vec<RowEntry>) -> Self {
        Self(entries)
    }
}

enum Work {
    Visit { path: Vec<Tag>, target: Tag },
    Emit(CoverageRow),
}

/// Checks coverage of tags against one rule graph
pub struct CoverageEngine<'a> {
    rules: &'a RuleGraph,
    /// Sources per target, in relationship-list order
    covering: HashMap<&'a Tag, Vec<&'a Tag>>,
}

impl<'a> CoverageEngine<'a> {
    pub fn new(relationships: &'a [Relationship], rules: &'a RuleGraph) -> Self {
        let mut covering: HashMap<&'a Tag, Vec<&'a Tag>> = HashMap::new();
        for rel in relationships {
            if let Some(target) = &rel.target {
                covering.entry(target).or_default().push(&rel.source);
            }
        }
        Self { rules, covering }
    }

    /// Covering tags of `target`, per required type, in rule order
    pub fn assess(&self, target: &Tag) -> Vec<Requirement<'a>> {
        let sources = self.covering.get(target);
        self.rules
            .required(target.type_code())
            .iter()
            .map(|type_code| Requirement {
                type_code: type_code.as_str(),
                sources: sources
                    .into_iter()
                    .flatten()
                    .filter(|source| source.type_code() == type_code)
                    .copied()
                    .collect(),
            })
            .collect()
    }

    /// Expand `target` into coverage rows, each starting with `prefix`.
    ///
    /// Depth-first with an explicit stack, so rows come out in the same order
    /// as a recursive walk would produce them. A tag that reappears on its own
    /// chain ends that row with [`RowEntry::Cycle`].
    pub fn rows(&self, prefix: &[Tag], target: &Tag) -> Vec<CoverageRow> {
        let mut rows = Vec::new();
        let mut stack = vec![Work::Visit {
            path: prefix.to_vec(),
            target: target.clone(),
        }];

        while let Some(work) = stack.pop() {
            let (mut path, target) = match work {
                Work::Emit(row) => {
                    rows.push(row);
                    continue;
                }
                Work::Visit { path, target } => (path, target),
            };

            if path.contains(&target) {
                rows.push(row_of(&path, RowEntry::Cycle(target)));
                continue;
            }

            if self.rules.is_terminal(target.type_code()) {
                rows.push(row_of(&path, RowEntry::Tag(target)));
                continue;
            }

            let requirements = self.assess(&target);
            path.push(target);

            let mut pending = Vec::new();
            for requirement in requirements {
                if requirement.sources.is_empty() {
                    let gap = RowEntry::Missing(requirement.type_code.to_string());
                    pending.push(Work::Emit(row_of(&path, gap)));
                }
                for source in requirement.sources {
                    pending.push(Work::Visit {
                        path: path.clone(),
                        target: source.clone(),
                    });
                }
            }
            stack.extend(pending.into_iter().rev());
        }

        rows
    }
}

fn row_of(path: &[Tag], last: RowEntry) -> CoverageRow {
    let mut entries: Vec<RowEntry> = path.iter().cloned().map(RowEntry::Tag).collect();
    entries.push(last);
    CoverageRow(entries)
}
