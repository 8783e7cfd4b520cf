//! Document scanning: definitions and coverage relationships
//!
//! The scanner walks documents line by line and keeps one piece of state
//! across lines *and* documents: the most recently resolved left-hand tag,
//! which an annotation like `[=>H1]` inherits.

use crate::lexer::{TagOp, extract, strip_tags};
use crate::sources::Document;
use crate::tag::Tag;
use facet::Facet;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use tracing::{debug, trace, warn};

/// Declaration of a tag at a document location
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct Definition {
    pub tag: Tag,
    /// Identifier of the document holding the definition
    pub document: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// The line with all annotations removed
    pub text: String,
}

/// `source` covers/addresses `target`
///
/// The target is kept even when it was omitted or is never defined, so the
/// gap stays visible in reports.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct Relationship {
    pub source: Tag,
    pub target: Option<Tag>,
    pub document: String,
    pub line: usize,
}

/// Non-fatal problem found while scanning or building reports
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct Diagnostic {
    pub document: String,
    /// Line number (1-indexed), 0 when not tied to a line
    pub line: usize,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Facet)]
#[repr(u8)]
pub enum DiagnosticKind {
    /// Annotation without a left tag and nothing to inherit one from
    MissingLeft { op: TagOp, right: Option<Tag> },
    /// Second `:` for a tag that is already defined; the first one is kept
    DuplicateDefinition {
        tag: Tag,
        first_document: String,
        first_line: usize,
    },
    /// `=>` without a right-hand tag
    MissingTarget { source: Tag },
    /// `=>` pointing at a tag no scanned document defines
    UndefinedTarget { source: Tag, target: Tag },
    /// Coverage chain that leads back to a tag already on the chain
    CoverageCycle { path: Vec<Tag> },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.line > 0 {
            write!(f, "{}:{}: ", self.document, self.line)?;
        } else if !self.document.is_empty() {
            write!(f, "{}: ", self.document)?;
        }
        match &self.kind {
            DiagnosticKind::MissingLeft { op, right } => match right {
                Some(right) => write!(f, "missing left-hand side in [{op}{right}]"),
                None => write!(f, "missing left-hand side in [{op}]"),
            },
            DiagnosticKind::DuplicateDefinition {
                tag,
                first_document,
                first_line,
            } => write!(
                f,
                "duplicate definition of {tag} (first defined at {first_document}:{first_line})"
            ),
            DiagnosticKind::MissingTarget { source } => {
                write!(f, "{source} covers nothing: [=>] has no right-hand tag")
            }
            DiagnosticKind::UndefinedTarget { source, target } => {
                write!(f, "{source} covers {target}, which is never defined")
            }
            DiagnosticKind::CoverageCycle { path } => {
                let chain: Vec<&str> = path.iter().map(Tag::as_str).collect();
                write!(f, "coverage cycle detected: {}", chain.join(" -> "))
            }
        }
    }
}

/// Definitions in the order they were encountered, indexed by tag
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    entries: Vec<Definition>,
    index: HashMap<Tag, usize>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: &Tag) -> Option<&Definition> {
        self.index.get(tag).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.index.contains_key(tag)
    }

    /// Add a definition unless the tag is already defined; returns the
    /// existing definition in that case.
    pub fn insert(&mut self, definition: Definition) -> Result<(), &Definition> {
        if let Some(&i) = self.index.get(&definition.tag) {
            return Err(&self.entries[i]);
        }
        self.index.insert(definition.tag.clone(), self.entries.len());
        self.entries.push(definition);
        Ok(())
    }

    /// All definitions in definition order
    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.entries.iter()
    }

    /// Definitions of one type code, in definition order
    pub fn of_type<'a>(&'a self, type_code: &'a str) -> impl Iterator<Item = &'a Definition> {
        self.entries
            .iter()
            .filter(move |d| d.tag.type_code() == type_code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything one scan produced
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub definitions: Definitions,
    pub relationships: Vec<Relationship>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanResult {
    /// Scan documents in order, sharing carry-over context between them.
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut scanner = Scanner::new();
        for document in documents {
            scanner.scan_document(&document.id, &document.content);
        }
        scanner.finish()
    }
}

/// Incremental scanner; feed it lines or whole documents, then [`finish`](Scanner::finish).
#[derive(Debug, Default)]
pub struct Scanner {
    /// Most recently resolved left-hand tag
    carried: Option<Tag>,
    result: ScanResult,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan_document(&mut self, document: &str, content: &str) {
        for (idx, line) in content.lines().enumerate() {
            self.scan_line(document, idx + 1, line);
        }
    }

    pub fn scan_line(&mut self, document: &str, line_number: usize, line: &str) {
        for tag_ref in extract(line) {
            trace!(document, line = line_number, ?tag_ref, "annotation");

            let Some(left) = tag_ref.left.or_else(|| self.carried.clone()) else {
                self.report(
                    document,
                    line_number,
                    DiagnosticKind::MissingLeft {
                        op: tag_ref.op,
                        right: tag_ref.right,
                    },
                );
                continue;
            };

            let left = if left.is_anonymous() {
                let tag = Tag::anonymous(left.type_code(), document, line_number);
                if !self.result.definitions.contains(&tag) {
                    self.define(document, line_number, line, tag.clone());
                }
                tag
            } else {
                if tag_ref.op == TagOp::Define {
                    if let Some(first) = self.result.definitions.get(&left) {
                        let kind = DiagnosticKind::DuplicateDefinition {
                            tag: left.clone(),
                            first_document: first.document.clone(),
                            first_line: first.line,
                        };
                        self.report(document, line_number, kind);
                    } else {
                        self.define(document, line_number, line, left.clone());
                    }
                }
                left
            };

            if tag_ref.op == TagOp::Cover {
                if tag_ref.right.is_none() {
                    self.report(
                        document,
                        line_number,
                        DiagnosticKind::MissingTarget {
                            source: left.clone(),
                        },
                    );
                }
                debug!(source = %left, covers = ?tag_ref.right, "relationship");
                self.result.relationships.push(Relationship {
                    source: left.clone(),
                    target: tag_ref.right,
                    document: document.to_string(),
                    line: line_number,
                });
            }

            self.carried = Some(left);
        }
    }

    /// Check relationship targets against the complete set of definitions
    /// and hand back the indices.
    pub fn finish(mut self) -> ScanResult {
        let undefined: Vec<Diagnostic> = self
            .result
            .relationships
            .iter()
            .filter_map(|rel| {
                let target = rel.target.as_ref()?;
                if self.result.definitions.contains(target) {
                    return None;
                }
                Some(Diagnostic {
                    document: rel.document.clone(),
                    line: rel.line,
                    kind: DiagnosticKind::UndefinedTarget {
                        source: rel.source.clone(),
                        target: target.clone(),
                    },
                })
            })
            .collect();

        for diagnostic in &undefined {
            warn!("{diagnostic}");
        }
        self.result.diagnostics.extend(undefined);
        self.result
    }

    fn define(&mut self, document: &str, line_number: usize, line: &str, tag: Tag) {
        debug!(%tag, document, line = line_number, "definition");
        // The caller has already checked for an existing definition
        let _ = self.result.definitions.insert(Definition {
            tag,
            document: document.to_string(),
            line: line_number,
            text: strip_tags(line),
        });
    }

    fn report(&mut self, document: &str, line: usize, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            document: document.to_string(),
            line,
            kind,
        };
        warn!("{diagnostic}");
        self.result.diagnostics.push(diagnostic);
    }
}
