//! Document providers
//!
//! Scanning order matters (left-hand context carries over from one document
//! to the next), so every provider hands documents back in a defined order.

use eyre::{Result, WrapErr};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// One input document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identifier used in definitions, diagnostics and link targets
    pub id: String,
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// File extensions picked up when walking a directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "md",       // Markdown
    "markdown", // Markdown
    "txt",      // Plain text
    "rst",      // reStructuredText
    "adoc",     // AsciiDoc
    "rs",       // Rust
    "c",        // C
    "h",        // C headers
    "cpp",      // C++
    "hpp",      // C++ headers
    "py",       // Python
    "go",       // Go
    "java",     // Java
    "ts",       // TypeScript
    "js",       // JavaScript
    "sh",       // Shell
];

/// Check if a file extension is supported for scanning
pub fn is_supported_extension(ext: &OsStr) -> bool {
    ext.to_str()
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Trait for providing the documents to scan
pub trait Sources {
    /// Load all documents, in scanning order
    fn documents(self) -> Result<Vec<Document>>;
}

/// Sources from an explicit list of file paths, scanned in the given order
pub struct PathSources(Vec<PathBuf>);

impl PathSources {
    /// Create from an iterator of paths
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

impl Sources for PathSources {
    fn documents(self) -> Result<Vec<Document>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            // Collecting an indexed parallel iterator keeps the input order
            self.0.par_iter().map(|path| read_document(path)).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.0.iter().map(|path| read_document(path)).collect()
        }
    }
}

fn read_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    Ok(Document::new(document_id(path), content))
}

fn document_id(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// In-memory sources (useful for testing)
#[derive(Default)]
pub struct MemorySources(Vec<Document>);

impl MemorySources {
    /// Create empty memory sources
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a document with content
    pub fn add(mut self, id: impl Into<String>, content: impl Into<String>) -> Self {
        self.0.push(Document::new(id, content));
        self
    }
}

impl Sources for MemorySources {
    fn documents(self) -> Result<Vec<Document>> {
        Ok(self.0)
    }
}

/// Gitignore-aware directory walker
///
/// Documents are identified by their path relative to the root and returned
/// sorted by that path.
#[cfg(feature = "walk")]
pub struct WalkSources {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

#[cfg(feature = "walk")]
impl WalkSources {
    /// Create a walker for the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Add include patterns (e.g., `["docs/**/*.md"]`)
    pub fn include(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add exclude patterns (e.g., `["target/**"]`)
    pub fn exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }
}

#[cfg(feature = "walk")]
fn glob_set(patterns: &[String]) -> Result<globset::GlobSet> {
    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::Glob::new(pattern)
            .wrap_err_with(|| format!("Invalid glob pattern '{}'", pattern))?;
        builder.add(glob);
    }
    builder.build().wrap_err("Failed to build glob set")
}

#[cfg(feature = "walk")]
impl Sources for WalkSources {
    fn documents(self) -> Result<Vec<Document>> {
        use ignore::WalkBuilder;

        let include = glob_set(&self.include)?;
        let exclude = glob_set(&self.exclude)?;

        let walker = WalkBuilder::new(&self.root)
            .follow_links(true)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        let mut found: Vec<(String, PathBuf)> = Vec::new();
        for entry in walker {
            let entry = entry.wrap_err_with(|| format!("Failed to walk {}", self.root.display()))?;
            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|ext| !is_supported_extension(ext)) {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if !self.include.is_empty() && !include.is_match(relative) {
                continue;
            }
            if exclude.is_match(relative) {
                continue;
            }
            found.push((document_id(relative), path.to_path_buf()));
        }
        found.sort();

        let mut documents = Vec::with_capacity(found.len());
        for (id, path) in found {
            match std::fs::read_to_string(&path) {
                Ok(content) => documents.push(Document::new(id, content)),
                // Not text; nothing to scan
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    tracing::debug!(path = %path.display(), "skipping non-UTF-8 file");
                }
                Err(e) => {
                    return Err(e).wrap_err_with(|| format!("Failed to read {}", path.display()));
                }
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sources_keep_order() {
        let docs = MemorySources::new()
            .add("b.md", "[R1:] one")
            .add("a.md", "[R2:] two")
            .documents()
            .unwrap();

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b.md", "a.md"]);
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_extension(OsStr::new("md")));
        assert!(is_supported_extension(OsStr::new("rs")));
        assert!(is_supported_extension(OsStr::new("txt")));

        assert!(!is_supported_extension(OsStr::new("png")));
        assert!(!is_supported_extension(OsStr::new("lock")));
    }

    #[test]
    fn test_path_sources_read_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("z.md");
        let second = dir.path().join("a.md");
        std::fs::write(&first, "[H1:] first").unwrap();
        std::fs::write(&second, "[R1=>H1] second").unwrap();

        let docs = PathSources::new([&first, &second]).documents().unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].id.ends_with("z.md"));
        assert_eq!(docs[1].content, "[R1=>H1] second");
    }

    #[test]
    fn test_path_sources_missing_file() {
        let err = PathSources::new(["definitely/not/here.md"])
            .documents()
            .unwrap_err();
        assert!(err.to_string().contains("definitely/not/here.md"));
    }

    #[cfg(feature = "walk")]
    #[test]
    fn test_walk_sources_filter_and_sort() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::create_dir_all(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("docs/b.md"), "[R1:] b").unwrap();
        std::fs::write(dir.path().join("docs/a.md"), "[H1:] a").unwrap();
        std::fs::write(dir.path().join("docs/image.png"), [0u8, 159, 146, 150]).unwrap();
        std::fs::write(dir.path().join("target/out.md"), "[R9:] built").unwrap();

        let docs = WalkSources::new(dir.path())
            .exclude(["target/**"])
            .documents()
            .unwrap();

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["docs/a.md", "docs/b.md"]);
    }
}
