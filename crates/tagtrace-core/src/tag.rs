use facet::Facet;
use std::fmt::{Display, Formatter};

/// Maximum number of characters in the type code of a tag.
pub const MAX_TYPE_LEN: usize = 3;

/// Maximum number of characters in the id suffix of a tag.
pub const MAX_SUFFIX_LEN: usize = 8;

/// Identifier of one tracked item, e.g. `R12`, `TR3.1` or the synthetic
/// `I:src/main.rs:40` minted for an anonymous reference.
///
/// Equality is plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Facet)]
#[facet(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a tag id as written inside a bracket annotation.
    ///
    /// Returns `None` unless `id` is 1-3 type characters (an uppercase letter
    /// followed by uppercase letters or digits) and up to 8 digits or dots.
    pub fn parse(id: &str) -> Option<Self> {
        is_tag_id(id).then(|| Self(id.to_string()))
    }

    /// Synthesize the unique tag standing in for an anonymous reference.
    pub fn anonymous(type_code: &str, document: &str, line: usize) -> Self {
        Self(format!("{type_code}:{document}:{line}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading run of uppercase letters.
    pub fn type_code(&self) -> &str {
        type_of(&self.0)
    }

    /// Everything after the type code.
    pub fn id_suffix(&self) -> &str {
        id_suffix(&self.0)
    }

    /// A tag without an id suffix must be resolved to a synthetic tag before use.
    pub fn is_anonymous(&self) -> bool {
        self.id_suffix().is_empty()
    }

    /// Document and line embedded in a synthetic anonymous tag.
    pub fn location(&self) -> Option<TagLocation<'_>> {
        let rest = self.id_suffix().strip_prefix(':')?;
        let (document, line) = rest.rsplit_once(':')?;
        if document.is_empty() {
            return None;
        }
        let line = line.parse().ok()?;
        Some(TagLocation { document, line })
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<Tag> for &str {
    fn eq(&self, other: &Tag) -> bool {
        *self == other.0
    }
}

/// Source location recovered from a synthetic tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLocation<'a> {
    pub document: &'a str,
    /// 1-indexed
    pub line: usize,
}

impl TagLocation<'_> {
    /// File name without its directory components.
    pub fn base_name(&self) -> &str {
        self.document
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.document)
    }
}

/// Type code of a tag string: its leading run of uppercase letters.
pub fn type_of(tag: &str) -> &str {
    let end = tag
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(tag.len());
    &tag[..end]
}

/// Id suffix of a tag string: whatever follows the type code.
pub fn id_suffix(tag: &str) -> &str {
    &tag[type_of(tag).len()..]
}

/// Check a candidate against `TYPE id-suffix?`.
pub fn is_tag_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    if bytes.first().is_none_or(|b| !b.is_ascii_uppercase()) {
        return false;
    }

    // The type may absorb up to two trailing digits, so try each split.
    (1..=MAX_TYPE_LEN.min(bytes.len())).any(|split| {
        let (head, suffix) = bytes.split_at(split);
        head[1..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
            && suffix.len() <= MAX_SUFFIX_LEN
            && suffix.iter().all(|b| b.is_ascii_digit() || *b == b'.')
    })
}
