//! # Representation Registry — Closed Set of External Encodings
//!
//! Every schema declares, per dialect, which of these representation kinds
//! it can convert to and from. The set is closed: adding a kind forces every
//! exhaustive `match` in the workspace to handle it.
//!
//! | Kind | Symbolic name | MIME type |
//! |------|---------------|-----------|
//! | Native | `native` | — (in-memory keyed mapping) |
//! | SerializedBytes | `serialized-bytes` | `application/octet-stream` |
//! | Json | `json` | `application/json` |
//! | Xml | `xml` | `application/xml` |
//! | Sql | `sql` | `application/sql` |
//! | Html | `html` | `text/html` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A well-known external representation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Representation {
    /// In-memory keyed mapping; never serialized.
    Native,
    /// Opaque byte serialization of the native form.
    SerializedBytes,
    /// UTF-8 JSON text of an object keyed by element name.
    Json,
    /// XML document.
    Xml,
    /// SQL statement text.
    Sql,
    /// HTML fragment.
    Html,
}

impl Representation {
    /// All representation kinds in canonical order.
    pub fn all() -> &'static [Representation] {
        &[
            Self::Native,
            Self::SerializedBytes,
            Self::Json,
            Self::Xml,
            Self::Sql,
            Self::Html,
        ]
    }

    /// Stable symbolic name, matching the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::SerializedBytes => "serialized-bytes",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Sql => "sql",
            Self::Html => "html",
        }
    }

    /// MIME type of the encoded form, if the kind is ever put on the wire.
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            Self::Native => None,
            Self::SerializedBytes => Some("application/octet-stream"),
            Self::Json => Some("application/json"),
            Self::Xml => Some("application/xml"),
            Self::Sql => Some("application/sql"),
            Self::Html => Some("text/html"),
        }
    }

    /// Look up a kind by MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|r| r.mime_type() == Some(mime))
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized symbolic representation name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown representation: {0:?}")]
pub struct UnknownRepresentation(pub String);

impl FromStr for Representation {
    type Err = UnknownRepresentation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRepresentation(s.to_string()))
    }
}

/// The fixed set of representations a schema class supports.
///
/// Declared once per dialect as a constant; it is a property of the schema
/// type, not of individual schema instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepresentationSet(&'static [Representation]);

impl RepresentationSet {
    /// Wrap a static slice of kinds.
    pub const fn new(kinds: &'static [Representation]) -> Self {
        Self(kinds)
    }

    /// Whether `kind` is a member.
    pub fn contains(&self, kind: Representation) -> bool {
        self.0.contains(&kind)
    }

    /// Iterate members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Representation> + '_ {
        self.0.iter().copied()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RepresentationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}
