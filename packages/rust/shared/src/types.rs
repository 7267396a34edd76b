//! Core domain types for termdeck decks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// The front side of a card: one trimmed, non-empty line of input.
///
/// Comparison is exact-string on the trimmed text, so `"MVP"` and `"mvp"`
/// are different terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Term(String);

impl Term {
    /// Trim `raw` and wrap it. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Term {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// CardModel
// ---------------------------------------------------------------------------

/// A single (term, definition) pair destined for one note and one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEntry {
    pub term: String,
    pub definition: String,
}

impl CardEntry {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}

/// Ordered card content, independent of the output format.
///
/// Entry order is input order. Duplicate terms stay as separate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardModel {
    entries: Vec<CardEntry>,
}

impl CardModel {
    pub fn new(entries: Vec<CardEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CardEntry> for CardModel {
    fn from_iter<I: IntoIterator<Item = CardEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection enums
// ---------------------------------------------------------------------------

/// Which writer receives the finished [`CardModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Plain-text dump, one term/definition pair per block.
    Debug,
    /// Importable flashcard package.
    #[default]
    Package,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Package => "package",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "package" => Ok(Self::Package),
            other => Err(format!(
                "unknown output mode '{other}': expected 'debug' or 'package'"
            )),
        }
    }
}

/// Which definition source backs the fetch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Canned definitions, no network.
    Stub,
    /// OpenAI-compatible chat-completions endpoint.
    #[default]
    External,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::External => "external",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "stub" => Ok(Self::Stub),
            "external" => Ok(Self::External),
            other => Err(format!(
                "unknown provider '{other}': expected 'stub' or 'external'"
            )),
        }
    }
}
