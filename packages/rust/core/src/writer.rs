//! Output writers: turn a finished [`CardModel`] into a file.

use std::fmt::Write as _;
use std::future::Future;
use std::path::{Path, PathBuf};

use termdeck_artifacts::{PackageSettings, PackageWriter};
use termdeck_shared::{CardModel, DeckConfig, OutputMode, Result, TermDeckError, write_atomic};
use tracing::info;

/// What a writer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: usize,
}

/// Serializes a card model to `dest`.
///
/// Writers either produce the complete file or leave `dest` untouched.
pub trait DeckWriter {
    fn name(&self) -> &'static str;

    fn write(&self, model: &CardModel, dest: &Path) -> impl Future<Output = Result<WriteSummary>>;
}

// ---------------------------------------------------------------------------
// DebugWriter
// ---------------------------------------------------------------------------

/// Plain-text dump of every entry, for eyeballing definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugWriter;

/// Render `model` in the debug text format.
pub fn render_debug(model: &CardModel) -> String {
    let mut out = String::new();
    for entry in model.entries() {
        let _ = write!(
            out,
            "Term: {}\nDefinition: {}\n\n",
            entry.term, entry.definition
        );
    }
    out
}

impl DeckWriter for DebugWriter {
    fn name(&self) -> &'static str {
        "debug"
    }

    async fn write(&self, model: &CardModel, dest: &Path) -> Result<WriteSummary> {
        let text = render_debug(model);
        write_atomic(dest, text.as_bytes()).map_err(|e| TermDeckError::io(dest, e))?;

        info!(path = %dest.display(), entries = model.len(), "debug listing written");

        Ok(WriteSummary {
            path: dest.to_path_buf(),
            entries: model.len(),
            bytes: text.len(),
        })
    }
}

impl DeckWriter for PackageWriter {
    fn name(&self) -> &'static str {
        "package"
    }

    async fn write(&self, model: &CardModel, dest: &Path) -> Result<WriteSummary> {
        let summary = PackageWriter::write(self, model, dest).await?;
        Ok(WriteSummary {
            path: summary.path,
            entries: summary.note_count,
            bytes: summary.bytes,
        })
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The writer chosen by [`OutputMode`].
#[derive(Debug, Clone)]
pub enum OutputWriter {
    Debug(DebugWriter),
    Package(PackageWriter),
}

impl OutputWriter {
    pub fn for_mode(mode: OutputMode, deck: &DeckConfig) -> Self {
        match mode {
            OutputMode::Debug => Self::Debug(DebugWriter),
            OutputMode::Package => Self::Package(PackageWriter::new(PackageSettings::from(deck))),
        }
    }
}

impl DeckWriter for OutputWriter {
    fn name(&self) -> &'static str {
        match self {
            Self::Debug(w) => DeckWriter::name(w),
            Self::Package(w) => DeckWriter::name(w),
        }
    }

    async fn write(&self, model: &CardModel, dest: &Path) -> Result<WriteSummary> {
        match self {
            Self::Debug(w) => DeckWriter::write(w, model, dest).await,
            Self::Package(w) => DeckWriter::write(w, model, dest).await,
        }
    }
}
