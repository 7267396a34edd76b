//! Package writer: turns a [`CardModel`] into an importable `.apkg` archive.
//!
//! Layout of the produced archive:
//! ```text
//! deck.apkg (zip, deflate)
//! ├── collection.anki2   SQLite collection (col, notes, cards, revlog, graves)
//! └── media              JSON media manifest, `{}` (no media attached)
//! ```

use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use libsql::params;
use termdeck_shared::{CardModel, DeckConfig, Result, TermDeckError, write_atomic};
use tracing::{debug, info, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::collection::{CollectionJson, CollectionLayout};
use crate::fields::{encode_fields, field_checksum};
use crate::ids::{IdGenerator, TimeBase, guid_for};
use crate::schema;

/// Archive entry holding the collection database.
pub const COLLECTION_ENTRY: &str = "collection.anki2";

/// Archive entry holding the media manifest.
pub const MEDIA_ENTRY: &str = "media";

/// Deck and note type identity for a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSettings {
    pub deck_name: String,
    pub note_type_name: String,
    /// `0` derives the id from the package time base.
    pub deck_id: i64,
    /// `0` derives the id from the package time base.
    pub note_type_id: i64,
}

impl From<&DeckConfig> for PackageSettings {
    fn from(config: &DeckConfig) -> Self {
        Self {
            deck_name: config.name.clone(),
            note_type_name: config.note_type_name.clone(),
            deck_id: config.deck_id,
            note_type_id: config.note_type_id,
        }
    }
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self::from(&DeckConfig::default())
    }
}

/// A fully built archive, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct BuiltPackage {
    pub bytes: Vec<u8>,
    pub note_count: usize,
    pub deck_id: i64,
    pub note_type_id: i64,
}

/// Outcome of a successful [`PackageWriter::write`].
#[derive(Debug, Clone)]
pub struct PackageSummary {
    pub path: PathBuf,
    pub note_count: usize,
    pub card_count: usize,
    pub deck_id: i64,
    pub note_type_id: i64,
    pub bytes: usize,
}

/// One note and its single card, with ids assigned.
#[derive(Debug)]
struct PlannedNote {
    note_id: i64,
    card_id: i64,
    guid: String,
    flds: String,
    sort_field: String,
    csum: i64,
    due: i64,
}

/// Serializes card models into the flashcard application's package format.
#[derive(Debug, Clone, Default)]
pub struct PackageWriter {
    settings: PackageSettings,
}

impl PackageWriter {
    pub fn new(settings: PackageSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PackageSettings {
        &self.settings
    }

    /// Build the package for `model` and place it at `dest`.
    ///
    /// Nothing is written to `dest` unless the whole archive was built.
    pub async fn write(&self, model: &CardModel, dest: &Path) -> Result<PackageSummary> {
        self.write_with_time_base(model, dest, TimeBase::now()).await
    }

    /// [`write`](Self::write) with an explicit time base.
    #[instrument(skip_all, fields(path = %dest.display(), entries = model.len()))]
    pub async fn write_with_time_base(
        &self,
        model: &CardModel,
        dest: &Path,
        time_base: TimeBase,
    ) -> Result<PackageSummary> {
        let built = self.build(model, time_base).await?;

        write_atomic(dest, &built.bytes).map_err(|e| {
            TermDeckError::packaging(format!("write archive to {}: {e}", dest.display()))
        })?;

        info!(
            notes = built.note_count,
            deck_id = built.deck_id,
            bytes = built.bytes.len(),
            "package written"
        );

        Ok(PackageSummary {
            path: dest.to_path_buf(),
            note_count: built.note_count,
            card_count: built.note_count,
            deck_id: built.deck_id,
            note_type_id: built.note_type_id,
            bytes: built.bytes.len(),
        })
    }

    /// Build the archive bytes in memory.
    pub async fn build(&self, model: &CardModel, time_base: TimeBase) -> Result<BuiltPackage> {
        let mut ids = IdGenerator::new(time_base);
        let deck_id = resolve_id(self.settings.deck_id, &mut ids);
        let note_type_id = resolve_id(self.settings.note_type_id, &mut ids);

        let notes = plan_notes(model, &mut ids)?;

        let layout = CollectionLayout {
            deck_id,
            deck_name: &self.settings.deck_name,
            note_type_id,
            note_type_name: &self.settings.note_type_name,
        };

        let scratch = tempfile::tempdir()
            .map_err(|e| TermDeckError::packaging(format!("create scratch directory: {e}")))?;
        let db_path = scratch.path().join(COLLECTION_ENTRY);

        write_collection(&db_path, &layout, &notes, time_base).await?;

        let collection = std::fs::read(&db_path)
            .map_err(|e| TermDeckError::packaging(format!("read collection database: {e}")))?;
        debug!(bytes = collection.len(), "collection database built");

        let bytes = assemble_archive(&collection)?;

        Ok(BuiltPackage {
            bytes,
            note_count: notes.len(),
            deck_id,
            note_type_id,
        })
    }
}

fn resolve_id(configured: i64, ids: &mut IdGenerator) -> i64 {
    if configured == 0 {
        ids.next_id()
    } else {
        configured
    }
}

/// Encode fields and assign ids. Each note takes one id and its card the
/// next, so ids across notes and cards are pairwise distinct and ascending.
fn plan_notes(model: &CardModel, ids: &mut IdGenerator) -> Result<Vec<PlannedNote>> {
    let mut used_guids: HashSet<String> = HashSet::with_capacity(model.len());
    let mut notes = Vec::with_capacity(model.len());

    for (position, entry) in model.entries().iter().enumerate() {
        let flds = encode_fields(entry)?;
        let guid = unique_guid(&entry.term, &entry.definition, &mut used_guids);

        let note_id = ids.next_id();
        let card_id = ids.next_id();

        notes.push(PlannedNote {
            note_id,
            card_id,
            guid,
            flds,
            sort_field: entry.term.clone(),
            csum: field_checksum(&entry.term),
            due: position as i64 + 1,
        });
    }

    Ok(notes)
}

/// Content GUID for the note, suffixed with the lowest counter that makes
/// it unused within this package. The importer merges notes sharing a GUID.
fn unique_guid(term: &str, definition: &str, used: &mut HashSet<String>) -> String {
    let mut guid = guid_for(&[term, definition]);
    let mut suffix = 0u64;
    while used.contains(&guid) {
        suffix += 1;
        guid = guid_for(&[term, definition, suffix.to_string().as_str()]);
    }
    used.insert(guid.clone());
    guid
}

fn stage(what: &'static str) -> impl Fn(libsql::Error) -> TermDeckError {
    move |e| TermDeckError::packaging(format!("{what}: {e}"))
}

/// Create the collection database at `db_path` and fill it.
async fn write_collection(
    db_path: &Path,
    layout: &CollectionLayout<'_>,
    notes: &[PlannedNote],
    time_base: TimeBase,
) -> Result<()> {
    let db = libsql::Builder::new_local(db_path)
        .build()
        .await
        .map_err(stage("open collection database"))?;
    let conn = db.connect().map_err(stage("connect to collection database"))?;

    conn.execute_batch(schema::COLLECTION_SCHEMA)
        .await
        .map_err(stage("create collection schema"))?;

    let json = CollectionJson::build(layout, time_base);
    let tx = conn.transaction().await.map_err(stage("begin transaction"))?;

    tx.execute(
        schema::INSERT_COL,
        params![
            time_base.secs(),
            time_base.millis(),
            time_base.millis(),
            schema::SCHEMA_VERSION,
            json.conf.as_str(),
            json.models.as_str(),
            json.decks.as_str(),
            json.dconf.as_str(),
        ],
    )
    .await
    .map_err(stage("insert collection row"))?;

    for note in notes {
        tx.execute(
            schema::INSERT_NOTE,
            params![
                note.note_id,
                note.guid.as_str(),
                layout.note_type_id,
                time_base.secs(),
                note.flds.as_str(),
                note.sort_field.as_str(),
                note.csum,
            ],
        )
        .await
        .map_err(stage("insert note"))?;

        tx.execute(
            schema::INSERT_CARD,
            params![
                note.card_id,
                note.note_id,
                layout.deck_id,
                time_base.secs(),
                note.due,
            ],
        )
        .await
        .map_err(stage("insert card"))?;
    }

    tx.commit().await.map_err(stage("commit collection"))?;
    Ok(())
}

/// Serialized media manifest: index → filename. Always empty here.
fn media_manifest() -> Result<Vec<u8>> {
    serde_json::to_vec(&BTreeMap::<String, String>::new())
        .map_err(|e| TermDeckError::packaging(format!("encode media manifest: {e}")))
}

/// Zip the collection database and the media manifest in memory.
fn assemble_archive(collection: &[u8]) -> Result<Vec<u8>> {
    let archive_err = |e: &dyn std::fmt::Display| TermDeckError::packaging(format!("archive: {e}"));

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(COLLECTION_ENTRY, options)
        .map_err(|e| archive_err(&e))?;
    zip.write_all(collection).map_err(|e| archive_err(&e))?;

    zip.start_file(MEDIA_ENTRY, options)
        .map_err(|e| archive_err(&e))?;
    zip.write_all(&media_manifest()?)
        .map_err(|e| archive_err(&e))?;

    let cursor = zip.finish().map_err(|e| archive_err(&e))?;
    Ok(cursor.into_inner())
}
