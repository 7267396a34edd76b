//! Encoding of note fields into the `notes.flds` column.

use sha1::{Digest, Sha1};
use termdeck_shared::{CardEntry, Result, TermDeckError};

/// Byte the importer reserves for separating field values.
pub const FIELD_SEPARATOR: char = '\u{1f}';

/// Join the term and definition of `entry` into a fields blob.
///
/// Content containing [`FIELD_SEPARATOR`] is rejected: it would split into an
/// extra field on import.
pub fn encode_fields(entry: &CardEntry) -> Result<String> {
    for (name, value) in [("term", &entry.term), ("definition", &entry.definition)] {
        if value.contains(FIELD_SEPARATOR) {
            return Err(TermDeckError::packaging(format!(
                "{name} of {:?} contains the reserved field separator (0x1f)",
                entry.term
            )));
        }
    }

    let mut flds = String::with_capacity(entry.term.len() + entry.definition.len() + 1);
    flds.push_str(&entry.term);
    flds.push(FIELD_SEPARATOR);
    flds.push_str(&entry.definition);
    Ok(flds)
}

/// Split a fields blob back into its values.
pub fn decode_fields(flds: &str) -> Vec<&str> {
    flds.split(FIELD_SEPARATOR).collect()
}

/// Checksum the importer uses for duplicate detection: the first 8 hex
/// digits of SHA-1 over `value`, as an integer.
pub fn field_checksum(value: &str) -> i64 {
    let digest = Sha1::digest(value.as_bytes());
    let mut prefix = [0u8; 4];
    prefix.copy_from_slice(&digest[..4]);
    i64::from(u32::from_be_bytes(prefix))
}
