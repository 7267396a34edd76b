//! Flashcard package generation.
//!
//! This crate provides:
//! - [`PackageWriter`]: builds an importable `.apkg` archive from a [`CardModel`]
//! - [`fields`]: the reserved-separator encoding of note fields
//! - [`ids`]: time-seeded id generation and note GUIDs
//!
//! [`CardModel`]: termdeck_shared::CardModel

mod collection;
pub mod fields;
pub mod ids;
mod package;
mod schema;

pub use collection::{ANSWER_FORMAT, QUESTION_FORMAT};
pub use fields::{FIELD_SEPARATOR, decode_fields, encode_fields};
pub use ids::{IdGenerator, TimeBase, guid_for};
pub use package::{
    BuiltPackage, COLLECTION_ENTRY, MEDIA_ENTRY, PackageSettings, PackageSummary, PackageWriter,
};
