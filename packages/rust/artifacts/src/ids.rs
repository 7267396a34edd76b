//! Identifier generation for notes, cards, decks and note types.

use chrono::Utc;
use sha2::{Digest, Sha256};

/// Alphabet of the base91 encoding used for note GUIDs.
const BASE91_TABLE: &[u8; 91] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// Wall-clock instant a package is stamped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    millis: i64,
}

impl TimeBase {
    pub fn now() -> Self {
        Self {
            millis: Utc::now().timestamp_millis(),
        }
    }

    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    pub fn secs(&self) -> i64 {
        self.millis / 1000
    }
}

/// Strictly increasing id source seeded from a [`TimeBase`].
///
/// Ids are millisecond-scale numbers, so packages built at different times
/// draw from disjoint ranges unless they hold more entries than milliseconds
/// elapsed between the builds.
#[derive(Debug)]
pub struct IdGenerator {
    next: i64,
}

impl IdGenerator {
    pub fn new(base: TimeBase) -> Self {
        Self { next: base.millis() }
    }

    pub fn next_id(&mut self) -> i64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Stable GUID for a note with the given field values.
///
/// First 8 bytes of SHA-256 over the values joined by `__`, rendered in the
/// importer's base91 alphabet.
pub fn guid_for(values: &[&str]) -> String {
    let digest = Sha256::digest(values.join("__").as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let mut n = u64::from_be_bytes(prefix);

    let mut reversed = Vec::new();
    while n > 0 {
        reversed.push(BASE91_TABLE[(n % 91) as usize]);
        n /= 91;
    }
    reversed.iter().rev().map(|&b| b as char).collect()
}
