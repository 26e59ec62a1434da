//! Append-only record log that backs a [crate::trie::Trie]'s value references.
//!
//! The trie only ever stores an opaque `u64` offset; it never interprets
//! the bytes a [ValueLog] holds at that offset. A record here is a small
//! document: a `BTreeMap<String, Vec<u8>>`, one entry per attribute,
//! encoded with the same cbor framing [crate::log::Log] already gives the
//! trie's own node blocks.

use std::collections::BTreeMap;
use std::ffi;

use crate::{log::Log, util, Result};

/// A document: an attribute name mapped to its opaque byte-string value.
/// Attribute values double as secondary-index keys in [crate::store::Store].
pub type Document = BTreeMap<String, Vec<u8>>;

/// Append-only log of [Document] records, shared across every index that
/// needs to resolve a value reference back to its document.
pub struct ValueLog {
    log: Log,
}

impl ValueLog {
    /// Open (or create) the value log at `loc`.
    pub fn open(loc: &ffi::OsStr, fsync: bool) -> Result<ValueLog> {
        Ok(ValueLog {
            log: Log::open(loc, fsync)?,
        })
    }

    /// Append `doc`, returning the offset a [crate::trie::Trie] can store
    /// as that document's value reference.
    pub fn append(&mut self, doc: &Document) -> Result<u64> {
        let bytes = util::into_cbor_bytes(doc.clone())?;
        self.log.append(&bytes)
    }

    /// Fetch back the document previously returned by [ValueLog::append].
    pub fn get(&mut self, offset: u64) -> Result<Document> {
        let bytes = self.log.read(offset)?;
        let (doc, _): (Document, usize) = util::from_cbor_bytes(&bytes)?;
        Ok(doc)
    }

    pub fn to_location(&self) -> ffi::OsString {
        self.log.to_location()
    }
}
