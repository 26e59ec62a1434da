//! Node blocks: a fragment-keyed map of entries, and their on-disk encoding.
//!
//! An [IndexBlock] is the unit the trie reads from and writes to the index
//! log. Its in-memory shape (`BTreeMap<Vec<u8>, Entry>`) already iterates in
//! the lexicographic fragment order `commit`/`walk` require for reproducible
//! output.

use cbordata::Cborize;

use std::collections::BTreeMap;

use crate::{util, Result};

const ENTRY_VER: u32 = 0x00010001;

/// What a fragment resolves to inside a node.
///
/// `Dirty` only ever appears in an in-memory, uncommitted node: it is a
/// programmer error to reach commit with one still reachable from the
/// root, and [encode] traps if asked to serialize one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Entry {
    /// The fragment terminates a key. `value` is `None` for a tombstone.
    Leaf { key: Vec<u8>, value: Option<u64> },
    /// Child subtree lives at this offset in the index log.
    Persisted { offset: u64 },
    /// Child subtree lives at this slot in the current transaction's arena.
    Dirty { arena_idx: u32 },
}

impl Entry {
    pub fn is_dirty(&self) -> bool {
        matches!(self, Entry::Dirty { .. })
    }
}

/// On-disk counterpart of [Entry]: `Dirty` has no representation here, by
/// construction, so a decoded block can never contain one. Live and
/// tombstoned leaves get distinct variants (mirroring `db::Value`'s
/// `U`/`D` split) rather than an `Option<u64>` field.
#[derive(Clone, Debug, Eq, PartialEq, Cborize)]
enum WireEntry {
    Leaf { key: Vec<u8>, value: u64 },
    Tombstone { key: Vec<u8> },
    Persisted { offset: u64 },
}

impl WireEntry {
    const ID: u32 = ENTRY_VER;
}

/// One `(fragment, entry)` pair as written to the index log. A node block
/// serializes to `Vec<WireItem>`.
#[derive(Clone, Debug, Eq, PartialEq, Cborize)]
struct WireItem {
    frag: Vec<u8>,
    entry: WireEntry,
}

impl WireItem {
    const ID: u32 = ENTRY_VER + 1;
}

impl From<&WireEntry> for Entry {
    fn from(w: &WireEntry) -> Entry {
        match w.clone() {
            WireEntry::Leaf { key, value } => Entry::Leaf {
                key,
                value: Some(value),
            },
            WireEntry::Tombstone { key } => Entry::Leaf { key, value: None },
            WireEntry::Persisted { offset } => Entry::Persisted { offset },
        }
    }
}

/// A node of the trie: an unordered fragment-to-entry map, but one that
/// iterates fragments in lexicographic order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexBlock {
    entries: BTreeMap<Vec<u8>, Entry>,
}

impl IndexBlock {
    pub fn new() -> IndexBlock {
        IndexBlock {
            entries: BTreeMap::new(),
        }
    }

    pub fn has(&self, frag: &[u8]) -> bool {
        self.entries.contains_key(frag)
    }

    pub fn get(&self, frag: &[u8]) -> Option<&Entry> {
        self.entries.get(frag)
    }

    pub fn put(&mut self, frag: Vec<u8>, entry: Entry) {
        self.entries.insert(frag, entry);
    }

    /// Fragments in lexicographic order, the iteration order `commit` and
    /// `walk` depend on for reproducible on-disk layout.
    pub fn fragments(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Entry)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Vec<u8>, &mut Entry)> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Serialize a node. Traps (panics) if `node` still contains a `Dirty`
/// entry: only committed nodes, with every child resolved to a log offset,
/// may cross the serialization boundary.
pub fn encode(node: &IndexBlock) -> Result<Vec<u8>> {
    let mut wire: Vec<WireItem> = Vec::with_capacity(node.len());
    for (frag, entry) in node.iter() {
        let entry = match entry {
            Entry::Leaf {
                key,
                value: Some(value),
            } => WireEntry::Leaf {
                key: key.clone(),
                value: *value,
            },
            Entry::Leaf { key, value: None } => WireEntry::Tombstone { key: key.clone() },
            Entry::Persisted { offset } => WireEntry::Persisted { offset: *offset },
            Entry::Dirty { .. } => {
                panic!("programmer error: attempt to serialize a dirty node entry")
            }
        };
        wire.push(WireItem {
            frag: frag.clone(),
            entry,
        });
    }
    util::into_cbor_bytes(wire)
}

/// Deserialize a node previously written by [encode].
pub fn decode(bytes: &[u8]) -> Result<IndexBlock> {
    let (wire, _): (Vec<WireItem>, usize) = util::from_cbor_bytes(bytes)?;
    let mut entries = BTreeMap::new();
    for item in wire.iter() {
        entries.insert(item.frag.clone(), Entry::from(&item.entry));
    }
    Ok(IndexBlock { entries })
}

#[cfg(test)]
#[path = "block_test.rs"]
mod block_test;
