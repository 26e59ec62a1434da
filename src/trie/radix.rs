//! The transactional radix index proper: `put`/`get`/`walk`/`commit` over the
//! fragment-keyed trie.
//!
//! Nodes are keyed by fixed-width fragments of the full key
//! ([crate::config::FRAGMENT_WIDTH] bytes per level). A key shorter than
//! `depth * FRAGMENT_WIDTH` has no fragment left to consume at that depth;
//! it is stored under the empty fragment `b""`, the one fragment value a
//! real key byte-slice can never produce.

use crate::{
    block::{self, Entry, IndexBlock},
    config::{Config, FRAGMENT_WIDTH},
    err_at,
    log::Log,
    trie::arena::DirtyBlocks,
    Result,
};

/// Where the root node currently lives.
enum RootRef {
    /// Not yet touched by the open transaction: read from the log on demand.
    Persisted(u64),
    /// Materialized into the arena by a prior `put`/`delete` this transaction.
    Dirty(u32),
}

/// A node reached while reading, without forcing it into the arena.
///
/// `get` and `walk` must not mutate the trie, so a
/// `Persisted` child is decoded into an owned, unshared [IndexBlock]
/// instead of being promoted the way `put` promotes it.
enum Cursor {
    Dirty(u32),
    Owned(IndexBlock),
}

/// Fragment of `key` at `depth`, or `b""` once `key` is exhausted.
fn fragment_at(key: &[u8], depth: usize) -> Vec<u8> {
    let start = depth * FRAGMENT_WIDTH;
    if start >= key.len() {
        Vec::new()
    } else {
        let end = std::cmp::min(start + FRAGMENT_WIDTH, key.len());
        key[start..end].to_vec()
    }
}

/// A transactional radix index over a single append-only index log.
///
/// One `Trie` holds at most one open transaction's worth of uncommitted
/// writes at a time: `put`/`delete` accumulate nodes in an in-memory arena,
/// and `commit` is the only operation that makes them visible to a future
/// `open`.
pub struct Trie {
    log: Log,
    root: RootRef,
    arena: DirtyBlocks,
}

impl Trie {
    /// Open the index log named by `config`, creating it if absent.
    pub fn open(config: &Config) -> Result<Trie> {
        let loc = config.to_index_location();
        let mut log = Log::open(&loc, config.fsync)?;
        let root_offset = log.read_checkpoint()?;
        Ok(Trie {
            log,
            root: RootRef::Persisted(root_offset),
            arena: DirtyBlocks::new(),
        })
    }

    /// Copy-on-write the root into the arena, once per transaction.
    fn ensure_root_dirty(&mut self) -> Result<u32> {
        match self.root {
            RootRef::Dirty(idx) => Ok(idx),
            RootRef::Persisted(offset) => {
                let bytes = self.log.read(offset)?;
                let block = block::decode(&bytes)?;
                let idx = self.arena.push(block);
                self.root = RootRef::Dirty(idx);
                Ok(idx)
            }
        }
    }

    /// Insert or overwrite `key`'s value. Visible to `get` immediately;
    /// durable only after [Trie::commit].
    pub fn put(&mut self, key: &[u8], value: u64) -> Result<()> {
        let root_idx = self.ensure_root_dirty()?;
        self.put_at(root_idx, key, 0, Some(value))
    }

    /// Record a tombstone for `key`. A later `commit`/`walk` treats it as
    /// absent; the key's prior value, if any, is not reclaimed until this
    /// index is rewritten from scratch (no compaction: out of scope here).
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        let root_idx = self.ensure_root_dirty()?;
        self.put_at(root_idx, key, 0, None)
    }

    fn put_at(&mut self, node_idx: u32, key: &[u8], depth: usize, value: Option<u64>) -> Result<()> {
        let frag = fragment_at(key, depth);
        let existing = self.arena.get(node_idx).get(&frag).cloned();
        match existing {
            None => {
                self.arena.get_mut(node_idx).put(frag, Entry::Leaf {
                    key: key.to_vec(),
                    value,
                });
            }
            Some(Entry::Leaf { key: old_key, value: old_value }) => {
                if old_key == key {
                    self.arena.get_mut(node_idx).put(frag, Entry::Leaf {
                        key: key.to_vec(),
                        value,
                    });
                } else {
                    let child_idx = self.arena.push(IndexBlock::new());
                    self.arena
                        .get_mut(node_idx)
                        .put(frag, Entry::Dirty { arena_idx: child_idx });
                    self.put_at(child_idx, &old_key, depth + 1, old_value)?;
                    self.put_at(child_idx, key, depth + 1, value)?;
                }
            }
            Some(Entry::Persisted { offset }) => {
                let bytes = self.log.read(offset)?;
                let block = block::decode(&bytes)?;
                let child_idx = self.arena.push(block);
                self.arena
                    .get_mut(node_idx)
                    .put(frag, Entry::Dirty { arena_idx: child_idx });
                self.put_at(child_idx, key, depth + 1, value)?;
            }
            Some(Entry::Dirty { arena_idx }) => {
                self.put_at(arena_idx, key, depth + 1, value)?;
            }
        }
        Ok(())
    }

    /// Look up `key`. Returns `Error::NotFound` for an absent or
    /// tombstoned key.
    pub fn get(&mut self, key: &[u8]) -> Result<u64> {
        match self.get_opt(key)? {
            Some(value) => Ok(value),
            None => err_at!(NotFound, msg: "key {:?} not found", key),
        }
    }

    fn get_opt(&mut self, key: &[u8]) -> Result<Option<u64>> {
        let cursor = self.root_cursor()?;
        self.get_at(cursor, key, 0)
    }

    fn root_cursor(&mut self) -> Result<Cursor> {
        match self.root {
            RootRef::Dirty(idx) => Ok(Cursor::Dirty(idx)),
            RootRef::Persisted(offset) => {
                let bytes = self.log.read(offset)?;
                Ok(Cursor::Owned(block::decode(&bytes)?))
            }
        }
    }

    fn get_at(&mut self, cursor: Cursor, key: &[u8], depth: usize) -> Result<Option<u64>> {
        let frag = fragment_at(key, depth);
        let entry = match &cursor {
            Cursor::Dirty(idx) => self.arena.get(*idx).get(&frag).cloned(),
            Cursor::Owned(block) => block.get(&frag).cloned(),
        };
        match entry {
            None => Ok(None),
            Some(Entry::Leaf { key: found, value }) => {
                Ok(if found == key { value } else { None })
            }
            Some(Entry::Persisted { offset }) => {
                let bytes = self.log.read(offset)?;
                let block = block::decode(&bytes)?;
                self.get_at(Cursor::Owned(block), key, depth + 1)
            }
            Some(Entry::Dirty { arena_idx }) => self.get_at(Cursor::Dirty(arena_idx), key, depth + 1),
        }
    }

    /// Visit every live `(key, value)` pair in lexicographic fragment
    /// order, including writes from the current, uncommitted transaction.
    pub fn walk<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&[u8], u64) -> Result<()>,
    {
        let cursor = self.root_cursor()?;
        self.walk_at(cursor, &mut visit)
    }

    fn walk_at<F>(&mut self, cursor: Cursor, visit: &mut F) -> Result<()>
    where
        F: FnMut(&[u8], u64) -> Result<()>,
    {
        let entries: Vec<Entry> = match &cursor {
            Cursor::Dirty(idx) => self.arena.get(*idx).iter().map(|(_, e)| e.clone()).collect(),
            Cursor::Owned(block) => block.iter().map(|(_, e)| e.clone()).collect(),
        };
        for entry in entries {
            match entry {
                Entry::Leaf { key, value: Some(value) } => visit(&key, value)?,
                Entry::Leaf { value: None, .. } => (),
                Entry::Persisted { offset } => {
                    let bytes = self.log.read(offset)?;
                    let block = block::decode(&bytes)?;
                    self.walk_at(Cursor::Owned(block), visit)?;
                }
                Entry::Dirty { arena_idx } => self.walk_at(Cursor::Dirty(arena_idx), visit)?,
            }
        }
        Ok(())
    }

    /// Serialize every dirty node post-order and flip the checkpoint.
    ///
    /// A no-op if nothing has been written since the last commit or since
    /// `open`: `root` stays `Persisted` and no record is appended.
    pub fn commit(&mut self) -> Result<()> {
        let root_idx = match self.root {
            RootRef::Dirty(idx) => idx,
            RootRef::Persisted(_) => return Ok(()),
        };
        let offset = self.commit_rec(root_idx)?;
        self.log.write_checkpoint(offset)?;
        self.arena.clear();
        self.root = RootRef::Persisted(offset);
        Ok(())
    }

    fn commit_rec(&mut self, idx: u32) -> Result<u64> {
        let mut block = self.arena.get(idx).clone();
        let frags: Vec<Vec<u8>> = block.fragments().cloned().collect();
        for frag in frags {
            if let Some(Entry::Dirty { arena_idx }) = block.get(&frag).cloned() {
                let offset = self.commit_rec(arena_idx)?;
                block.put(frag, Entry::Persisted { offset });
            }
        }
        let bytes = block::encode(&block)?;
        self.log.append(&bytes)
    }

    pub fn to_index_location(&self) -> std::ffi::OsString {
        self.log.to_location()
    }
}

#[cfg(test)]
#[path = "radix_test.rs"]
mod radix_test;
