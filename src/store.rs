//! Multi-index document coordinator layered on top of the trie core.
//!
//! A [Store] owns one [ValueLog] and one [Trie] per indexed attribute,
//! always including a primary-key index on `_id`. Each index is an
//! independent transaction (no cross-index atomicity: committing one does
//! not commit the others), matching the non-goal that rules out
//! transactional isolation across indexes.
//!
//! Deleting a document tombstones every index by the *document's own*
//! value for that index's attribute, never by the primary key. An earlier
//! design tombstoned the attribute index using the primary key itself,
//! which only happens to work when the attribute and the primary key
//! coincide; this crate looks up the stored document first and deletes
//! each index by the value it actually indexed.

use uuid::Uuid;

use std::collections::HashMap;
use std::{ffi, fs};

use crate::{config::Config, err_at, trie::Trie, vlog::Document, vlog::ValueLog, Result};

const PRIMARY_KEY: &str = "_id";

/// One [ValueLog] shared by a primary-key index and zero or more
/// secondary-attribute indexes.
pub struct Store {
    dir: ffi::OsString,
    name: String,
    vlog: ValueLog,
    indices: HashMap<String, Trie>,
}

impl Store {
    /// Open (or create) the store at `<dir>/<name>.vlog`, along with its
    /// primary-key index and any secondary indexes found under the
    /// `<name>.idx.<attr>.index` naming convention.
    pub fn open(dir: &ffi::OsStr, name: &str) -> Result<Store> {
        let config = Config::new(dir, name);
        let vlog = ValueLog::open(&config.to_vlog_location(), config.fsync)?;

        let mut store = Store {
            dir: dir.to_os_string(),
            name: name.to_string(),
            vlog,
            indices: HashMap::new(),
        };
        store.add_index(PRIMARY_KEY)?;

        for attr in store.discover_secondary_indices()? {
            store.add_index(&attr)?;
        }

        Ok(store)
    }

    fn discover_secondary_indices(&self) -> Result<Vec<String>> {
        let prefix = format!("{}.idx.", self.name);
        let suffix = ".index";

        let mut attrs = Vec::new();
        let entries = err_at!(IoError, fs::read_dir(&self.dir))?;
        for entry in entries {
            let entry = err_at!(IoError, entry)?;
            let fname = entry.file_name();
            let fname = match fname.to_str() {
                Some(s) => s,
                None => continue,
            };
            if let Some(rest) = fname.strip_prefix(&prefix) {
                if let Some(attr) = rest.strip_suffix(suffix) {
                    if attr != PRIMARY_KEY {
                        attrs.push(attr.to_string());
                    }
                }
            }
        }
        Ok(attrs)
    }

    fn index_name(&self, attr: &str) -> String {
        if attr == PRIMARY_KEY {
            self.name.clone()
        } else {
            format!("{}.idx.{}", self.name, attr)
        }
    }

    /// Start indexing `attr`. A no-op if already indexed.
    pub fn add_index(&mut self, attr: &str) -> Result<()> {
        if self.indices.contains_key(attr) {
            return Ok(());
        }
        let config = Config::new(&self.dir, &self.index_name(attr));
        let trie = Trie::open(&config)?;
        self.indices.insert(attr.to_string(), trie);
        Ok(())
    }

    /// Insert `doc`, assigning it a fresh `_id` if it doesn't have one.
    /// Every attribute present in `doc` that has a registered index is
    /// indexed; attributes without a registered index are stored but not
    /// searchable. Returns the document's `_id`.
    pub fn put(&mut self, mut doc: Document) -> Result<Vec<u8>> {
        let id = match doc.get(PRIMARY_KEY) {
            Some(id) => id.clone(),
            None => {
                let id = Uuid::new_v4().to_string().into_bytes();
                doc.insert(PRIMARY_KEY.to_string(), id.clone());
                id
            }
        };

        let offset = self.vlog.append(&doc)?;
        for (attr, trie) in self.indices.iter_mut() {
            if let Some(value) = doc.get(attr) {
                trie.put(value, offset)?;
            }
        }
        Ok(id)
    }

    /// Fetch the document with primary key `id`.
    pub fn get(&mut self, id: &[u8]) -> Result<Document> {
        self.get_by(PRIMARY_KEY, id)
    }

    /// Fetch the document whose `attr` attribute equals `key`. `attr` must
    /// have a registered index.
    pub fn get_by(&mut self, attr: &str, key: &[u8]) -> Result<Document> {
        let trie = match self.indices.get_mut(attr) {
            Some(trie) => trie,
            None => return err_at!(NotFound, msg: "no index on attribute {:?}", attr),
        };
        let offset = trie.get(key)?;
        self.vlog.get(offset)
    }

    /// Delete the document with primary key `id` from every index that
    /// covers one of its attributes.
    pub fn delete(&mut self, id: &[u8]) -> Result<()> {
        let doc = self.get(id)?;
        for (attr, trie) in self.indices.iter_mut() {
            if let Some(value) = doc.get(attr) {
                trie.delete(value)?;
            }
        }
        Ok(())
    }

    /// Visit every live document, via the primary-key index.
    pub fn walk<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(Document) -> Result<()>,
    {
        let vlog = &mut self.vlog;
        let trie = self.indices.get_mut(PRIMARY_KEY).expect("_id index always present");
        trie.walk(|_key, offset| {
            let doc = vlog.get(offset)?;
            visit(doc)
        })
    }

    /// Commit every index that has uncommitted writes. Not atomic across
    /// indexes: a crash partway through may commit some and not others.
    pub fn commit(&mut self) -> Result<()> {
        for trie in self.indices.values_mut() {
            trie.commit()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod store_test {
    use super::*;

    use tempfile::tempdir;

    fn doc(pairs: &[(&str, &str)]) -> Document {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_put_get_by_primary_key() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().as_os_str(), "db").unwrap();

        let id = store.put(doc(&[("_id", "one"), ("name", "alice")])).unwrap();
        let got = store.get(&id).unwrap();
        assert_eq!(got.get("name").unwrap(), b"alice");
    }

    #[test]
    fn test_put_generates_id_when_absent() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().as_os_str(), "db").unwrap();

        let id = store.put(doc(&[("name", "bob")])).unwrap();
        assert!(!id.is_empty());
        assert_eq!(store.get(&id).unwrap().get("name").unwrap(), b"bob");
    }

    #[test]
    fn test_secondary_index_lookup() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().as_os_str(), "db").unwrap();
        store.add_index("name").unwrap();

        store.put(doc(&[("_id", "one"), ("name", "alice")])).unwrap();
        let got = store.get_by("name", b"alice").unwrap();
        assert_eq!(got.get("_id").unwrap(), b"one");
    }

    #[test]
    fn test_delete_tombstones_every_index_by_its_own_attribute() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().as_os_str(), "db").unwrap();
        store.add_index("name").unwrap();

        store.put(doc(&[("_id", "one"), ("name", "alice")])).unwrap();
        store.delete(b"one").unwrap();

        assert!(store.get(b"one").is_err());
        assert!(store.get_by("name", b"alice").is_err());
    }

    #[test]
    fn test_walk_visits_every_live_document() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().as_os_str(), "db").unwrap();

        store.put(doc(&[("_id", "a")])).unwrap();
        store.put(doc(&[("_id", "b")])).unwrap();
        store.delete(b"a").unwrap();

        let mut ids: Vec<Vec<u8>> = Vec::new();
        store
            .walk(|doc| {
                ids.push(doc.get("_id").unwrap().clone());
                Ok(())
            })
            .unwrap();
        assert_eq!(ids, vec![b"b".to_vec()]);
    }

    #[test]
    fn test_reopen_discovers_secondary_index() {
        let dir = tempdir().unwrap();
        let loc = dir.path().to_path_buf();
        {
            let mut store = Store::open(loc.as_os_str(), "db").unwrap();
            store.add_index("name").unwrap();
            store.put(doc(&[("_id", "one"), ("name", "alice")])).unwrap();
            store.commit().unwrap();
        }
        {
            let mut store = Store::open(loc.as_os_str(), "db").unwrap();
            let got = store.get_by("name", b"alice").unwrap();
            assert_eq!(got.get("_id").unwrap(), b"one");
        }
    }
}
