use std::ffi;

/// Width, in bytes, of a key fragment used as an edge label in the trie.
///
/// A production index might want this as a const-generic parameter of
/// [crate::trie::Trie]; this crate keeps it a single crate-wide constant
/// since every index it opens uses the same width.
pub const FRAGMENT_WIDTH: usize = 2;

/// Configuration for opening or creating a [crate::trie::Trie].
///
/// Only meaningful at `open`/`create` time; once opened, these values are
/// not persisted (the trie itself carries no format-versioning metadata
/// beyond the node encoding version in [crate::block]).
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory under which the index log lives.
    pub dir: ffi::OsString,
    /// Name of this index, used to derive its log file name.
    pub name: String,
    /// Call `File::sync_all` on every checkpoint write.
    ///
    /// Default: true. Turning it off is only useful for throwaway test
    /// databases that never need to survive a crash.
    pub fsync: bool,
}

impl Config {
    pub fn new(dir: &ffi::OsStr, name: &str) -> Config {
        Config {
            dir: dir.to_os_string(),
            name: name.to_string(),
            fsync: true,
        }
    }

    pub fn set_fsync(&mut self, fsync: bool) -> &mut Self {
        self.fsync = fsync;
        self
    }

    /// Path of the index log file for this configuration: `<dir>/<name>.index`.
    pub fn to_index_location(&self) -> ffi::OsString {
        let mut loc = std::path::PathBuf::from(&self.dir);
        loc.push(format!("{}.index", self.name));
        loc.into_os_string()
    }

    /// Path of the value log file for this configuration: `<dir>/<name>.vlog`.
    pub fn to_vlog_location(&self) -> ffi::OsString {
        let mut loc = std::path::PathBuf::from(&self.dir);
        loc.push(format!("{}.vlog", self.name));
        loc.into_os_string()
    }
}
