//! The transactional radix index: the core of this crate.
//!
//! A [Trie] keys its nodes by fixed-width key fragments
//! ([crate::config::FRAGMENT_WIDTH] bytes at a time) and holds uncommitted
//! nodes in an in-memory arena ([arena::DirtyBlocks]) until [Trie::commit]
//! serializes them to the index log and flips the checkpoint.

mod arena;
mod radix;

pub use radix::Trie;
