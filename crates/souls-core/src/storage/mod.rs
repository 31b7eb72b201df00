//! # Persistent Storage
//!
//! Disk-backed implementations of [`crate::SoulStore`].

mod redb_souls;

pub use redb_souls::RedbStore;
