//! # redb-backed Soul Storage
//!
//! A disk-backed soul store using the redb embedded database.
//!
//! Every mutation runs in its own write transaction. redb serializes write
//! transactions, so the check-then-write inside `insert_unique` and the
//! read-modify-write inside `update_edge_set` are atomic with respect to
//! concurrent requests. Readers use MVCC snapshots and never block writers.

use crate::store::SoulStore;
use crate::{Credential, EdgeKind, EdgeOp, Soul, SoulError, SoulFilter, SoulId};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Table for souls: name -> postcard-encoded `StoredSoul`
const SOULS: TableDefinition<&str, &[u8]> = TableDefinition::new("souls");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_SOUL_ID: &str = "next_soul_id";

fn storage_err<E: std::fmt::Display>(e: E) -> SoulError {
    SoulError::Storage(e.to_string())
}

/// On-disk layout of a soul record, including its credential.
#[derive(Serialize, Deserialize)]
struct StoredSoul {
    id: SoulId,
    name: String,
    credential: Credential,
    allies: BTreeSet<String>,
    blocks: BTreeSet<String>,
    hostiles: BTreeSet<String>,
}

impl From<&Soul> for StoredSoul {
    fn from(soul: &Soul) -> Self {
        Self {
            id: soul.id,
            name: soul.name.clone(),
            credential: soul.credential().clone(),
            allies: soul.allies.clone(),
            blocks: soul.blocks.clone(),
            hostiles: soul.hostiles.clone(),
        }
    }
}

impl From<StoredSoul> for Soul {
    fn from(stored: StoredSoul) -> Self {
        let mut soul = Soul::new(stored.name, stored.credential);
        soul.id = stored.id;
        soul.allies = stored.allies;
        soul.blocks = stored.blocks;
        soul.hostiles = stored.hostiles;
        soul
    }
}

fn encode(soul: &Soul) -> Result<Vec<u8>, SoulError> {
    postcard::to_allocvec(&StoredSoul::from(soul))
        .map_err(|e| SoulError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Soul, SoulError> {
    postcard::from_bytes::<StoredSoul>(bytes)
        .map(Soul::from)
        .map_err(|e| SoulError::Serialization(e.to_string()))
}

/// A disk-backed soul store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a soul database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SoulError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(SOULS).map_err(storage_err)?;
            let _ = write_txn.open_table(METADATA).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        tracing::debug!(path = %path.as_ref().display(), "redb store opened");
        Ok(Self { db })
    }
}

// =============================================================================
// SOULSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl SoulStore for RedbStore {
    fn find_one(&self, filter: &SoulFilter) -> Result<Option<Soul>, SoulError> {
        let Some(name) = filter.name.as_deref() else {
            return Ok(self.find(filter)?.into_iter().next());
        };

        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let souls = read_txn.open_table(SOULS).map_err(storage_err)?;

        match souls.get(name).map_err(storage_err)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    fn find(&self, filter: &SoulFilter) -> Result<Vec<Soul>, SoulError> {
        if filter.name.is_some() {
            return Ok(self.find_one(filter)?.into_iter().collect());
        }

        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let souls_table = read_txn.open_table(SOULS).map_err(storage_err)?;

        let mut souls = Vec::new();
        for entry in souls_table.iter().map_err(storage_err)? {
            let (_, value) = entry.map_err(storage_err)?;
            souls.push(decode(value.value())?);
        }
        Ok(souls)
    }

    fn insert_unique(&self, mut soul: Soul) -> Result<Soul, SoulError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;

        let inserted = {
            let mut souls = write_txn.open_table(SOULS).map_err(storage_err)?;
            let taken = souls
                .get(soul.name.as_str())
                .map_err(storage_err)?
                .is_some();

            if taken {
                false
            } else {
                let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
                let next_id = meta
                    .get(NEXT_SOUL_ID)
                    .map_err(storage_err)?
                    .map(|v| v.value())
                    .unwrap_or(1);

                soul.id = SoulId(next_id);
                let bytes = encode(&soul)?;
                souls
                    .insert(soul.name.as_str(), bytes.as_slice())
                    .map_err(storage_err)?;
                meta.insert(NEXT_SOUL_ID, next_id.saturating_add(1))
                    .map_err(storage_err)?;
                true
            }
        };

        if !inserted {
            write_txn.abort().map_err(storage_err)?;
            return Err(SoulError::AlreadyExists(soul.name));
        }

        write_txn.commit().map_err(storage_err)?;
        tracing::debug!(soul = %soul.name, id = %soul.id, "redb store: inserted soul");
        Ok(soul)
    }

    fn update_edge_set(
        &self,
        name: &str,
        op: EdgeOp,
        kind: EdgeKind,
        value: &str,
    ) -> Result<bool, SoulError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;

        let outcome = {
            let mut souls = write_txn.open_table(SOULS).map_err(storage_err)?;
            let existing = souls
                .get(name)
                .map_err(storage_err)?
                .map(|data| decode(data.value()))
                .transpose()?;

            match existing {
                None => None,
                Some(mut soul) => {
                    let changed = soul.apply_edge(op, kind, value);
                    if changed {
                        let bytes = encode(&soul)?;
                        souls.insert(name, bytes.as_slice()).map_err(storage_err)?;
                    }
                    Some(changed)
                }
            }
        };

        match outcome {
            Some(true) => {
                write_txn.commit().map_err(storage_err)?;
                Ok(true)
            }
            Some(false) => {
                write_txn.abort().map_err(storage_err)?;
                Ok(false)
            }
            None => {
                write_txn.abort().map_err(storage_err)?;
                Err(SoulError::NotFound(name.to_string()))
            }
        }
    }

    fn delete_one(&self, filter: &SoulFilter) -> Result<(), SoulError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;

        let removed = {
            let mut souls = write_txn.open_table(SOULS).map_err(storage_err)?;
            let key = match filter.name.as_deref() {
                Some(name) => Some(name.to_string()),
                None => souls
                    .iter()
                    .map_err(storage_err)?
                    .next()
                    .transpose()
                    .map_err(storage_err)?
                    .map(|(key, _)| key.value().to_string()),
            };

            match key {
                Some(key) => souls.remove(key.as_str()).map_err(storage_err)?.is_some(),
                None => false,
            }
        };

        if !removed {
            write_txn.abort().map_err(storage_err)?;
            return Err(SoulError::NotFound(
                filter.name.clone().unwrap_or_else(|| "<any>".to_string()),
            ));
        }

        write_txn.commit().map_err(storage_err)?;
        tracing::debug!(filter = ?filter.name, "redb store: deleted soul");
        Ok(())
    }

    fn count(&self) -> Result<usize, SoulError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let souls = read_txn.open_table(SOULS).map_err(storage_err)?;
        let count = souls.len().map_err(storage_err)?;
        Ok(count as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::CredentialManager;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn soul(name: &str) -> Soul {
        let manager = CredentialManager::with_costs(64, 1, 1).expect("params");
        Soul::new(name, manager.hash_password("pw").expect("hash"))
    }

    #[test]
    fn stored_record_keeps_credential_and_edges() {
        let manager = CredentialManager::with_costs(64, 1, 1).expect("params");
        let mut original = soul("alice");
        original.id = SoulId(7);
        original.apply_edge(EdgeOp::Add, EdgeKind::Block, "bob");

        let restored = decode(&encode(&original).expect("encode")).expect("decode");
        assert_eq!(restored, original);
        assert!(manager
            .verify_password("pw", restored.credential())
            .expect("verify"));
    }

    #[test]
    fn garbage_bytes_are_a_serialization_error() {
        assert!(matches!(
            decode(&[0xff, 0xff, 0xff]),
            Err(SoulError::Serialization(_))
        ));
    }

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("souls.redb")).expect("open db");

        let alice = store.insert_unique(soul("alice")).expect("insert");
        let bob = store.insert_unique(soul("bob")).expect("insert");

        assert_eq!(alice.id, SoulId(1));
        assert_eq!(bob.id, SoulId(2));
        assert_eq!(store.count().expect("count"), 2);

        let found = store
            .find_one(&SoulFilter::by_name("alice"))
            .expect("find")
            .expect("present");
        assert_eq!(found, alice);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("souls.redb")).expect("open db");

        store.insert_unique(soul("alice")).expect("insert");
        let result = store.insert_unique(soul("alice"));

        assert!(matches!(result, Err(SoulError::AlreadyExists(_))));
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn find_all_is_ordered_by_name() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("souls.redb")).expect("open db");

        for name in ["carol", "alice", "bob"] {
            store.insert_unique(soul(name)).expect("insert");
        }

        let names: Vec<_> = store
            .find(&SoulFilter::all())
            .expect("find")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
        assert!(store.find(&SoulFilter::by_name("dave")).expect("find").is_empty());
    }

    #[test]
    fn edge_updates_report_changes() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("souls.redb")).expect("open db");
        store.insert_unique(soul("alice")).expect("insert");

        assert!(store.update_edge_set("alice", EdgeOp::Add, EdgeKind::Hostile, "bob").unwrap());
        assert!(!store.update_edge_set("alice", EdgeOp::Add, EdgeKind::Hostile, "bob").unwrap());

        let alice = store
            .find_one(&SoulFilter::by_name("alice"))
            .unwrap()
            .unwrap();
        assert!(alice.has_edge(EdgeKind::Hostile, "bob"));
        assert!(!alice.has_edge(EdgeKind::Ally, "bob"));

        assert!(store.update_edge_set("alice", EdgeOp::Remove, EdgeKind::Hostile, "bob").unwrap());
        assert!(!store.update_edge_set("alice", EdgeOp::Remove, EdgeKind::Hostile, "bob").unwrap());
    }

    #[test]
    fn edge_update_on_missing_soul_fails() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("souls.redb")).expect("open db");

        let result = store.update_edge_set("ghost", EdgeOp::Add, EdgeKind::Ally, "bob");
        assert!(matches!(result, Err(SoulError::NotFound(_))));
    }

    #[test]
    fn delete_removes_record() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("souls.redb")).expect("open db");
        store.insert_unique(soul("alice")).expect("insert");

        store.delete_one(&SoulFilter::by_name("alice")).expect("delete");
        assert_eq!(store.count().expect("count"), 0);
        assert!(matches!(
            store.delete_one(&SoulFilter::by_name("alice")),
            Err(SoulError::NotFound(_))
        ));
    }

    #[test]
    fn recovery_persistence_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("souls.redb");

        // Phase 1: create data
        {
            let store = RedbStore::open(&db_path).expect("open db");
            store.insert_unique(soul("alice")).expect("insert");
            store.insert_unique(soul("bob")).expect("insert");
            store
                .update_edge_set("alice", EdgeOp::Add, EdgeKind::Ally, "bob")
                .expect("edge");
        }

        // Phase 2: reopen and verify
        {
            let store = RedbStore::open(&db_path).expect("reopen db");
            assert_eq!(store.count().expect("count"), 2);

            let alice = store
                .find_one(&SoulFilter::by_name("alice"))
                .unwrap()
                .unwrap();
            assert!(alice.has_edge(EdgeKind::Ally, "bob"));

            // Id allocation continues after reopen
            let carol = store.insert_unique(soul("carol")).expect("insert");
            assert_eq!(carol.id, SoulId(3));
        }
    }

    #[test]
    fn recovery_credential_still_verifies_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("souls.redb");
        let manager = CredentialManager::with_costs(64, 1, 1).expect("params");

        {
            let store = RedbStore::open(&db_path).expect("open db");
            let record = Soul::new("alice", manager.hash_password("secret1").unwrap());
            store.insert_unique(record).expect("insert");
        }

        let store = RedbStore::open(&db_path).expect("reopen db");
        let alice = store
            .find_one(&SoulFilter::by_name("alice"))
            .unwrap()
            .unwrap();
        assert!(manager.verify_password("secret1", alice.credential()).unwrap());
    }

    #[test]
    fn concurrent_inserts_of_same_name_have_one_winner() {
        let temp = tempdir().expect("temp dir");
        let store = Arc::new(RedbStore::open(temp.path().join("souls.redb")).expect("open db"));
        let record = soul("alice");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let record = record.clone();
                std::thread::spawn(move || store.insert_unique(record).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn concurrent_edge_adds_are_all_kept() {
        let temp = tempdir().expect("temp dir");
        let store = Arc::new(RedbStore::open(temp.path().join("souls.redb")).expect("open db"));
        store.insert_unique(soul("alice")).expect("insert");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .update_edge_set("alice", EdgeOp::Add, EdgeKind::Ally, &format!("friend{i}"))
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }

        let alice = store
            .find_one(&SoulFilter::by_name("alice"))
            .unwrap()
            .unwrap();
        assert_eq!(alice.allies.len(), 8);
    }
}
