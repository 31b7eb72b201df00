//! # Soul Store
//!
//! The storage boundary of the core, plus a volatile in-memory backend.
//!
//! The core never locks across requests. Every operation on a
//! [`SoulStore`] must be atomic on its own:
//! - `insert_unique` is the only arbiter of name uniqueness
//! - `update_edge_set` is an isolated add-to-set / remove-from-set
//! - `delete_one` removes exactly one record or fails
//!
//! Backends:
//! - [`MemoryStore`]: lock-guarded ordered map (fast, volatile)
//! - [`crate::RedbStore`]: embedded ACID database (persistent)

use crate::{EdgeKind, EdgeOp, Soul, SoulError, SoulFilter, SoulId};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Storage collaborator for identity records.
///
/// Implementations must be safe to share across concurrent requests.
pub trait SoulStore: Send + Sync {
    /// Find the first record matching the filter.
    fn find_one(&self, filter: &SoulFilter) -> Result<Option<Soul>, SoulError> {
        Ok(self.find(filter)?.into_iter().next())
    }

    /// Find all records matching the filter, ordered by name.
    fn find(&self, filter: &SoulFilter) -> Result<Vec<Soul>, SoulError>;

    /// Insert a record keyed by its name, assigning its id.
    ///
    /// Returns `SoulError::AlreadyExists` if the name is taken. The check and
    /// the insert are a single atomic step.
    fn insert_unique(&self, soul: Soul) -> Result<Soul, SoulError>;

    /// Add `value` to or remove it from the `kind` set of the named record.
    ///
    /// Returns whether the persisted set changed. Returns
    /// `SoulError::NotFound` if the record does not exist.
    fn update_edge_set(
        &self,
        name: &str,
        op: EdgeOp,
        kind: EdgeKind,
        value: &str,
    ) -> Result<bool, SoulError>;

    /// Delete the first record matching the filter.
    ///
    /// Returns `SoulError::NotFound` if nothing matches.
    fn delete_one(&self, filter: &SoulFilter) -> Result<(), SoulError>;

    /// Get the total number of records.
    fn count(&self) -> Result<usize, SoulError>;
}

// =============================================================================
// IN-MEMORY BACKEND
// =============================================================================

#[derive(Debug)]
struct MemoryState {
    souls: BTreeMap<String, Soul>,
    next_id: u64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            souls: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// A volatile store backed by an ordered map behind a `RwLock`.
///
/// Each trait operation holds the lock for its whole duration, which gives
/// the same per-operation atomicity as the persistent backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

fn poisoned<T>(_: T) -> SoulError {
    SoulError::Storage("memory store lock poisoned".to_string())
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SoulStore for MemoryStore {
    fn find_one(&self, filter: &SoulFilter) -> Result<Option<Soul>, SoulError> {
        let state = self.state.read().map_err(poisoned)?;
        match filter.name.as_deref() {
            Some(name) => Ok(state.souls.get(name).cloned()),
            None => Ok(state.souls.values().next().cloned()),
        }
    }

    fn find(&self, filter: &SoulFilter) -> Result<Vec<Soul>, SoulError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .souls
            .values()
            .filter(|soul| filter.matches(soul))
            .cloned()
            .collect())
    }

    fn insert_unique(&self, mut soul: Soul) -> Result<Soul, SoulError> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.souls.contains_key(&soul.name) {
            return Err(SoulError::AlreadyExists(soul.name));
        }

        soul.id = SoulId(state.next_id);
        state.next_id = state.next_id.saturating_add(1);
        state.souls.insert(soul.name.clone(), soul.clone());

        tracing::debug!(soul = %soul.name, id = %soul.id, "memory store: inserted soul");
        Ok(soul)
    }

    fn update_edge_set(
        &self,
        name: &str,
        op: EdgeOp,
        kind: EdgeKind,
        value: &str,
    ) -> Result<bool, SoulError> {
        let mut state = self.state.write().map_err(poisoned)?;
        let soul = state
            .souls
            .get_mut(name)
            .ok_or_else(|| SoulError::NotFound(name.to_string()))?;
        Ok(soul.apply_edge(op, kind, value))
    }

    fn delete_one(&self, filter: &SoulFilter) -> Result<(), SoulError> {
        let mut state = self.state.write().map_err(poisoned)?;
        let key = state
            .souls
            .values()
            .find(|soul| filter.matches(soul))
            .map(|soul| soul.name.clone());

        match key {
            Some(name) => {
                state.souls.remove(&name);
                tracing::debug!(soul = %name, "memory store: deleted soul");
                Ok(())
            }
            None => Err(SoulError::NotFound(
                filter.name.clone().unwrap_or_else(|| "<any>".to_string()),
            )),
        }
    }

    fn count(&self) -> Result<usize, SoulError> {
        Ok(self.state.read().map_err(poisoned)?.souls.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
