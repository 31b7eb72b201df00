//! # Identity Store
//!
//! Creation, lookup, deletion and login of Souls.
//!
//! The store owns no data itself. It validates input, delegates hashing to
//! the [`CredentialManager`] and persistence to the injected [`SoulStore`].
//! Name uniqueness is decided by the storage insert, never by a pre-check.

use crate::store::SoulStore;
use crate::validation::Validator;
use crate::{CredentialManager, Principal, Soul, SoulError, SoulFilter};
use std::fmt;
use std::sync::Arc;

/// Identity operations over a shared storage handle.
#[derive(Clone)]
pub struct IdentityStore {
    store: Arc<dyn SoulStore>,
    credentials: CredentialManager,
}

impl fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityStore")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl IdentityStore {
    /// Create an identity store over the given storage handle.
    #[must_use]
    pub fn new(store: Arc<dyn SoulStore>, credentials: CredentialManager) -> Self {
        Self { store, credentials }
    }

    /// The underlying storage handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SoulStore> {
        &self.store
    }

    /// Create a new Soul with an empty relationship graph.
    ///
    /// Returns the stored record with its assigned id.
    pub fn create(&self, name: &str, password: &str) -> Result<Soul, SoulError> {
        Validator::validate_name(name)?;
        Validator::validate_password(password)?;

        let credential = self.credentials.hash_password(password)?;
        let soul = self.store.insert_unique(Soul::new(name, credential))?;

        tracing::debug!(soul = %soul.name, id = %soul.id, "created soul");
        Ok(soul)
    }

    /// Read every Soul matching the filter.
    pub fn read(&self, filter: &SoulFilter) -> Result<Vec<Soul>, SoulError> {
        self.store.find(filter)
    }

    /// Look up a single Soul by name.
    pub fn find(&self, name: &str) -> Result<Option<Soul>, SoulError> {
        self.store.find_one(&SoulFilter::by_name(name))
    }

    /// Delete the Soul with the given name.
    ///
    /// Relationship edges other Souls hold towards it are left in place.
    pub fn delete(&self, name: &str) -> Result<(), SoulError> {
        Validator::validate_name(name)?;
        self.store.delete_one(&SoulFilter::by_name(name))?;
        tracing::debug!(soul = %name, "deleted soul");
        Ok(())
    }

    /// Authenticate a Soul and return its minimal projection.
    ///
    /// Inputs are bounds-checked before the lookup, so a name that could
    /// never have been created (empty, over 64 bytes) fails `InvalidInput`
    /// rather than `NotFound`.
    pub fn login(&self, name: &str, password: &str) -> Result<Principal, SoulError> {
        Validator::validate_name(name)?;
        Validator::validate_password(password)?;

        let soul = self
            .find(name)?
            .ok_or_else(|| SoulError::NotFound(name.to_string()))?;

        if !self.credentials.verify_password(password, soul.credential())? {
            tracing::debug!(soul = %name, "login rejected: password mismatch");
            return Err(SoulError::PasswordMismatch);
        }

        tracing::debug!(soul = %name, id = %soul.id, "login accepted");
        Ok(soul.principal())
    }
}

// =============================================================================
// TESTS
// =============================================================================
