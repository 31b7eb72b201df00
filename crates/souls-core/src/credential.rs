//! # Credential Manager
//!
//! Salted password hashing and verification.
//!
//! - A fresh random salt is drawn from the OS for every hash
//! - Hashes are derived with Argon2id, never a general-purpose digest
//! - Verification recomputes the hash and compares in constant time
//! - Plaintext passwords are never logged, stored or returned
//!
//! The stored form is a `{salt, hash}` pair, both base64 encoded.

use crate::SoulError;
use crate::primitives::{HASH_LENGTH, SALT_LENGTH};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

// =============================================================================
// CREDENTIAL
// =============================================================================

/// The stored salted-hash pair for a password.
///
/// Opaque outside this crate: there are no public accessors, and `Debug`
/// output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    salt: String,
    hash: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").finish_non_exhaustive()
    }
}

impl Credential {
    #[cfg(test)]
    pub(crate) fn from_parts(salt: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            salt: salt.into(),
            hash: hash.into(),
        }
    }

    /// Decode the stored pair, rejecting anything that could not have been
    /// produced by [`CredentialManager::hash_password`].
    fn decode(&self) -> Result<(Vec<u8>, Vec<u8>), SoulError> {
        if self.salt.is_empty() {
            return Err(SoulError::CorruptCredential("missing salt".to_string()));
        }
        if self.hash.is_empty() {
            return Err(SoulError::CorruptCredential("missing hash".to_string()));
        }

        let salt = STANDARD
            .decode(&self.salt)
            .map_err(|e| SoulError::CorruptCredential(format!("salt: {}", e)))?;
        let hash = STANDARD
            .decode(&self.hash)
            .map_err(|e| SoulError::CorruptCredential(format!("hash: {}", e)))?;

        if salt.len() != SALT_LENGTH {
            return Err(SoulError::CorruptCredential(format!(
                "salt is {} bytes, expected {}",
                salt.len(),
                SALT_LENGTH
            )));
        }
        if hash.len() != HASH_LENGTH {
            return Err(SoulError::CorruptCredential(format!(
                "hash is {} bytes, expected {}",
                hash.len(),
                HASH_LENGTH
            )));
        }

        Ok((salt, hash))
    }
}

// =============================================================================
// CREDENTIAL MANAGER
// =============================================================================

/// Hashes and verifies passwords with Argon2id.
///
/// The cost parameters are fixed per manager. Credentials hashed under one
/// set of parameters only verify under the same parameters.
#[derive(Debug, Clone, Default)]
pub struct CredentialManager {
    params: Params,
}

impl CredentialManager {
    /// Create a manager from raw cost settings.
    ///
    /// Returns `SoulError::InvalidInput` if Argon2 rejects the combination
    /// (e.g. memory below `8 * parallelism` KiB).
    pub fn with_costs(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, SoulError> {
        let params = Params::new(memory_kib, iterations, parallelism, Some(HASH_LENGTH))
            .map_err(|e| SoulError::InvalidInput(format!("argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    /// Hash a plaintext password under a fresh random salt.
    pub fn hash_password(&self, plaintext: &str) -> Result<Credential, SoulError> {
        let mut salt = [0u8; SALT_LENGTH];
        getrandom::getrandom(&mut salt)
            .map_err(|e| SoulError::Hashing(format!("salt generation: {}", e)))?;

        let hash = self.derive(plaintext.as_bytes(), &salt)?;

        Ok(Credential {
            salt: STANDARD.encode(salt),
            hash: STANDARD.encode(hash),
        })
    }

    /// Verify a candidate password against a stored credential.
    ///
    /// Returns `Ok(false)` on mismatch and `SoulError::CorruptCredential`
    /// when the stored pair cannot be decoded.
    pub fn verify_password(&self, candidate: &str, stored: &Credential) -> Result<bool, SoulError> {
        let (salt, expected) = stored.decode()?;
        let computed = self.derive(candidate.as_bytes(), &salt)?;
        Ok(computed.as_slice().ct_eq(expected.as_slice()).into())
    }

    fn derive(&self, password: &[u8], salt: &[u8]) -> Result<[u8; HASH_LENGTH], SoulError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let mut out = [0u8; HASH_LENGTH];
        argon2
            .hash_password_into(password, salt, &mut out)
            .map_err(|e| SoulError::Hashing(e.to_string()))?;
        Ok(out)
    }
}

// =============================================================================
// TESTS
// =============================================================================
