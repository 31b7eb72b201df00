//! # souls-core
//!
//! The identity and relationship engine for Souls - THE LOGIC.
//!
//! This crate implements the two subsystems that do real work:
//! - the Credential Manager, which never stores or compares plaintext
//!   passwords
//! - the Relationship Engine, which applies ally/block/hostile edge
//!   transitions under concurrent mutation
//!
//! ## Architectural Constraints
//!
//! - Storage is a trait ([`SoulStore`]) constructed once and injected,
//!   never a process-wide handle
//! - Records (`Soul`, `SoulView`, `Principal`) are plain data; operations
//!   live in stateless components
//! - Name uniqueness and set membership are decided by storage atomics
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod credential;
pub mod identity;
pub mod primitives;
pub mod relationship;
pub mod storage;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Action, EdgeKind, EdgeOp, ErrorKind, Principal, Soul, SoulError, SoulFilter, SoulId, SoulView,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use credential::{Credential, CredentialManager};
pub use identity::IdentityStore;
pub use relationship::RelationshipEngine;
pub use storage::RedbStore;
pub use store::{MemoryStore, SoulStore};
pub use validation::Validator;
