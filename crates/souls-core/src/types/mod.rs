//! # Core Type Definitions
//!
//! This module contains the plain data records of the Souls core:
//! - Identifiers and records (`SoulId`, `Soul`)
//! - Outward projections (`SoulView`, `Principal`)
//! - Relationship vocabulary (`EdgeKind`, `EdgeOp`, `Action`)
//! - Read filters (`SoulFilter`)
//! - Error types (`SoulError`, `ErrorKind`)
//!
//! Records carry no persistence behaviour. Operations live in
//! [`crate::IdentityStore`] and [`crate::RelationshipEngine`], which take a
//! storage handle at construction.

use crate::credential::Credential;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Storage-assigned identifier of a Soul.
///
/// `SoulId(0)` marks a record that has not been inserted yet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SoulId(pub u64);

impl SoulId {
    /// The placeholder id carried by records before insertion.
    pub const UNASSIGNED: Self = Self(0);

    /// Get the raw id value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SoulId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// RELATIONSHIP VOCABULARY
// =============================================================================

/// The three independent edge labels an actor can hold towards a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Ally,
    Block,
    Hostile,
}

impl EdgeKind {
    /// All edge kinds, in persisted field order.
    pub const ALL: [Self; 3] = [Self::Ally, Self::Block, Self::Hostile];

    /// Name of the persisted set field holding this kind of edge.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Ally => "allies",
            Self::Block => "blocks",
            Self::Hostile => "hostiles",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Set mutation applied to a persisted edge field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeOp {
    Add,
    Remove,
}

/// A relationship action as accepted at the boundary.
///
/// Each action toggles exactly one edge kind in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    AddAlly,
    RemoveAlly,
    AddBlock,
    RemoveBlock,
    AddHostile,
    RemoveHostile,
}

impl Action {
    /// Every recognized action.
    pub const ALL: [Self; 6] = [
        Self::AddAlly,
        Self::RemoveAlly,
        Self::AddBlock,
        Self::RemoveBlock,
        Self::AddHostile,
        Self::RemoveHostile,
    ];

    /// Build the action for an edge kind and operation.
    #[must_use]
    pub const fn new(kind: EdgeKind, op: EdgeOp) -> Self {
        match (kind, op) {
            (EdgeKind::Ally, EdgeOp::Add) => Self::AddAlly,
            (EdgeKind::Ally, EdgeOp::Remove) => Self::RemoveAlly,
            (EdgeKind::Block, EdgeOp::Add) => Self::AddBlock,
            (EdgeKind::Block, EdgeOp::Remove) => Self::RemoveBlock,
            (EdgeKind::Hostile, EdgeOp::Add) => Self::AddHostile,
            (EdgeKind::Hostile, EdgeOp::Remove) => Self::RemoveHostile,
        }
    }

    /// The edge this action toggles.
    #[must_use]
    pub const fn kind(self) -> EdgeKind {
        match self {
            Self::AddAlly | Self::RemoveAlly => EdgeKind::Ally,
            Self::AddBlock | Self::RemoveBlock => EdgeKind::Block,
            Self::AddHostile | Self::RemoveHostile => EdgeKind::Hostile,
        }
    }

    /// The direction of the toggle.
    #[must_use]
    pub const fn op(self) -> EdgeOp {
        match self {
            Self::AddAlly | Self::AddBlock | Self::AddHostile => EdgeOp::Add,
            Self::RemoveAlly | Self::RemoveBlock | Self::RemoveHostile => EdgeOp::Remove,
        }
    }

    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddAlly => "addAlly",
            Self::RemoveAlly => "removeAlly",
            Self::AddBlock => "addBlock",
            Self::RemoveBlock => "removeBlock",
            Self::AddHostile => "addHostile",
            Self::RemoveHostile => "removeHostile",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = SoulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| SoulError::InvalidAction(s.to_string()))
    }
}

// =============================================================================
// SOUL RECORD
// =============================================================================

/// A named identity with a credential and three relationship sets.
///
/// A `Soul` held by a caller is a snapshot of the stored record. It may go
/// stale as soon as another request mutates the same record.
///
/// Not `Serialize`, since it carries the credential. Outward JSON goes through
/// [`SoulView`] or [`Principal`]; the on-disk layout belongs to the storage
/// backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soul {
    /// Storage-assigned identifier.
    pub id: SoulId,
    /// Unique, immutable name.
    pub name: String,
    credential: Credential,
    pub allies: BTreeSet<String>,
    pub blocks: BTreeSet<String>,
    pub hostiles: BTreeSet<String>,
}

impl Soul {
    /// Create an unsaved record with empty relationship sets.
    pub(crate) fn new(name: impl Into<String>, credential: Credential) -> Self {
        Self {
            id: SoulId::UNASSIGNED,
            name: name.into(),
            credential,
            allies: BTreeSet::new(),
            blocks: BTreeSet::new(),
            hostiles: BTreeSet::new(),
        }
    }

    pub(crate) fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The set holding edges of the given kind.
    #[must_use]
    pub fn edges(&self, kind: EdgeKind) -> &BTreeSet<String> {
        match kind {
            EdgeKind::Ally => &self.allies,
            EdgeKind::Block => &self.blocks,
            EdgeKind::Hostile => &self.hostiles,
        }
    }

    /// Mutable access to the set holding edges of the given kind.
    pub fn edges_mut(&mut self, kind: EdgeKind) -> &mut BTreeSet<String> {
        match kind {
            EdgeKind::Ally => &mut self.allies,
            EdgeKind::Block => &mut self.blocks,
            EdgeKind::Hostile => &mut self.hostiles,
        }
    }

    /// Check whether the edge `kind` towards `target` is present.
    #[must_use]
    pub fn has_edge(&self, kind: EdgeKind, target: &str) -> bool {
        self.edges(kind).contains(target)
    }

    /// Apply a set mutation to this snapshot. Returns whether the set changed.
    pub fn apply_edge(&mut self, op: EdgeOp, kind: EdgeKind, target: &str) -> bool {
        let set = self.edges_mut(kind);
        match op {
            EdgeOp::Add => set.insert(target.to_string()),
            EdgeOp::Remove => set.remove(target),
        }
    }

    /// Project to the public view (no credential material).
    #[must_use]
    pub fn view(&self) -> SoulView {
        SoulView::from(self)
    }

    /// Project to the minimal login principal.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

// =============================================================================
// PROJECTIONS
// =============================================================================

/// Public view of a Soul. Omits the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoulView {
    pub id: SoulId,
    pub name: String,
    pub allies: Vec<String>,
    pub blocks: Vec<String>,
    pub hostiles: Vec<String>,
}

impl From<&Soul> for SoulView {
    fn from(soul: &Soul) -> Self {
        Self {
            id: soul.id,
            name: soul.name.clone(),
            allies: soul.allies.iter().cloned().collect(),
            blocks: soul.blocks.iter().cloned().collect(),
            hostiles: soul.hostiles.iter().cloned().collect(),
        }
    }
}

impl From<Soul> for SoulView {
    fn from(soul: Soul) -> Self {
        Self {
            id: soul.id,
            name: soul.name,
            allies: soul.allies.into_iter().collect(),
            blocks: soul.blocks.into_iter().collect(),
            hostiles: soul.hostiles.into_iter().collect(),
        }
    }
}

/// The minimal identity projection returned by login.
///
/// This is the only value that crosses into the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: SoulId,
    pub name: String,
}

// =============================================================================
// FILTERS
// =============================================================================

/// Filter for identity reads. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoulFilter {
    #[serde(default)]
    pub name: Option<String>,
}

impl SoulFilter {
    /// Match every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match the record with the given name.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Check a record against this filter.
    #[must_use]
    pub fn matches(&self, soul: &Soul) -> bool {
        self.name.as_deref().is_none_or(|name| soul.name == name)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Coarse error taxonomy exposed to callers.
///
/// The routing layer maps these to user-facing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Auth,
    State,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Auth => "auth",
            Self::State => "state",
            Self::Storage => "storage",
        };
        f.write_str(label)
    }
}

/// Errors that can occur in the Souls core.
///
/// - No silent failures
/// - Every core operation returns `Result<T, SoulError>`
/// - Storage failures are passed through with their message
#[derive(Debug, Error)]
pub enum SoulError {
    /// A required parameter is missing, empty or out of bounds.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The relationship action is not one of the recognized actions.
    #[error("Action is invalid: {0}")]
    InvalidAction(String),

    /// The named soul does not exist.
    #[error("Soul not found: {0}")]
    NotFound(String),

    /// The target of a relationship does not exist.
    #[error("Target soul not found: {0}")]
    TargetNotFound(String),

    /// A soul with this name already exists.
    #[error("Soul already exists: {0}")]
    AlreadyExists(String),

    /// The edge is already present.
    #[error("{target} is already in the {kind} list")]
    DuplicateRelationship { kind: EdgeKind, target: String },

    /// The edge to remove is not present.
    #[error("{target} is not in the {kind} list")]
    RelationshipNotFound { kind: EdgeKind, target: String },

    /// The candidate password does not match the stored credential.
    #[error("Mismatched password")]
    PasswordMismatch,

    /// The stored credential is missing or malformed.
    #[error("Corrupt credential: {0}")]
    CorruptCredential(String),

    /// Password hashing or salt generation failed.
    #[error("Hashing error: {0}")]
    Hashing(String),

    /// The storage collaborator failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SoulError {
    /// Map this error onto the caller-facing taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::InvalidAction(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::TargetNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) | Self::DuplicateRelationship { .. } => ErrorKind::Conflict,
            Self::PasswordMismatch => ErrorKind::Auth,
            Self::RelationshipNotFound { .. } => ErrorKind::State,
            Self::CorruptCredential(_)
            | Self::Hashing(_)
            | Self::Storage(_)
            | Self::Serialization(_) => ErrorKind::Storage,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
