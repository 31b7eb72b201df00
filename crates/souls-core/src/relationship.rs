//! # Relationship Engine
//!
//! Applies ally/block/hostile edge transitions.
//!
//! Each (actor, target) pair carries three independent edges. Every action
//! toggles one of them:
//! - `addX` requires the target to exist and the edge to be absent
//! - `removeX` requires the edge to be present
//!
//! The pre-checks run against the caller's snapshot and are advisory. The
//! storage update is the authority: if the persisted set did not change,
//! the call fails even when the snapshot said otherwise.
//!
//! There is no transaction spanning the target existence check and the
//! actor update. A target deleted in between leaves a dangling edge.

use crate::identity::IdentityStore;
use crate::validation::Validator;
use crate::{Action, EdgeKind, EdgeOp, Principal, Soul, SoulError, SoulView};

/// Validates and applies relationship edge transitions.
#[derive(Debug, Clone)]
pub struct RelationshipEngine {
    identities: IdentityStore,
}

impl RelationshipEngine {
    /// Create an engine bound to an identity store.
    #[must_use]
    pub fn new(identities: IdentityStore) -> Self {
        Self { identities }
    }

    /// The identity store this engine reads targets from.
    #[must_use]
    pub fn identities(&self) -> &IdentityStore {
        &self.identities
    }

    /// Apply `action` towards `target` on behalf of `actor`.
    ///
    /// Returns the actor snapshot with only this call's mutation applied.
    /// Storage is not re-read.
    pub fn apply(&self, mut actor: Soul, action: Action, target: &str) -> Result<Soul, SoulError> {
        Validator::validate_name(target)?;

        let kind = action.kind();
        let op = action.op();

        match op {
            EdgeOp::Add => {
                if self.identities.find(target)?.is_none() {
                    return Err(SoulError::TargetNotFound(target.to_string()));
                }
                if actor.has_edge(kind, target) {
                    return Err(duplicate(kind, target));
                }
            }
            EdgeOp::Remove => {
                if !actor.has_edge(kind, target) {
                    return Err(missing(kind, target));
                }
            }
        }

        let changed = self
            .identities
            .store()
            .update_edge_set(&actor.name, op, kind, target)?;

        if !changed {
            tracing::debug!(
                actor = %actor.name,
                to = target,
                %action,
                "relationship lost race: stored set unchanged"
            );
            return Err(match op {
                EdgeOp::Add => duplicate(kind, target),
                EdgeOp::Remove => missing(kind, target),
            });
        }

        actor.apply_edge(op, kind, target);
        tracing::debug!(actor = %actor.name, to = target, %action, "relationship applied");
        Ok(actor)
    }

    /// Parse `action`, load the actor by name, and apply the transition.
    pub fn apply_relationship(
        &self,
        actor_name: &str,
        action: &str,
        target: &str,
    ) -> Result<SoulView, SoulError> {
        let action = parse_action(action)?;
        let actor = self
            .identities
            .find(actor_name)?
            .ok_or_else(|| SoulError::NotFound(actor_name.to_string()))?;

        self.apply(actor, action, target).map(SoulView::from)
    }

    /// Like [`apply_relationship`](Self::apply_relationship), for callers
    /// holding a login projection.
    ///
    /// The stored record must still carry the projection's id. A Soul that was
    /// deleted and re-created under the same name is a different identity and
    /// fails with `NotFound`.
    pub fn apply_as(
        &self,
        principal: &Principal,
        action: &str,
        target: &str,
    ) -> Result<SoulView, SoulError> {
        let action = parse_action(action)?;
        let actor = self
            .identities
            .find(&principal.name)?
            .filter(|soul| soul.id == principal.id)
            .ok_or_else(|| {
                tracing::debug!(
                    soul = %principal.name,
                    id = %principal.id,
                    "principal no longer matches a stored soul"
                );
                SoulError::NotFound(principal.name.clone())
            })?;

        self.apply(actor, action, target).map(SoulView::from)
    }
}

fn parse_action(action: &str) -> Result<Action, SoulError> {
    Validator::validate_action(action)?;
    action.parse()
}

fn duplicate(kind: EdgeKind, target: &str) -> SoulError {
    SoulError::DuplicateRelationship {
        kind,
        target: target.to_string(),
    }
}

fn missing(kind: EdgeKind, target: &str) -> SoulError {
    SoulError::RelationshipNotFound {
        kind,
        target: target.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
