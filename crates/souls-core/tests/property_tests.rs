//! # Property-Based Tests
//!
//! Credential and edge round-trip invariants checked with proptest.
//!
//! Argon2 is run with minimal costs and a small case count so the suite
//! stays fast.

use proptest::prelude::*;
use souls_core::{
    Action, CredentialManager, EdgeKind, EdgeOp, ErrorKind, IdentityStore, MemoryStore,
    RelationshipEngine, SoulError,
};
use std::sync::Arc;

fn fast_manager() -> CredentialManager {
    CredentialManager::with_costs(64, 1, 1).expect("params")
}

fn engine() -> RelationshipEngine {
    let identities = IdentityStore::new(Arc::new(MemoryStore::new()), fast_manager());
    RelationshipEngine::new(identities)
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// A password always verifies against its own hash.
    #[test]
    fn password_verifies_against_own_hash(password in "\\PC{1,64}") {
        let manager = fast_manager();
        let credential = manager.hash_password(&password).expect("hash");
        prop_assert!(manager.verify_password(&password, &credential).expect("verify"));
    }

    /// A different password never verifies.
    #[test]
    fn other_password_never_verifies(
        password in "\\PC{1,32}",
        other in "\\PC{1,32}",
    ) {
        prop_assume!(password != other);
        let manager = fast_manager();
        let credential = manager.hash_password(&other).expect("hash");
        prop_assert!(!manager.verify_password(&password, &credential).expect("verify"));
    }

    /// absent -> add -> present -> remove -> absent, for every edge kind,
    /// repeated any number of times.
    #[test]
    fn edge_round_trip_is_idempotent(
        actor in name_strategy(),
        target in name_strategy(),
        kind_index in 0usize..3,
        rounds in 1usize..4,
    ) {
        prop_assume!(actor != target);
        let engine = engine();
        engine.identities().create(&actor, "pw").expect("create actor");
        engine.identities().create(&target, "pw").expect("create target");

        let kind = EdgeKind::ALL[kind_index];
        let add = Action::new(kind, EdgeOp::Add);
        let remove = Action::new(kind, EdgeOp::Remove);

        for _ in 0..rounds {
            let view = engine
                .apply_relationship(&actor, add.as_str(), &target)
                .expect("add");
            let present = match kind {
                EdgeKind::Ally => &view.allies,
                EdgeKind::Block => &view.blocks,
                EdgeKind::Hostile => &view.hostiles,
            };
            prop_assert_eq!(present, &vec![target.clone()]);

            let view = engine
                .apply_relationship(&actor, remove.as_str(), &target)
                .expect("remove");
            prop_assert!(view.allies.is_empty() && view.blocks.is_empty() && view.hostiles.is_empty());
        }
    }

    /// A second add without an intervening remove always conflicts.
    #[test]
    fn second_add_is_duplicate(kind_index in 0usize..3) {
        let engine = engine();
        engine.identities().create("alice", "pw").expect("create");
        engine.identities().create("bob", "pw").expect("create");

        let add = Action::new(EdgeKind::ALL[kind_index], EdgeOp::Add);
        engine.apply_relationship("alice", add.as_str(), "bob").expect("first add");

        let err = engine
            .apply_relationship("alice", add.as_str(), "bob")
            .expect_err("second add");
        prop_assert!(matches!(err, SoulError::DuplicateRelationship { .. }), "got {:?}", err);
        prop_assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    /// Any string outside the six recognized actions is rejected.
    #[test]
    fn unrecognized_action_rejected(action in "[a-zA-Z]{1,20}") {
        prop_assume!(Action::ALL.iter().all(|a| a.as_str() != action));
        let engine = engine();
        engine.identities().create("alice", "pw").expect("create");
        engine.identities().create("bob", "pw").expect("create");

        let err = engine
            .apply_relationship("alice", &action, "bob")
            .expect_err("invalid");
        prop_assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
