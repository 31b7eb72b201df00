//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AppState};
use crate::config::{Backend, SoulsConfig};
use souls_core::{
    IdentityStore, MemoryStore, RedbStore, RelationshipEngine, SoulError, SoulFilter, SoulStore,
    SoulView,
};
use std::sync::Arc;

// =============================================================================
// STORE CONSTRUCTION
// =============================================================================

/// Open the storage backend named by the config.
pub fn open_store(config: &SoulsConfig) -> Result<Arc<dyn SoulStore>, SoulError> {
    match config.storage.backend {
        Backend::Redb => Ok(Arc::new(RedbStore::open(&config.storage.path)?)),
        Backend::Memory => {
            tracing::warn!("memory backend selected: nothing will be persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Build the identity store for a one-shot command.
pub fn open_identities(config: &SoulsConfig) -> Result<IdentityStore, SoulError> {
    Ok(IdentityStore::new(
        open_store(config)?,
        config.credentials.manager()?,
    ))
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

fn print_soul(view: &SoulView) {
    println!("Soul {} (id {})", view.name, view.id);
    println!("  Allies:   {}", view.allies.join(", "));
    println!("  Blocks:   {}", view.blocks.join(", "));
    println!("  Hostiles: {}", view.hostiles.join(", "));
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &SoulsConfig) -> Result<(), SoulError> {
    let state = AppState::new(open_store(config)?, config.credentials.manager()?)
        .with_cors_origins(config.server.cors_origins.clone())
        .with_session_ttl(config.server.session_ttl());

    println!("Souls Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.server.host);
    println!("  Port:     {}", config.server.port);
    println!("  Backend:  {}", config.storage.backend);
    println!("  Database: {:?}", config.storage.path);
    println!("  Sessions: {}s", config.server.session_ttl_secs);
    println!();
    println!("Endpoints:");
    println!("  POST /souls/create       - Create a soul");
    println!("  POST /souls/delete       - Delete a soul");
    println!("  GET  /souls/get?name=    - Fetch a soul");
    println!("  GET  /souls/all          - List souls");
    println!("  POST /souls/login        - Open a session");
    println!("  POST /souls/logout       - Close a session");
    println!("  POST /souls/relationship - Apply a relationship action");
    println!("  GET  /health             - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    api::run_server(&addr, state).await
}

// =============================================================================
// IDENTITY COMMANDS
// =============================================================================

/// Create a soul.
pub fn cmd_create(
    config: &SoulsConfig,
    json_mode: bool,
    name: &str,
    password: &str,
) -> Result<(), SoulError> {
    let soul = open_identities(config)?.create(name, password)?;

    if json_mode {
        print_json(&serde_json::json!(soul.view()));
    } else {
        println!("Created soul {} (id {})", soul.name, soul.id);
    }
    Ok(())
}

/// Delete a soul.
pub fn cmd_delete(config: &SoulsConfig, json_mode: bool, name: &str) -> Result<(), SoulError> {
    open_identities(config)?.delete(name)?;

    if json_mode {
        print_json(&serde_json::json!({ "deleted": name }));
    } else {
        println!("Deleted soul {}", name);
    }
    Ok(())
}

/// List every soul.
pub fn cmd_list(config: &SoulsConfig, json_mode: bool) -> Result<(), SoulError> {
    let views: Vec<SoulView> = open_identities(config)?
        .read(&SoulFilter::all())?
        .into_iter()
        .map(SoulView::from)
        .collect();

    if json_mode {
        print_json(&serde_json::json!(views));
        return Ok(());
    }

    println!("Souls ({})", views.len());
    println!("=========");
    for view in &views {
        println!(
            "{:>6}  {}  (allies {}, blocks {}, hostiles {})",
            view.id,
            view.name,
            view.allies.len(),
            view.blocks.len(),
            view.hostiles.len()
        );
    }
    Ok(())
}

/// Show one soul.
pub fn cmd_get(config: &SoulsConfig, json_mode: bool, name: &str) -> Result<(), SoulError> {
    let soul = open_identities(config)?
        .find(name)?
        .ok_or_else(|| SoulError::NotFound(name.to_string()))?;
    let view = soul.view();

    if json_mode {
        print_json(&serde_json::json!(view));
    } else {
        print_soul(&view);
    }
    Ok(())
}

/// Check credentials and print the login projection.
pub fn cmd_login(
    config: &SoulsConfig,
    json_mode: bool,
    name: &str,
    password: &str,
) -> Result<(), SoulError> {
    let principal = open_identities(config)?.login(name, password)?;

    if json_mode {
        print_json(&serde_json::json!({ "id": principal.id, "name": principal.name }));
    } else {
        println!("Login OK: {} (id {})", principal.name, principal.id);
    }
    Ok(())
}

// =============================================================================
// RELATIONSHIP COMMAND
// =============================================================================

/// Apply a relationship action on behalf of `name`.
pub fn cmd_relate(
    config: &SoulsConfig,
    json_mode: bool,
    name: &str,
    action: &str,
    target: &str,
) -> Result<(), SoulError> {
    let engine = RelationshipEngine::new(open_identities(config)?);
    let view = engine.apply_relationship(name, action, target)?;

    if json_mode {
        print_json(&serde_json::json!(view));
    } else {
        println!("Applied {} {} -> {}", action, name, target);
        print_soul(&view);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
