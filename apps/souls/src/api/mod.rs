//! # Souls HTTP API Module
//!
//! This module implements the HTTP JSON API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /souls/create` - Create a soul
//! - `POST /souls/delete` - Delete a soul
//! - `GET /souls/get?name=` - Fetch a soul by name
//! - `GET /souls/all` - List every soul
//! - `POST /souls/login` - Open a session
//! - `POST /souls/logout` - Close the caller's session
//! - `POST /souls/relationship` - Apply a relationship action (session required)
//!
//! ## Security Configuration
//!
//! - `SOULS_CORS_ORIGINS` / `[server].cors_origins`: Comma-separated list of
//!   allowed origins, or "*" for all (default: localhost only)

mod auth;
mod handlers;
mod types;

pub use auth::{
    DEFAULT_SESSION_TTL, SessionRegistry, TOKEN_BYTES, bearer_token, require_session,
};
pub use handlers::{
    all_handler, create_handler, delete_handler, get_handler, health_handler, login_handler,
    logout_handler, relationship_handler,
};
pub use types::{
    ApiError, CredentialsRequest, ErrorResponse, HealthResponse, LoginResponse, MessageResponse,
    NameQuery, NameRequest, PrincipalJson, RelationshipRequest, status_for,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use souls_core::{CredentialManager, IdentityStore, RelationshipEngine, SoulError, SoulStore};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the core components plus the session table.
#[derive(Debug, Clone)]
pub struct AppState {
    pub identities: IdentityStore,
    pub relationships: RelationshipEngine,
    pub sessions: SessionRegistry,
    cors_origins: Option<String>,
}

impl AppState {
    /// Create app state over a storage handle.
    #[must_use]
    pub fn new(store: Arc<dyn SoulStore>, credentials: CredentialManager) -> Self {
        let identities = IdentityStore::new(store, credentials);
        Self {
            relationships: RelationshipEngine::new(identities.clone()),
            identities,
            sessions: SessionRegistry::new(),
            cors_origins: None,
        }
    }

    /// Replace the session table with one whose tokens expire after `ttl`.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = SessionRegistry::with_ttl(ttl);
        self
    }

    /// Set the allowed CORS origins (comma-separated, or "*").
    #[must_use]
    pub fn with_cors_origins(mut self, origins: Option<String>) -> Self {
        self.cors_origins = origins;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from the configured origins.
///
/// - `"*"`: allows all origins (development only)
/// - unset: localhost only
/// - otherwise: the comma-separated list of origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:6060",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:6060",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Session - only on `/souls/relationship`
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.cors_origins.as_deref());

    let protected = Router::new()
        .route("/souls/relationship", post(handlers::relationship_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.sessions.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/souls/create", post(handlers::create_handler))
        .route("/souls/delete", post(handlers::delete_handler))
        .route("/souls/get", get(handlers::get_handler))
        .route("/souls/all", get(handlers::all_handler))
        .route("/souls/login", post(handlers::login_handler))
        .route("/souls/logout", post(handlers::logout_handler))
        .merge(protected)
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), SoulError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SoulError::Storage(format!("Bind failed: {}", e)))?;

    tracing::info!("Souls HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| SoulError::Storage(format!("Server error: {}", e)))
}
