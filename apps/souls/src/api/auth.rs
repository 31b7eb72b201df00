//! # Session Authentication
//!
//! In-process session table for the Souls HTTP API.
//!
//! Login issues a random bearer token mapped to the caller's
//! [`Principal`]. Protected routes read it back from:
//! ```text
//! Authorization: Bearer <token>
//! ```
//! Sessions live in memory only and are lost on restart. Each one expires a
//! fixed time after login; expired entries are dropped on lookup and swept
//! whenever a new session is issued.

use super::types::ApiError;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use souls_core::{Principal, SoulError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Random bytes per session token, before encoding.
pub const TOKEN_BYTES: usize = 32;

/// Session lifetime when none is configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60_000);

// =============================================================================
// SESSION REGISTRY
// =============================================================================

#[derive(Debug, Clone)]
struct Session {
    principal: Principal,
    issued_at: Instant,
}

impl Session {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.issued_at.elapsed() >= ttl
    }
}

/// Maps issued bearer tokens to login projections.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry whose sessions expire `ttl` after issue.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Issue a new token for `principal`, sweeping expired sessions first.
    pub async fn issue(&self, principal: Principal) -> Result<String, SoulError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| SoulError::Hashing(format!("token generation: {}", e)))?;
        let token = URL_SAFE_NO_PAD.encode(bytes);

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl));
        let swept = before - sessions.len();
        if swept > 0 {
            tracing::debug!(swept, "expired sessions removed");
        }

        tracing::info!(soul = %principal.name, "session opened");
        sessions.insert(
            token.clone(),
            Session {
                principal,
                issued_at: Instant::now(),
            },
        );
        Ok(token)
    }

    /// Resolve a token to its principal. Expired tokens are removed.
    pub async fn lookup(&self, token: &str) -> Option<Principal> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return None,
                Some(session) if !session.is_expired(self.ttl) => {
                    return Some(session.principal.clone());
                }
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions
            .get(token)
            .is_some_and(|session| session.is_expired(self.ttl))
            && let Some(session) = sessions.remove(token)
        {
            tracing::info!(soul = %session.principal.name, "session expired");
        }
        None
    }

    /// Discard a session. Returns whether one existed.
    pub async fn revoke(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token);
        if let Some(session) = &removed {
            tracing::info!(soul = %session.principal.name, "session closed");
        }
        removed.is_some()
    }

    /// Discard every session opened by the Soul called `name`.
    ///
    /// Returns how many were removed.
    pub async fn revoke_soul(&self, name: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.principal.name != name);
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(soul = %name, removed, "sessions revoked");
        }
        removed
    }

    /// Number of stored sessions, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Extract the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Require a valid session.
///
/// On success the caller's [`Principal`] is inserted into the request
/// extensions for handlers to extract.
pub async fn require_session(
    State(sessions): State<SessionRegistry>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()) else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_authorization_header",
            "Missing Authorization header"
        );
        return Err(ApiError::unauthorized());
    };

    let Some(principal) = sessions.lookup(token).await else {
        tracing::warn!(
            event = "auth_failure",
            reason = "unknown_session",
            "Authentication failed: unknown session token"
        );
        return Err(ApiError::unauthorized());
    };

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

// =============================================================================
// TESTS
// =============================================================================
