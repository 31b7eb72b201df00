//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API, and the error
//! type every handler returns.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use souls_core::{ErrorKind, Principal, SoulError, SoulId};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

// Missing fields deserialize as empty strings so the core reports them as
// validation errors instead of axum rejecting the body.

/// Body of `/souls/create` and `/souls/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `/souls/delete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub name: String,
}

/// Query string of `/souls/get`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

/// Body of `/souls/relationship`.
///
/// `name` is the relationship target. The actor is the session holder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The session-facing projection of a Soul.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalJson {
    pub id: u64,
    pub name: String,
}

impl From<&Principal> for PrincipalJson {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.value(),
            name: principal.name.clone(),
        }
    }
}

impl From<PrincipalJson> for Principal {
    fn from(json: PrincipalJson) -> Self {
        Self {
            id: SoulId(json.id),
            name: json.name,
        }
    }
}

/// Successful login: the bearer token and who it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub soul: PrincipalJson,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body: `{"error": "...", "kind": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

/// An error on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
}

impl ApiError {
    /// Missing or unknown session token.
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            kind: ErrorKind::Auth,
            message: "Unauthorized".to_string(),
        }
    }

    /// Failure outside the core (e.g. a crashed blocking task).
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: ErrorKind::Storage,
            message: "Internal server error".to_string(),
        }
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The caller-facing error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Map an error kind to its HTTP status.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::State => StatusCode::CONFLICT,
        ErrorKind::Auth => StatusCode::UNAUTHORIZED,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SoulError> for ApiError {
    fn from(err: SoulError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Storage {
            // Internal detail stays in the log
            tracing::error!(error = %err, "storage failure");
            return Self::internal();
        }

        Self {
            status: status_for(kind),
            kind,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            kind: self.kind,
        };
        (self.status, Json(body)).into_response()
    }
}
