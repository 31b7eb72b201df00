//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Core calls are synchronous (password hashing is deliberately slow, and
//! redb does blocking I/O), so every one runs on the blocking pool.

use super::{
    AppState,
    auth::bearer_token,
    types::{
        ApiError, CredentialsRequest, HealthResponse, LoginResponse, MessageResponse, NameQuery,
        NameRequest, PrincipalJson, RelationshipRequest,
    },
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use souls_core::{Principal, SoulError, SoulFilter, SoulView, Validator};

/// Run a core call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, SoulError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "blocking task failed");
            ApiError::internal()
        })?
        .map_err(ApiError::from)
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// IDENTITY HANDLERS
// =============================================================================

/// Create a new Soul.
pub async fn create_handler(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<SoulView>, ApiError> {
    let identities = state.identities.clone();
    let soul = blocking(move || identities.create(&request.name, &request.password)).await?;

    tracing::info!(soul = %soul.name, id = %soul.id, "soul created");
    Ok(Json(soul.view()))
}

/// Delete a Soul by name.
pub async fn delete_handler(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let identities = state.identities.clone();
    let name = request.name.clone();
    blocking(move || identities.delete(&name)).await?;
    state.sessions.revoke_soul(&request.name).await;

    tracing::info!(soul = %request.name, "soul deleted");
    Ok(Json(MessageResponse::new(format!("Deleted {}", request.name))))
}

/// Fetch zero or one Soul by name.
pub async fn get_handler(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<SoulView>>, ApiError> {
    let name = query.name.unwrap_or_default();
    Validator::validate_name(&name)?;

    let identities = state.identities.clone();
    let souls = blocking(move || identities.read(&SoulFilter::by_name(name))).await?;
    Ok(Json(souls.into_iter().map(SoulView::from).collect()))
}

/// List every Soul.
pub async fn all_handler(State(state): State<AppState>) -> Result<Json<Vec<SoulView>>, ApiError> {
    let identities = state.identities.clone();
    let souls = blocking(move || identities.read(&SoulFilter::all())).await?;
    Ok(Json(souls.into_iter().map(SoulView::from).collect()))
}

// =============================================================================
// SESSION HANDLERS
// =============================================================================

/// Log in and open a session.
///
/// A request that already carries a valid session gets that session back
/// without re-authenticating.
pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if let Some(token) = bearer_token(&headers)
        && let Some(principal) = state.sessions.lookup(token).await
    {
        return Ok(Json(LoginResponse {
            token: token.to_string(),
            soul: PrincipalJson::from(&principal),
        }));
    }

    let identities = state.identities.clone();
    let principal = blocking(move || identities.login(&request.name, &request.password)).await?;

    let soul = PrincipalJson::from(&principal);
    let token = state.sessions.issue(principal).await?;
    Ok(Json(LoginResponse { token, soul }))
}

/// Close the caller's session, if any.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<MessageResponse> {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token).await;
    }
    Json(MessageResponse::new("Logged out"))
}

// =============================================================================
// RELATIONSHIP HANDLER
// =============================================================================

/// Apply a relationship action from the session holder towards `name`.
///
/// The session's principal must still match the stored Soul by id.
pub async fn relationship_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<RelationshipRequest>,
) -> Result<Json<SoulView>, ApiError> {
    let engine = state.relationships.clone();
    let actor = principal.clone();
    let RelationshipRequest { action, name } = request;

    let view = blocking(move || engine.apply_as(&actor, &action, &name)).await?;

    tracing::info!(soul = %principal.name, "relationship updated");
    Ok(Json(view))
}
