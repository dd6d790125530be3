use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::ApiPath;
use crate::state::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account id.
    pub sub: String,
    pub is_admin: bool,
    pub iat: usize,
    pub exp: usize,
}

/// The verified caller, available to handlers through request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub account_id: Uuid,
    pub is_admin: bool,
}

// ============================================================================
// Policies
// ============================================================================

pub fn is_admin(identity: &Identity) -> bool {
    identity.is_admin
}

pub fn is_self_or_admin(identity: &Identity, account_id: Uuid) -> bool {
    identity.is_admin || identity.account_id == account_id
}

// ============================================================================
// Token handling
// ============================================================================

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Checks signature and expiry. Every failure reads the same to the caller.
pub fn verify_token(secret: &str, token: &str) -> Result<Identity, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::unauthenticated()
    })?;

    let account_id = token_data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AppError::unauthenticated())?;

    Ok(Identity {
        account_id,
        is_admin: token_data.claims.is_admin,
    })
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, AppError> {
    let token = extract_token(headers).ok_or_else(AppError::unauthenticated)?;
    verify_token(state.auth.secret.expose(), &token)
}

// ============================================================================
// Middleware
// ============================================================================

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(&state, req.headers())?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(&state, req.headers())?;
    if !is_admin(&identity) {
        return Err(AppError::forbidden());
    }
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Applied to `/accounts/{id}` routes only.
pub async fn require_self_or_admin(
    State(state): State<AppState>,
    ApiPath(account_id): ApiPath<Uuid>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(&state, req.headers())?;
    if !is_self_or_admin(&identity, account_id) {
        return Err(AppError::forbidden());
    }
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
