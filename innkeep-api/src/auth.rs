use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, TimeDelta, Utc};
use innkeep_core::credentials::verify_password;
use innkeep_core::{LoginCredentials, NewAccount};
use innkeep_shared::Account;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::auth::{Claims, ACCESS_TOKEN_COOKIE};
use crate::state::{AppState, AuthConfig};
use crate::MessageResponse;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub details: Account,
    pub is_admin: bool,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Signs a session token for `account`.
pub fn issue_token(
    auth: &AuthConfig,
    account: &Account,
    now: DateTime<Utc>,
) -> Result<(String, DateTime<Utc>), AppError> {
    let expires_at = i64::try_from(auth.expiration)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| AppError::Internal("token lifetime out of range".to_string()))?;

    let claims = Claims {
        sub: account.id.to_string(),
        is_admin: account.is_admin,
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.expose().as_bytes()),
    )?;

    Ok((token, expires_at))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewAccount>,
) -> Result<Json<MessageResponse>, AppError> {
    // Hashing is CPU bound; keep it off the async workers.
    let now = Utc::now();
    let account = tokio::task::spawn_blocking(move || payload.into_account(now)).await??;
    state.accounts.create_account(&account).await?;

    tracing::info!(account_id = %account.id, username = %account.username, "Account registered");
    Ok(Json(MessageResponse::new("User has been created.")))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(credentials): ApiJson<LoginCredentials>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    credentials.validate()?;

    let account = state
        .accounts
        .find_by_username(credentials.username())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found!".to_string()))?;

    let attempt = credentials.password;
    let stored = account.password_hash.clone();
    let matches =
        tokio::task::spawn_blocking(move || verify_password(attempt.expose(), stored.expose())).await??;
    if !matches {
        tracing::info!(account_id = %account.id, "Login rejected: wrong password");
        return Err(AppError::Authentication("Wrong password or username!".to_string()));
    }

    let (token, expires_at) = issue_token(&state.auth, &account, Utc::now())?;

    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, token.clone()))
        .http_only(true)
        .secure(state.auth.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build();

    tracing::info!(account_id = %account.id, "Login succeeded");
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            is_admin: account.is_admin,
            details: account,
            token,
            expires_at,
        }),
    ))
}
