use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use innkeep_core::AccountPatch;
use innkeep_shared::Account;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{require_admin, require_self_or_admin, Identity};
use crate::state::AppState;
use crate::MessageResponse;

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/accounts", get(list_accounts))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let owner = Router::new()
        .route(
            "/accounts/{id}",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route_layer(from_fn_with_state(state, require_self_or_admin));

    admin.merge(owner)
}

async fn load(state: &AppState, id: Uuid) -> Result<Account, AppError> {
    state
        .accounts
        .get_account(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found!".to_string()))
}

async fn get_account(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Account>, AppError> {
    Ok(Json(load(&state, id).await?))
}

async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, AppError> {
    Ok(Json(state.accounts.list_accounts().await?))
}

async fn update_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<AccountPatch>,
) -> Result<Json<Account>, AppError> {
    let mut account = load(&state, id).await?;
    let caller_is_admin = identity.is_admin;
    let now = Utc::now();
    // A password change rehashes, which must not stall the async workers.
    let account = tokio::task::spawn_blocking(move || {
        patch.apply(&mut account, caller_is_admin, now).map(|()| account)
    })
    .await??;
    state.accounts.update_account(&account).await?;

    tracing::info!(account_id = %id, updated_by = %identity.account_id, "Account updated");
    Ok(Json(account))
}

async fn delete_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.delete_account(id).await?;

    tracing::info!(account_id = %id, deleted_by = %identity.account_id, "Account deleted");
    Ok(Json(MessageResponse::new("User has been deleted.")))
}
