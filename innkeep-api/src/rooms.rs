use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use chrono::Utc;
use innkeep_catalog::{AvailabilityUpdate, NewRoomType, RoomTypePatch};
use innkeep_shared::RoomType;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{require_admin, require_auth, Identity};
use crate::state::AppState;
use crate::MessageResponse;

pub fn routes(state: AppState) -> Router<AppState> {
    // POST takes the hotel id in the same position GET and PUT take the
    // room-type id, so the segment shares one name.
    let admin = Router::new()
        .route("/room-types", get(list_room_types))
        .route(
            "/room-types/{id}",
            get(get_room_type).post(create_room_type).put(update_room_type),
        )
        .route("/room-types/{id}/{hotel_id}", delete(delete_room_type))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let authenticated = Router::new()
        .route("/room-types/availability/{id}", put(update_availability))
        .route_layer(from_fn_with_state(state, require_auth));

    admin.merge(authenticated)
}

async fn load(state: &AppState, id: Uuid) -> Result<RoomType, AppError> {
    state
        .room_types
        .get_room_type(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found!".to_string()))
}

async fn create_room_type(
    State(state): State<AppState>,
    ApiPath(hotel_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<NewRoomType>,
) -> Result<Json<RoomType>, AppError> {
    let room_type = payload.into_room_type(Utc::now())?;
    state.room_types.create_room_type(hotel_id, &room_type).await?;

    tracing::info!(room_type_id = %room_type.id, hotel_id = %hotel_id, "Room type created");
    Ok(Json(room_type))
}

async fn update_room_type(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<RoomTypePatch>,
) -> Result<Json<RoomType>, AppError> {
    let room_type = state.room_types.update_room_type(id, patch).await?;

    tracing::info!(room_type_id = %id, "Room type updated");
    Ok(Json(room_type))
}

async fn delete_room_type(
    State(state): State<AppState>,
    ApiPath((id, hotel_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, AppError> {
    state.room_types.delete_room_type(id, hotel_id).await?;

    tracing::info!(room_type_id = %id, hotel_id = %hotel_id, "Room type deleted");
    Ok(Json(MessageResponse::new("Room has been deleted.")))
}

async fn get_room_type(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<RoomType>, AppError> {
    Ok(Json(load(&state, id).await?))
}

async fn list_room_types(State(state): State<AppState>) -> Result<Json<Vec<RoomType>>, AppError> {
    Ok(Json(state.room_types.list_room_types().await?))
}

async fn update_availability(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<AvailabilityUpdate>,
) -> Result<Json<MessageResponse>, AppError> {
    state.room_types.mark_unavailable(id, &update).await?;

    tracing::info!(room_type_id = %id, booked_by = %identity.account_id, "Availability updated");
    Ok(Json(MessageResponse::new("Room status has been updated.")))
}
