use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use innkeep_catalog::{parse_city_list, HotelFilter, HotelPatch, NewHotel, TypeCount};
use innkeep_shared::{Hotel, RoomType};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::require_admin;
use crate::state::AppState;
use crate::MessageResponse;

#[derive(Debug, Deserialize)]
pub struct CityCountQuery {
    #[serde(default)]
    pub cities: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/catalog", get(list_hotels))
        .route("/catalog/countByCity", get(count_by_city))
        .route("/catalog/countByType", get(count_by_type))
        .route("/catalog/{id}", get(get_hotel))
        .route("/catalog/{id}/rooms", get(get_hotel_rooms));

    let admin = Router::new()
        .route("/catalog", post(create_hotel))
        .route("/catalog/{id}", put(update_hotel).delete(delete_hotel))
        .route_layer(from_fn_with_state(state, require_admin));

    public.merge(admin)
}

async fn load(state: &AppState, id: Uuid) -> Result<Hotel, AppError> {
    state
        .hotels
        .get_hotel(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Hotel not found!".to_string()))
}

async fn create_hotel(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewHotel>,
) -> Result<Json<Hotel>, AppError> {
    let hotel = payload.into_hotel(Utc::now())?;
    state.hotels.create_hotel(&hotel).await?;

    tracing::info!(hotel_id = %hotel.id, city = %hotel.city, "Hotel created");
    Ok(Json(hotel))
}

async fn update_hotel(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<HotelPatch>,
) -> Result<Json<Hotel>, AppError> {
    let mut hotel = load(&state, id).await?;
    patch.apply(&mut hotel, Utc::now())?;
    state.hotels.update_hotel(&hotel).await?;

    // The stored reference list may have moved on since `load`.
    Ok(Json(load(&state, id).await?))
}

async fn delete_hotel(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.hotels.delete_hotel(id).await?;

    tracing::info!(hotel_id = %id, "Hotel deleted");
    Ok(Json(MessageResponse::new("Hotel has been deleted.")))
}

async fn get_hotel(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Hotel>, AppError> {
    Ok(Json(load(&state, id).await?))
}

async fn list_hotels(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<HotelFilter>,
) -> Result<Json<Vec<Hotel>>, AppError> {
    filter.validate()?;
    Ok(Json(state.hotels.list_hotels(&filter).await?))
}

async fn count_by_city(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CityCountQuery>,
) -> Result<Json<Vec<u64>>, AppError> {
    let cities = parse_city_list(&query.cities);
    Ok(Json(state.hotels.count_by_city(&cities).await?))
}

async fn count_by_type(State(state): State<AppState>) -> Result<Json<Vec<TypeCount>>, AppError> {
    Ok(Json(state.hotels.count_by_type().await?))
}

async fn get_hotel_rooms(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<RoomType>>, AppError> {
    let hotel = load(&state, id).await?;
    Ok(Json(state.room_types.get_room_types(&hotel.room_type_ids).await?))
}
