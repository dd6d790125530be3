use async_trait::async_trait;
use chrono::{DateTime, Utc};
use innkeep_catalog::{mark_unavailable, AvailabilityUpdate, RoomTypePatch};
use innkeep_core::{RepoError, RepoResult, RoomTypeRepository};
use innkeep_shared::{RoomNumber, RoomType};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::map_sqlx_error;

pub struct StoreRoomTypeRepository {
    pool: PgPool,
}

impl StoreRoomTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ROOM_TYPE_COLUMNS: &str =
    "id, title, description, price, max_people, room_numbers, created_at, updated_at";

// Room numbers live in a JSONB document, one element per physical room.
#[derive(sqlx::FromRow)]
struct RoomTypeRow {
    id: Uuid,
    title: String,
    description: String,
    price: i64,
    max_people: i32,
    room_numbers: Json<Vec<RoomNumber>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoomTypeRow> for RoomType {
    type Error = RepoError;

    fn try_from(row: RoomTypeRow) -> Result<Self, Self::Error> {
        let max_people = u32::try_from(row.max_people).map_err(|_| {
            RepoError::Backend(format!("room type {}: negative max_people", row.id))
        })?;

        Ok(RoomType {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            max_people,
            room_numbers: row.room_numbers.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn occupancy(room_type: &RoomType) -> RepoResult<i32> {
    i32::try_from(room_type.max_people)
        .map_err(|_| RepoError::Backend(format!("max_people {} out of range", room_type.max_people)))
}

/// Locks the hotel row for the rest of the transaction and returns the room
/// type ids it lists.
async fn lock_hotel(tx: &mut Transaction<'_, Postgres>, hotel_id: Uuid) -> RepoResult<Vec<Uuid>> {
    let found: Option<Vec<Uuid>> =
        sqlx::query_scalar("SELECT room_type_ids FROM hotels WHERE id = $1 FOR UPDATE")
            .bind(hotel_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(map_sqlx_error)?;

    found.ok_or_else(|| RepoError::not_found("hotel", hotel_id))
}

#[async_trait]
impl RoomTypeRepository for StoreRoomTypeRepository {
    async fn create_room_type(&self, hotel_id: Uuid, room_type: &RoomType) -> RepoResult<()> {
        let max_people = occupancy(room_type)?;
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        lock_hotel(&mut tx, hotel_id).await?;

        sqlx::query(
            r#"
            INSERT INTO room_types (id, title, description, price, max_people, room_numbers, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(room_type.id)
        .bind(&room_type.title)
        .bind(&room_type.description)
        .bind(room_type.price)
        .bind(max_people)
        .bind(Json(&room_type.room_numbers))
        .bind(room_type.created_at)
        .bind(room_type.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(
            "UPDATE hotels SET room_type_ids = array_append(room_type_ids, $1), updated_at = NOW() WHERE id = $2",
        )
        .bind(room_type.id)
        .bind(hotel_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_room_type(&self, id: Uuid) -> RepoResult<Option<RoomType>> {
        let row = sqlx::query_as::<_, RoomTypeRow>(&format!(
            "SELECT {} FROM room_types WHERE id = $1",
            ROOM_TYPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(RoomType::try_from).transpose()
    }

    async fn get_room_types(&self, ids: &[Uuid]) -> RepoResult<Vec<RoomType>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RoomTypeRow>(&format!(
            "SELECT {} FROM room_types WHERE id = ANY($1)",
            ROOM_TYPE_COLUMNS
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut by_id: HashMap<Uuid, RoomType> = HashMap::with_capacity(rows.len());
        for row in rows {
            let room_type = RoomType::try_from(row)?;
            by_id.insert(room_type.id, room_type);
        }

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    async fn list_room_types(&self) -> RepoResult<Vec<RoomType>> {
        let rows = sqlx::query_as::<_, RoomTypeRow>(&format!(
            "SELECT {} FROM room_types ORDER BY created_at, id",
            ROOM_TYPE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(RoomType::try_from).collect()
    }

    async fn update_room_type(&self, id: Uuid, patch: RoomTypePatch) -> RepoResult<RoomType> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, RoomTypeRow>(&format!(
            "SELECT {} FROM room_types WHERE id = $1 FOR UPDATE",
            ROOM_TYPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let mut room_type = match row {
            Some(row) => RoomType::try_from(row)?,
            None => return Err(RepoError::not_found("room type", id)),
        };

        patch.apply(&mut room_type, Utc::now())?;
        let max_people = occupancy(&room_type)?;

        sqlx::query(
            r#"
            UPDATE room_types
            SET title = $1, description = $2, price = $3, max_people = $4, room_numbers = $5, updated_at = $6
            WHERE id = $7
            "#,
        )
        .bind(&room_type.title)
        .bind(&room_type.description)
        .bind(room_type.price)
        .bind(max_people)
        .bind(Json(&room_type.room_numbers))
        .bind(room_type.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(room_type)
    }

    async fn delete_room_type(&self, id: Uuid, hotel_id: Uuid) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let listed = lock_hotel(&mut tx, hotel_id).await?;
        if !listed.contains(&id) {
            return Err(RepoError::not_found("room type", id));
        }

        let deleted = sqlx::query("DELETE FROM room_types WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if deleted.rows_affected() == 0 {
            return Err(RepoError::not_found("room type", id));
        }

        sqlx::query(
            "UPDATE hotels SET room_type_ids = array_remove(room_type_ids, $1), updated_at = NOW() WHERE $1 = ANY(room_type_ids)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn mark_unavailable(&self, id: Uuid, update: &AvailabilityUpdate) -> RepoResult<RoomType> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, RoomTypeRow>(&format!(
            "SELECT {} FROM room_types WHERE id = $1 FOR UPDATE",
            ROOM_TYPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let mut room_type = match row {
            Some(row) => RoomType::try_from(row)?,
            None => return Err(RepoError::not_found("room type", id)),
        };

        let added = mark_unavailable(&mut room_type, update, Utc::now())?;
        if added > 0 {
            sqlx::query("UPDATE room_types SET room_numbers = $1, updated_at = $2 WHERE id = $3")
                .bind(Json(&room_type.room_numbers))
                .bind(room_type.updated_at)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        tracing::debug!(room_type_id = %id, added, "Availability updated");
        Ok(room_type)
    }
}
