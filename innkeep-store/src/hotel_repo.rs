use async_trait::async_trait;
use chrono::{DateTime, Utc};
use innkeep_catalog::counts::{order_city_counts, zero_filled_type_counts};
use innkeep_catalog::{HotelFilter, TypeCount};
use innkeep_core::{HotelRepository, RepoError, RepoResult};
use innkeep_shared::{Hotel, HotelType};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::map_sqlx_error;

pub struct StoreHotelRepository {
    pool: PgPool,
}

impl StoreHotelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const HOTEL_COLUMNS: &str = "id, name, hotel_type, city, address, distance, photos, title, description, \
     rating, cheapest_price, featured, room_type_ids, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct HotelRow {
    id: Uuid,
    name: String,
    hotel_type: String,
    city: String,
    address: String,
    distance: String,
    photos: Vec<String>,
    title: String,
    description: String,
    rating: f64,
    cheapest_price: i64,
    featured: bool,
    room_type_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HotelRow> for Hotel {
    type Error = RepoError;

    fn try_from(row: HotelRow) -> Result<Self, Self::Error> {
        let hotel_type = row
            .hotel_type
            .parse::<HotelType>()
            .map_err(|e| RepoError::Backend(format!("hotel {}: {}", row.id, e)))?;

        Ok(Hotel {
            id: row.id,
            name: row.name,
            hotel_type,
            city: row.city,
            address: row.address,
            distance: row.distance,
            photos: row.photos,
            title: row.title,
            description: row.description,
            rating: row.rating,
            cheapest_price: row.cheapest_price,
            featured: row.featured,
            room_type_ids: row.room_type_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_hotels(rows: Vec<HotelRow>) -> RepoResult<Vec<Hotel>> {
    rows.into_iter().map(Hotel::try_from).collect()
}

#[async_trait]
impl HotelRepository for StoreHotelRepository {
    async fn create_hotel(&self, hotel: &Hotel) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hotels (id, name, hotel_type, city, address, distance, photos, title, description,
                                rating, cheapest_price, featured, room_type_ids, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(hotel.id)
        .bind(&hotel.name)
        .bind(hotel.hotel_type.as_str())
        .bind(&hotel.city)
        .bind(&hotel.address)
        .bind(&hotel.distance)
        .bind(&hotel.photos)
        .bind(&hotel.title)
        .bind(&hotel.description)
        .bind(hotel.rating)
        .bind(hotel.cheapest_price)
        .bind(hotel.featured)
        .bind(&hotel.room_type_ids)
        .bind(hotel.created_at)
        .bind(hotel.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_hotel(&self, id: Uuid) -> RepoResult<Option<Hotel>> {
        let row = sqlx::query_as::<_, HotelRow>(&format!(
            "SELECT {} FROM hotels WHERE id = $1",
            HOTEL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(Hotel::try_from).transpose()
    }

    async fn list_hotels(&self, filter: &HotelFilter) -> RepoResult<Vec<Hotel>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM hotels WHERE TRUE", HOTEL_COLUMNS));

        if let Some(city) = &filter.city {
            qb.push(" AND city = ").push_bind(city.trim().to_string());
        }
        if let Some(hotel_type) = filter.hotel_type {
            qb.push(" AND hotel_type = ").push_bind(hotel_type.as_str());
        }
        if let Some(featured) = filter.featured {
            qb.push(" AND featured = ").push_bind(featured);
        }
        if let Some(min) = filter.min {
            qb.push(" AND cheapest_price >= ").push_bind(min);
        }
        if let Some(max) = filter.max {
            qb.push(" AND cheapest_price <= ").push_bind(max);
        }
        qb.push(" ORDER BY created_at, id");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = qb
            .build_query_as::<HotelRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        into_hotels(rows)
    }

    async fn update_hotel(&self, hotel: &Hotel) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE hotels
            SET name = $1, hotel_type = $2, city = $3, address = $4, distance = $5, photos = $6,
                title = $7, description = $8, rating = $9, cheapest_price = $10, featured = $11,
                updated_at = $12
            WHERE id = $13
            "#,
        )
        .bind(&hotel.name)
        .bind(hotel.hotel_type.as_str())
        .bind(&hotel.city)
        .bind(&hotel.address)
        .bind(&hotel.distance)
        .bind(&hotel.photos)
        .bind(&hotel.title)
        .bind(&hotel.description)
        .bind(hotel.rating)
        .bind(hotel.cheapest_price)
        .bind(hotel.featured)
        .bind(hotel.updated_at)
        .bind(hotel.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("hotel", hotel.id));
        }
        Ok(())
    }

    async fn delete_hotel(&self, id: Uuid) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let room_type_ids: Option<Vec<Uuid>> =
            sqlx::query_scalar("DELETE FROM hotels WHERE id = $1 RETURNING room_type_ids")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

        let Some(room_type_ids) = room_type_ids else {
            return Err(RepoError::not_found("hotel", id));
        };

        if !room_type_ids.is_empty() {
            let removed = sqlx::query("DELETE FROM room_types WHERE id = ANY($1)")
                .bind(&room_type_ids)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            tracing::debug!(hotel_id = %id, removed = removed.rows_affected(), "Cascaded room type delete");
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn count_by_city(&self, cities: &[String]) -> RepoResult<Vec<u64>> {
        if cities.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT city, COUNT(*) FROM hotels WHERE city = ANY($1) GROUP BY city",
        )
        .bind(cities.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let tally: HashMap<String, u64> = rows
            .into_iter()
            .map(|(city, count)| (city, count.max(0) as u64))
            .collect();

        Ok(order_city_counts(&tally, cities))
    }

    async fn count_by_type(&self) -> RepoResult<Vec<TypeCount>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT hotel_type, COUNT(*) FROM hotels GROUP BY hotel_type")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let mut tally: HashMap<HotelType, u64> = HashMap::new();
        for (raw, count) in rows {
            match raw.parse::<HotelType>() {
                Ok(hotel_type) => *tally.entry(hotel_type).or_default() += count.max(0) as u64,
                Err(e) => tracing::warn!(error = %e, "Skipping unknown hotel type in counts"),
            }
        }

        Ok(zero_filled_type_counts(&tally))
    }
}
