use async_trait::async_trait;
use innkeep_catalog::{AvailabilityUpdate, CatalogError, HotelFilter, RoomTypePatch, TypeCount};
use innkeep_shared::{Account, Hotel, RoomType};
use uuid::Uuid;

/// Failures surfaced by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Invalid(#[from] CatalogError),

    #[error("Storage failure: {0}")]
    Backend(String),
}

impl RepoError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        RepoError::NotFound { entity, id }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository trait for account data access
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    async fn create_account(&self, account: &Account) -> RepoResult<()>;

    async fn get_account(&self, id: Uuid) -> RepoResult<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Account>>;

    async fn list_accounts(&self) -> RepoResult<Vec<Account>>;

    /// Replaces the stored record. Username and email uniqueness is checked
    /// again, against every other account.
    async fn update_account(&self, account: &Account) -> RepoResult<()>;

    async fn delete_account(&self, id: Uuid) -> RepoResult<()>;
}

/// Repository trait for hotel catalog access
#[async_trait]
pub trait HotelRepository: Send + Sync {
    async fn create_hotel(&self, hotel: &Hotel) -> RepoResult<()>;

    async fn get_hotel(&self, id: Uuid) -> RepoResult<Option<Hotel>>;

    /// Matching hotels in creation order.
    async fn list_hotels(&self, filter: &HotelFilter) -> RepoResult<Vec<Hotel>>;

    /// Writes every field except `room_type_ids`, which only the room-type
    /// operations touch.
    async fn update_hotel(&self, hotel: &Hotel) -> RepoResult<()>;

    /// Removes the hotel together with the room types it references.
    async fn delete_hotel(&self, id: Uuid) -> RepoResult<()>;

    async fn count_by_city(&self, cities: &[String]) -> RepoResult<Vec<u64>>;

    async fn count_by_type(&self) -> RepoResult<Vec<TypeCount>>;
}

/// Repository trait for room types and their per-room calendars.
///
/// Operations that touch a hotel's reference list are atomic.
#[async_trait]
pub trait RoomTypeRepository: Send + Sync {
    /// Inserts the room type and appends its id to the hotel's list.
    async fn create_room_type(&self, hotel_id: Uuid, room_type: &RoomType) -> RepoResult<()>;

    async fn get_room_type(&self, id: Uuid) -> RepoResult<Option<RoomType>>;

    /// Room types for `ids`, in the same order. Ids with no record are skipped.
    async fn get_room_types(&self, ids: &[Uuid]) -> RepoResult<Vec<RoomType>>;

    async fn list_room_types(&self) -> RepoResult<Vec<RoomType>>;

    /// Applies `patch` under the record's lock, so bookings made meanwhile are
    /// not overwritten, and returns the updated room type.
    async fn update_room_type(&self, id: Uuid, patch: RoomTypePatch) -> RepoResult<RoomType>;

    /// Deletes the room type and prunes its id from every hotel that lists it.
    /// Fails with `NotFound` unless `hotel_id` lists the room type.
    async fn delete_room_type(&self, id: Uuid, hotel_id: Uuid) -> RepoResult<()>;

    /// Applies an availability update under the record's lock and returns the
    /// updated room type.
    async fn mark_unavailable(&self, id: Uuid, update: &AvailabilityUpdate) -> RepoResult<RoomType>;
}
