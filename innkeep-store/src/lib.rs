pub mod app_config;
pub mod database;
pub mod account_repo;
pub mod hotel_repo;
pub mod room_repo;
pub mod memory;

use std::sync::Arc;

use innkeep_core::{AccountRepository, HotelRepository, RepoError, RoomTypeRepository};
use sqlx::PgPool;

pub use account_repo::StoreAccountRepository;
pub use database::DbClient;
pub use hotel_repo::StoreHotelRepository;
pub use memory::MemoryStore;
pub use room_repo::StoreRoomTypeRepository;

/// The three repositories handed to the API layer.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub hotels: Arc<dyn HotelRepository>,
    pub room_types: Arc<dyn RoomTypeRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            accounts: Arc::new(StoreAccountRepository::new(pool.clone())),
            hotels: Arc::new(StoreHotelRepository::new(pool.clone())),
            room_types: Arc::new(StoreRoomTypeRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            accounts: store.clone(),
            hotels: store.clone(),
            room_types: store,
        }
    }
}

/// Maps driver errors onto the repository taxonomy. Unique violations become
/// conflicts named after the offending column; everything else is logged here
/// and surfaced as a backend failure.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some("accounts_username_key") => "username already exists",
                Some("accounts_email_key") => "email already exists",
                _ => "record already exists",
            };
            return RepoError::Conflict(message.to_string());
        }
    }

    tracing::error!(error = %err, "database error");
    RepoError::Backend(err.to_string())
}
