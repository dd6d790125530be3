use std::sync::Arc;

use innkeep_core::{AccountRepository, HotelRepository, RoomTypeRepository};
use innkeep_shared::Masked;
use innkeep_store::{app_config, Repositories};

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub secret: Masked<String>,
    pub expiration: u64,
    pub cookie_secure: bool,
}

impl From<&app_config::AuthConfig> for AuthConfig {
    fn from(config: &app_config::AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.jwt_expiration_seconds,
            cookie_secure: config.cookie_secure,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub hotels: Arc<dyn HotelRepository>,
    pub room_types: Arc<dyn RoomTypeRepository>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(repos: Repositories, auth: AuthConfig) -> Self {
        Self {
            accounts: repos.accounts,
            hotels: repos.hotels,
            room_types: repos.room_types,
            auth,
        }
    }
}
