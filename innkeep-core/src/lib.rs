pub mod account;
pub mod credentials;
pub mod repository;

pub use account::{AccountPatch, LoginCredentials, NewAccount};
pub use repository::{
    AccountRepository, HotelRepository, RepoError, RepoResult, RoomTypeRepository,
};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Identity verification failed: {0}")]
    IdentityError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
