pub mod hotel;
pub mod room;
pub mod counts;

pub use hotel::{HotelFilter, HotelPatch, NewHotel};
pub use room::{mark_unavailable, AvailabilityUpdate, NewRoomType, RoomTypePatch};
pub use counts::{count_by_city, count_by_type, parse_city_list, TypeCount};

/// Errors raised while validating or applying catalog changes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Room number {0} does not exist in this room type")]
    UnknownRoomNumber(u32),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

pub(crate) fn require_text(field: &str, value: &str) -> CatalogResult<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
