pub mod models;
pub mod pii;

pub use models::{Account, Hotel, HotelType, RoomNumber, RoomType, UnknownHotelType};
pub use pii::Masked;
