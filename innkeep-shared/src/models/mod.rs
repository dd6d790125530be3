pub mod account;
pub mod hotel;
pub mod room;

pub use account::Account;
pub use hotel::{Hotel, HotelType, UnknownHotelType};
pub use room::{RoomNumber, RoomType};
