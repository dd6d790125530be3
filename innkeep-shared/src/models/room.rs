use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One physical room with its own booking calendar.
///
/// `unavailable_dates` is an ordered set, so booking the same night twice
/// leaves a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomNumber {
    pub number: u32,
    #[serde(default)]
    pub unavailable_dates: BTreeSet<DateTime<Utc>>,
}

impl RoomNumber {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            unavailable_dates: BTreeSet::new(),
        }
    }

    pub fn is_available_on(&self, date: &DateTime<Utc>) -> bool {
        !self.unavailable_dates.contains(date)
    }
}

/// A bookable room category inside a hotel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomType {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub max_people: u32,
    pub room_numbers: Vec<RoomNumber>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomType {
    pub fn room(&self, number: u32) -> Option<&RoomNumber> {
        self.room_numbers.iter().find(|r| r.number == number)
    }
}
