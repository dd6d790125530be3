use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Accommodation category of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotelType {
    Hotel,
    Apartment,
    Resort,
    Villa,
    Cabin,
}

impl HotelType {
    /// Every category, in the order type counts are reported.
    pub const ALL: [HotelType; 5] = [
        HotelType::Hotel,
        HotelType::Apartment,
        HotelType::Resort,
        HotelType::Villa,
        HotelType::Cabin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HotelType::Hotel => "hotel",
            HotelType::Apartment => "apartment",
            HotelType::Resort => "resort",
            HotelType::Villa => "villa",
            HotelType::Cabin => "cabin",
        }
    }

    /// Label used by the per-type counter ("hotel", "apartments", ...).
    pub fn label(&self) -> &'static str {
        match self {
            HotelType::Hotel => "hotel",
            HotelType::Apartment => "apartments",
            HotelType::Resort => "resorts",
            HotelType::Villa => "villas",
            HotelType::Cabin => "cabins",
        }
    }
}

impl fmt::Display for HotelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownHotelType(pub String);

impl fmt::Display for UnknownHotelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown hotel type '{}'", self.0)
    }
}

impl std::error::Error for UnknownHotelType {}

impl FromStr for HotelType {
    type Err = UnknownHotelType;

    /// Accepts singular or plural names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        HotelType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized || t.label() == normalized)
            .ok_or_else(|| UnknownHotelType(s.to_string()))
    }
}

/// A catalog entry. `room_type_ids` keeps the order room types were added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub hotel_type: HotelType,
    pub city: String,
    pub address: String,
    pub distance: String,
    pub photos: Vec<String>,
    pub title: String,
    pub description: String,
    pub rating: f64,
    pub cheapest_price: i64,
    pub featured: bool,
    pub room_type_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotel_type_parsing() {
        assert_eq!("hotel".parse::<HotelType>().unwrap(), HotelType::Hotel);
        assert_eq!("Villas".parse::<HotelType>().unwrap(), HotelType::Villa);
        assert_eq!(" cabin ".parse::<HotelType>().unwrap(), HotelType::Cabin);
        assert!("castle".parse::<HotelType>().is_err());
    }

    #[test]
    fn test_hotel_type_serializes_as_type_field() {
        let json = serde_json::to_value(HotelType::Resort).unwrap();
        assert_eq!(json, "resort");
        let parsed: HotelType = serde_json::from_str("\"apartment\"").unwrap();
        assert_eq!(parsed, HotelType::Apartment);
    }
}
