use innkeep_shared::{Hotel, HotelType};
use serde::Serialize;
use std::collections::HashMap;

/// One row of the per-type counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub label: String,
    pub count: u64,
}

/// Splits a `cities=a,b,c` query value. Positions are kept, so the result
/// stays parallel to what the caller sent.
pub fn parse_city_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|c| c.trim().to_string()).collect()
}

/// Counts hotels per requested city, in request order. Duplicated cities are
/// counted again and unknown ones yield 0.
pub fn count_by_city(hotels: &[Hotel], cities: &[String]) -> Vec<u64> {
    let mut tally: HashMap<&str, u64> = HashMap::new();
    for hotel in hotels {
        *tally.entry(hotel.city.as_str()).or_default() += 1;
    }
    order_city_counts(&tally, cities)
}

/// Lays per-city tallies out in the order of `cities`.
pub fn order_city_counts<K>(tally: &HashMap<K, u64>, cities: &[String]) -> Vec<u64>
where
    K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
{
    cities
        .iter()
        .map(|city| tally.get(city.as_str()).copied().unwrap_or(0))
        .collect()
}

pub fn count_by_type(hotels: &[Hotel]) -> Vec<TypeCount> {
    let mut tally: HashMap<HotelType, u64> = HashMap::new();
    for hotel in hotels {
        *tally.entry(hotel.hotel_type).or_default() += 1;
    }
    zero_filled_type_counts(&tally)
}

/// One row per [`HotelType`], in [`HotelType::ALL`] order.
pub fn zero_filled_type_counts(tally: &HashMap<HotelType, u64>) -> Vec<TypeCount> {
    HotelType::ALL
        .iter()
        .map(|t| TypeCount {
            label: t.label().to_string(),
            count: tally.get(t).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn hotel(city: &str, hotel_type: HotelType) -> Hotel {
        let now = Utc::now();
        Hotel {
            id: Uuid::new_v4(),
            name: format!("{} stay", city),
            hotel_type,
            city: city.to_string(),
            address: "1 Main Street".to_string(),
            distance: "100".to_string(),
            photos: vec![],
            title: "Nice".to_string(),
            description: "Nice place".to_string(),
            rating: 4.0,
            cheapest_price: 100,
            featured: false,
            room_type_ids: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_count_by_city_preserves_request_order() {
        let hotels = vec![
            hotel("hochiminh", HotelType::Hotel),
            hotel("hanoi", HotelType::Hotel),
            hotel("hochiminh", HotelType::Villa),
            hotel("hochiminh", HotelType::Resort),
        ];
        let cities = parse_city_list("hanoi,danang,hochiminh");

        assert_eq!(count_by_city(&hotels, &cities), vec![1, 0, 3]);
    }

    #[test]
    fn test_count_by_city_with_duplicates_and_unknowns() {
        let hotels = vec![hotel("hanoi", HotelType::Hotel)];
        let cities = parse_city_list("hanoi, atlantis ,hanoi");

        assert_eq!(cities, vec!["hanoi", "atlantis", "hanoi"]);
        assert_eq!(count_by_city(&hotels, &cities), vec![1, 0, 1]);
        assert!(parse_city_list("").is_empty());
    }

    #[test]
    fn test_count_by_type_is_zero_filled() {
        let hotels = vec![
            hotel("hanoi", HotelType::Hotel),
            hotel("hanoi", HotelType::Cabin),
            hotel("hue", HotelType::Cabin),
        ];

        let counts = count_by_type(&hotels);
        let labels: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["hotel", "apartments", "resorts", "villas", "cabins"]);
        let values: Vec<u64> = counts.iter().map(|c| c.count).collect();
        assert_eq!(values, vec![1, 0, 0, 0, 2]);
    }

    #[test]
    fn test_type_count_json_shape() {
        let json = serde_json::to_value(TypeCount {
            label: "villas".to_string(),
            count: 2,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "villas", "count": 2}));
    }
}
