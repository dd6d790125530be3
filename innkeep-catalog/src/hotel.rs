use chrono::{DateTime, Utc};
use innkeep_shared::{Hotel, HotelType};
use serde::Deserialize;
use uuid::Uuid;

use crate::{require_text, CatalogError, CatalogResult};

/// Payload for creating a catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewHotel {
    pub name: String,
    #[serde(rename = "type")]
    pub hotel_type: HotelType,
    pub city: String,
    pub address: String,
    pub distance: String,
    #[serde(default)]
    pub photos: Vec<String>,
    pub title: String,
    #[serde(alias = "desc")]
    pub description: String,
    #[serde(default)]
    pub rating: f64,
    pub cheapest_price: i64,
    #[serde(default)]
    pub featured: bool,
}

impl NewHotel {
    pub fn validate(&self) -> CatalogResult<()> {
        require_text("name", &self.name)?;
        require_text("city", &self.city)?;
        require_text("address", &self.address)?;
        require_text("distance", &self.distance)?;
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        validate_rating(self.rating)?;
        validate_price(self.cheapest_price)?;
        Ok(())
    }

    /// Validates the payload and builds a record with an empty room-type list.
    pub fn into_hotel(self, now: DateTime<Utc>) -> CatalogResult<Hotel> {
        self.validate()?;

        Ok(Hotel {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            hotel_type: self.hotel_type,
            city: self.city.trim().to_string(),
            address: self.address.trim().to_string(),
            distance: self.distance.trim().to_string(),
            photos: clean_photos(self.photos),
            title: self.title.trim().to_string(),
            description: self.description,
            rating: self.rating,
            cheapest_price: self.cheapest_price,
            featured: self.featured,
            room_type_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Per-field update for a catalog entry. The room-type reference list is
/// owned by the room-type operations and cannot be patched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HotelPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub hotel_type: Option<HotelType>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub distance: Option<String>,
    pub photos: Option<Vec<String>>,
    pub title: Option<String>,
    #[serde(alias = "desc")]
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub cheapest_price: Option<i64>,
    pub featured: Option<bool>,
}

impl HotelPatch {
    pub fn validate(&self) -> CatalogResult<()> {
        for (field, value) in [
            ("name", &self.name),
            ("city", &self.city),
            ("address", &self.address),
            ("distance", &self.distance),
            ("title", &self.title),
            ("description", &self.description),
        ] {
            if let Some(v) = value {
                require_text(field, v)?;
            }
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        if let Some(price) = self.cheapest_price {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Validates, then merges the supplied fields into `hotel`.
    pub fn apply(self, hotel: &mut Hotel, now: DateTime<Utc>) -> CatalogResult<()> {
        self.validate()?;

        if let Some(name) = self.name {
            hotel.name = name.trim().to_string();
        }
        if let Some(hotel_type) = self.hotel_type {
            hotel.hotel_type = hotel_type;
        }
        if let Some(city) = self.city {
            hotel.city = city.trim().to_string();
        }
        if let Some(address) = self.address {
            hotel.address = address.trim().to_string();
        }
        if let Some(distance) = self.distance {
            hotel.distance = distance.trim().to_string();
        }
        if let Some(photos) = self.photos {
            hotel.photos = clean_photos(photos);
        }
        if let Some(title) = self.title {
            hotel.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            hotel.description = description;
        }
        if let Some(rating) = self.rating {
            hotel.rating = rating;
        }
        if let Some(price) = self.cheapest_price {
            hotel.cheapest_price = price;
        }
        if let Some(featured) = self.featured {
            hotel.featured = featured;
        }
        hotel.updated_at = now;
        Ok(())
    }
}

/// Query constraints for listing hotels. Price bounds are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HotelFilter {
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub hotel_type: Option<HotelType>,
    pub featured: Option<bool>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub limit: Option<usize>,
}

impl HotelFilter {
    pub fn validate(&self) -> CatalogResult<()> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(CatalogError::Validation(format!(
                    "min price {} is greater than max price {}",
                    min, max
                )));
            }
        }
        if self.limit == Some(0) {
            return Err(CatalogError::Validation("limit must be positive".to_string()));
        }
        Ok(())
    }

    pub fn matches(&self, hotel: &Hotel) -> bool {
        if let Some(city) = &self.city {
            if hotel.city != city.trim() {
                return false;
            }
        }
        if let Some(hotel_type) = self.hotel_type {
            if hotel.hotel_type != hotel_type {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if hotel.featured != featured {
                return false;
            }
        }
        if let Some(min) = self.min {
            if hotel.cheapest_price < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if hotel.cheapest_price > max {
                return false;
            }
        }
        true
    }

    /// Filters `hotels` in iteration order and truncates to `limit`.
    pub fn apply<I>(&self, hotels: I) -> Vec<Hotel>
    where
        I: IntoIterator<Item = Hotel>,
    {
        let matching = hotels.into_iter().filter(|h| self.matches(h));
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}

fn validate_rating(rating: f64) -> CatalogResult<()> {
    if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
        return Err(CatalogError::Validation(format!(
            "rating must be between 0 and 5, got {}",
            rating
        )));
    }
    Ok(())
}

fn validate_price(price: i64) -> CatalogResult<()> {
    if price < 0 {
        return Err(CatalogError::Validation(format!(
            "cheapest_price must not be negative, got {}",
            price
        )));
    }
    Ok(())
}

fn clean_photos(photos: Vec<String>) -> Vec<String> {
    photos
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_hotel(city: &str, price: i64) -> NewHotel {
        NewHotel {
            name: "Hotel District 4".to_string(),
            hotel_type: HotelType::Hotel,
            city: city.to_string(),
            address: "125 Vo Xuan Khoat".to_string(),
            distance: "10".to_string(),
            photos: vec!["".to_string(), "https://img/1.jpg".to_string()],
            title: "Best hotel in district 2".to_string(),
            description: "Lorem ipsum".to_string(),
            rating: 4.5,
            cheapest_price: price,
            featured: false,
        }
    }

    #[test]
    fn test_new_hotel_starts_without_room_types() {
        let hotel = new_hotel("hochiminh", 80).into_hotel(Utc::now()).unwrap();
        assert!(hotel.room_type_ids.is_empty());
        assert_eq!(hotel.photos, vec!["https://img/1.jpg".to_string()]);
        assert_eq!(hotel.created_at, hotel.updated_at);
    }

    #[test]
    fn test_new_hotel_rejects_bad_fields() {
        let mut payload = new_hotel("hochiminh", 80);
        payload.rating = 7.0;
        assert!(matches!(payload.into_hotel(Utc::now()), Err(CatalogError::Validation(_))));

        let mut payload = new_hotel("  ", 80);
        payload.rating = 3.0;
        assert!(payload.validate().is_err());

        assert!(new_hotel("hanoi", -1).validate().is_err());
    }

    #[test]
    fn test_new_hotel_accepts_desc_alias() {
        let payload: NewHotel = serde_json::from_value(serde_json::json!({
            "name": "Hotel District 4",
            "type": "resort",
            "city": "danang",
            "address": "1 Beach Road",
            "distance": "500",
            "title": "By the sea",
            "desc": "Quiet place",
            "rating": 4.0,
            "cheapest_price": 120
        }))
        .unwrap();
        assert_eq!(payload.description, "Quiet place");
        assert_eq!(payload.hotel_type, HotelType::Resort);
        assert!(!payload.featured);
    }

    #[test]
    fn test_patch_merges_only_supplied_fields() {
        let mut hotel = new_hotel("hochiminh", 80).into_hotel(Utc::now()).unwrap();
        let original_name = hotel.name.clone();

        let patch = HotelPatch {
            cheapest_price: Some(95),
            featured: Some(true),
            ..Default::default()
        };
        patch.apply(&mut hotel, Utc::now()).unwrap();

        assert_eq!(hotel.cheapest_price, 95);
        assert!(hotel.featured);
        assert_eq!(hotel.name, original_name);
    }

    #[test]
    fn test_patch_rejects_room_list_and_bad_values() {
        let err = serde_json::from_value::<HotelPatch>(serde_json::json!({
            "room_type_ids": []
        }));
        assert!(err.is_err());

        let mut hotel = new_hotel("hochiminh", 80).into_hotel(Utc::now()).unwrap();
        let patch = HotelPatch {
            name: Some("".to_string()),
            ..Default::default()
        };
        assert!(patch.apply(&mut hotel, Utc::now()).is_err());
        assert_eq!(hotel.name, "Hotel District 4");
    }

    #[test]
    fn test_filter_by_city_and_inclusive_price_range() {
        let now = Utc::now();
        let hotels = vec![
            new_hotel("hanoi", 50).into_hotel(now).unwrap(),
            new_hotel("hanoi", 100).into_hotel(now).unwrap(),
            new_hotel("hanoi", 150).into_hotel(now).unwrap(),
            new_hotel("danang", 100).into_hotel(now).unwrap(),
        ];

        let filter = HotelFilter {
            city: Some("hanoi".to_string()),
            min: Some(50),
            max: Some(100),
            ..Default::default()
        };
        let found = filter.apply(hotels.clone());
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|h| h.city == "hanoi" && h.cheapest_price <= 100));

        let limited = HotelFilter {
            limit: Some(3),
            ..Default::default()
        };
        assert_eq!(limited.apply(hotels).len(), 3);
    }

    #[test]
    fn test_filter_validation() {
        let inverted = HotelFilter {
            min: Some(200),
            max: Some(100),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let zero_limit = HotelFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert!(zero_limit.validate().is_err());
        assert!(HotelFilter::default().validate().is_ok());
    }
}
