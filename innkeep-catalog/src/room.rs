use chrono::{DateTime, Utc};
use innkeep_shared::{RoomNumber, RoomType};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

use crate::{require_text, CatalogError, CatalogResult};

/// Payload for creating a room type under a hotel.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRoomType {
    pub title: String,
    #[serde(alias = "desc")]
    pub description: String,
    pub price: i64,
    pub max_people: u32,
    #[serde(default)]
    pub room_numbers: Vec<RoomNumber>,
}

impl NewRoomType {
    pub fn validate(&self) -> CatalogResult<()> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        validate_price(self.price)?;
        validate_occupancy(self.max_people)?;
        validate_room_numbers(&self.room_numbers)?;
        Ok(())
    }

    pub fn into_room_type(self, now: DateTime<Utc>) -> CatalogResult<RoomType> {
        self.validate()?;

        Ok(RoomType {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: self.description,
            price: self.price,
            max_people: self.max_people,
            room_numbers: self.room_numbers,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Per-field update for a room type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomTypePatch {
    pub title: Option<String>,
    #[serde(alias = "desc")]
    pub description: Option<String>,
    pub price: Option<i64>,
    pub max_people: Option<u32>,
    pub room_numbers: Option<Vec<RoomNumber>>,
}

impl RoomTypePatch {
    pub fn validate(&self) -> CatalogResult<()> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(max_people) = self.max_people {
            validate_occupancy(max_people)?;
        }
        if let Some(rooms) = &self.room_numbers {
            validate_room_numbers(rooms)?;
        }
        Ok(())
    }

    /// Validates, then merges into `room_type`. A replaced room list keeps the
    /// booked dates of every number that is still present.
    pub fn apply(self, room_type: &mut RoomType, now: DateTime<Utc>) -> CatalogResult<()> {
        self.validate()?;

        if let Some(title) = self.title {
            room_type.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            room_type.description = description;
        }
        if let Some(price) = self.price {
            room_type.price = price;
        }
        if let Some(max_people) = self.max_people {
            room_type.max_people = max_people;
        }
        if let Some(rooms) = self.room_numbers {
            room_type.room_numbers = rooms
                .into_iter()
                .map(|mut room| {
                    if let Some(existing) = room_type.room(room.number) {
                        room.unavailable_dates
                            .extend(existing.unavailable_dates.iter().copied());
                    }
                    room
                })
                .collect();
        }
        room_type.updated_at = now;
        Ok(())
    }
}

/// A booked date as sent by clients: RFC 3339 text or epoch milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Text(DateTime<Utc>),
    Millis(i64),
}

impl DateInput {
    fn resolve(&self) -> CatalogResult<DateTime<Utc>> {
        match self {
            DateInput::Text(date) => Ok(*date),
            DateInput::Millis(ms) => DateTime::from_timestamp_millis(*ms).ok_or_else(|| {
                CatalogError::Validation(format!("timestamp {} is out of range", ms))
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DateList {
    One(DateInput),
    Many(Vec<DateInput>),
}

/// Body of an availability update.
///
/// Without `numbers` the dates are booked on every room of the type.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityUpdate {
    pub dates: DateList,
    #[serde(default)]
    pub numbers: Option<Vec<u32>>,
}

impl AvailabilityUpdate {
    pub fn new(dates: Vec<DateTime<Utc>>) -> Self {
        Self {
            dates: DateList::Many(dates.into_iter().map(DateInput::Text).collect()),
            numbers: None,
        }
    }

    pub fn for_rooms(mut self, numbers: Vec<u32>) -> Self {
        self.numbers = Some(numbers);
        self
    }

    pub fn resolved_dates(&self) -> CatalogResult<BTreeSet<DateTime<Utc>>> {
        let dates = match &self.dates {
            DateList::One(date) => vec![date.resolve()?],
            DateList::Many(dates) => dates
                .iter()
                .map(DateInput::resolve)
                .collect::<CatalogResult<Vec<_>>>()?,
        };
        if dates.is_empty() {
            return Err(CatalogError::Validation("dates must not be empty".to_string()));
        }
        Ok(dates.into_iter().collect())
    }
}

/// Books `update`'s dates on the targeted rooms of `room_type`.
///
/// Returns how many (room, date) pairs were newly added; dates already
/// present are left as they are. Unknown room numbers fail before anything
/// is changed.
pub fn mark_unavailable(
    room_type: &mut RoomType,
    update: &AvailabilityUpdate,
    now: DateTime<Utc>,
) -> CatalogResult<usize> {
    let dates = update.resolved_dates()?;

    let targets: Option<HashSet<u32>> = match &update.numbers {
        Some(numbers) => {
            for number in numbers {
                if room_type.room(*number).is_none() {
                    return Err(CatalogError::UnknownRoomNumber(*number));
                }
            }
            Some(numbers.iter().copied().collect())
        }
        None => None,
    };

    let mut added = 0;
    for room in room_type.room_numbers.iter_mut() {
        if targets.as_ref().is_some_and(|t| !t.contains(&room.number)) {
            continue;
        }
        for date in &dates {
            if room.unavailable_dates.insert(*date) {
                added += 1;
            }
        }
    }

    if added > 0 {
        room_type.updated_at = now;
    }
    Ok(added)
}

fn validate_price(price: i64) -> CatalogResult<()> {
    if price <= 0 {
        return Err(CatalogError::Validation(format!(
            "price must be positive, got {}",
            price
        )));
    }
    Ok(())
}

fn validate_occupancy(max_people: u32) -> CatalogResult<()> {
    if max_people == 0 {
        return Err(CatalogError::Validation("max_people must be at least 1".to_string()));
    }
    Ok(())
}

fn validate_room_numbers(rooms: &[RoomNumber]) -> CatalogResult<()> {
    let mut seen = HashSet::new();
    for room in rooms {
        if !seen.insert(room.number) {
            return Err(CatalogError::Validation(format!(
                "room number {} is listed twice",
                room.number
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn king_room(numbers: &[u32]) -> RoomType {
        NewRoomType {
            title: "King Room".to_string(),
            description: "King size bed, 1 bathroom, balcony".to_string(),
            price: 200,
            max_people: 2,
            room_numbers: numbers.iter().map(|n| RoomNumber::new(*n)).collect(),
        }
        .into_room_type(Utc::now())
        .unwrap()
    }

    fn night(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, day, 17, 0, 0).unwrap()
    }

    #[test]
    fn test_room_numbers_must_be_unique() {
        let payload = NewRoomType {
            title: "Twin".to_string(),
            description: "Two beds".to_string(),
            price: 90,
            max_people: 2,
            room_numbers: vec![RoomNumber::new(108), RoomNumber::new(108)],
        };
        assert!(matches!(payload.validate(), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn test_availability_applies_to_every_room() {
        let mut room_type = king_room(&[101, 102, 103]);

        let added = mark_unavailable(
            &mut room_type,
            &AvailabilityUpdate::new(vec![night(13)]),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(added, 3);
        assert!(room_type
            .room_numbers
            .iter()
            .all(|r| r.unavailable_dates.contains(&night(13))));
    }

    #[test]
    fn test_repeated_date_is_a_no_op() {
        let mut room_type = king_room(&[101, 102]);
        let update = AvailabilityUpdate::new(vec![night(13), night(14)]);

        assert_eq!(mark_unavailable(&mut room_type, &update, Utc::now()).unwrap(), 4);
        assert_eq!(mark_unavailable(&mut room_type, &update, Utc::now()).unwrap(), 0);
        assert!(room_type.room_numbers.iter().all(|r| r.unavailable_dates.len() == 2));
    }

    #[test]
    fn test_availability_can_target_specific_rooms() {
        let mut room_type = king_room(&[101, 102]);
        let update = AvailabilityUpdate::new(vec![night(20)]).for_rooms(vec![102]);

        assert_eq!(mark_unavailable(&mut room_type, &update, Utc::now()).unwrap(), 1);
        assert!(room_type.room(101).unwrap().is_available_on(&night(20)));
        assert!(!room_type.room(102).unwrap().is_available_on(&night(20)));

        let unknown = AvailabilityUpdate::new(vec![night(21)]).for_rooms(vec![102, 999]);
        assert_eq!(
            mark_unavailable(&mut room_type, &unknown, Utc::now()),
            Err(CatalogError::UnknownRoomNumber(999))
        );
        assert!(room_type.room(102).unwrap().is_available_on(&night(21)));
    }

    #[test]
    fn test_availability_body_shapes() {
        let single: AvailabilityUpdate =
            serde_json::from_str(r#"{"dates": "2023-12-13T17:00:00.000Z"}"#).unwrap();
        assert_eq!(single.resolved_dates().unwrap().len(), 1);

        let millis: AvailabilityUpdate =
            serde_json::from_str(r#"{"dates": [1702486800000, 1702573200000]}"#).unwrap();
        let dates = millis.resolved_dates().unwrap();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates.iter().next().copied(), Some(night(13)));

        let empty: AvailabilityUpdate = serde_json::from_str(r#"{"dates": []}"#).unwrap();
        assert!(empty.resolved_dates().is_err());
    }

    #[test]
    fn test_replacing_rooms_keeps_surviving_bookings() {
        let mut room_type = king_room(&[101, 102]);
        mark_unavailable(
            &mut room_type,
            &AvailabilityUpdate::new(vec![night(13)]),
            Utc::now(),
        )
        .unwrap();

        let patch = RoomTypePatch {
            room_numbers: Some(vec![RoomNumber::new(102), RoomNumber::new(104)]),
            ..Default::default()
        };
        patch.apply(&mut room_type, Utc::now()).unwrap();

        let numbers: Vec<u32> = room_type.room_numbers.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![102, 104]);
        assert!(!room_type.room(102).unwrap().is_available_on(&night(13)));
        assert!(room_type.room(104).unwrap().is_available_on(&night(13)));
    }
}
