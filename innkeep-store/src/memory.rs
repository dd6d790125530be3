//! In-process store backing all three repositories.
//!
//! Every collection sits behind one lock, so operations that touch a hotel
//! and its room types are atomic just like the Postgres transactions.

use async_trait::async_trait;
use chrono::Utc;
use innkeep_catalog::{
    count_by_city, count_by_type, mark_unavailable, AvailabilityUpdate, HotelFilter, RoomTypePatch, TypeCount,
};
use innkeep_core::{AccountRepository, HotelRepository, RepoError, RepoResult, RoomTypeRepository};
use innkeep_shared::{Account, Hotel, RoomType};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    accounts: Vec<Account>,
    hotels: Vec<Hotel>,
    room_types: Vec<RoomType>,
}

impl Collections {
    fn check_account_unique(&self, account: &Account) -> RepoResult<()> {
        for other in self.accounts.iter().filter(|a| a.id != account.id) {
            if other.username == account.username {
                return Err(RepoError::Conflict(format!(
                    "username '{}' already exists",
                    account.username
                )));
            }
            if other.email == account.email {
                return Err(RepoError::Conflict(format!(
                    "email '{}' already exists",
                    account.email
                )));
            }
        }
        Ok(())
    }

    fn hotel_mut(&mut self, id: Uuid) -> RepoResult<&mut Hotel> {
        self.hotels
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| RepoError::not_found("hotel", id))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn create_account(&self, account: &Account) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        inner.check_account_unique(account)?;
        inner.accounts.push(account.clone());
        Ok(())
    }

    async fn get_account(&self, id: Uuid) -> RepoResult<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.iter().find(|a| a.username == username).cloned())
    }

    async fn list_accounts(&self) -> RepoResult<Vec<Account>> {
        Ok(self.inner.read().await.accounts.clone())
    }

    async fn update_account(&self, account: &Account) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        inner.check_account_unique(account)?;
        let slot = inner
            .accounts
            .iter_mut()
            .find(|a| a.id == account.id)
            .ok_or_else(|| RepoError::not_found("account", account.id))?;
        *slot = account.clone();
        Ok(())
    }

    async fn delete_account(&self, id: Uuid) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        let before = inner.accounts.len();
        inner.accounts.retain(|a| a.id != id);
        if inner.accounts.len() == before {
            return Err(RepoError::not_found("account", id));
        }
        Ok(())
    }
}

#[async_trait]
impl HotelRepository for MemoryStore {
    async fn create_hotel(&self, hotel: &Hotel) -> RepoResult<()> {
        self.inner.write().await.hotels.push(hotel.clone());
        Ok(())
    }

    async fn get_hotel(&self, id: Uuid) -> RepoResult<Option<Hotel>> {
        let inner = self.inner.read().await;
        Ok(inner.hotels.iter().find(|h| h.id == id).cloned())
    }

    async fn list_hotels(&self, filter: &HotelFilter) -> RepoResult<Vec<Hotel>> {
        let inner = self.inner.read().await;
        Ok(filter.apply(inner.hotels.iter().cloned()))
    }

    async fn update_hotel(&self, hotel: &Hotel) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        let slot = inner.hotel_mut(hotel.id)?;
        let room_type_ids = std::mem::take(&mut slot.room_type_ids);
        *slot = hotel.clone();
        slot.room_type_ids = room_type_ids;
        Ok(())
    }

    async fn delete_hotel(&self, id: Uuid) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        let position = inner
            .hotels
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| RepoError::not_found("hotel", id))?;
        let hotel = inner.hotels.remove(position);
        inner
            .room_types
            .retain(|r| !hotel.room_type_ids.contains(&r.id));
        Ok(())
    }

    async fn count_by_city(&self, cities: &[String]) -> RepoResult<Vec<u64>> {
        let inner = self.inner.read().await;
        Ok(count_by_city(&inner.hotels, cities))
    }

    async fn count_by_type(&self) -> RepoResult<Vec<TypeCount>> {
        let inner = self.inner.read().await;
        Ok(count_by_type(&inner.hotels))
    }
}

#[async_trait]
impl RoomTypeRepository for MemoryStore {
    async fn create_room_type(&self, hotel_id: Uuid, room_type: &RoomType) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        let hotel = inner.hotel_mut(hotel_id)?;
        hotel.room_type_ids.push(room_type.id);
        hotel.updated_at = Utc::now();
        inner.room_types.push(room_type.clone());
        Ok(())
    }

    async fn get_room_type(&self, id: Uuid) -> RepoResult<Option<RoomType>> {
        let inner = self.inner.read().await;
        Ok(inner.room_types.iter().find(|r| r.id == id).cloned())
    }

    async fn get_room_types(&self, ids: &[Uuid]) -> RepoResult<Vec<RoomType>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.room_types.iter().find(|r| r.id == *id).cloned())
            .collect())
    }

    async fn list_room_types(&self) -> RepoResult<Vec<RoomType>> {
        Ok(self.inner.read().await.room_types.clone())
    }

    async fn update_room_type(&self, id: Uuid, patch: RoomTypePatch) -> RepoResult<RoomType> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .room_types
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RepoError::not_found("room type", id))?;

        // Patch a copy so a rejected patch leaves the record untouched.
        let mut room_type = slot.clone();
        patch.apply(&mut room_type, Utc::now())?;
        *slot = room_type.clone();
        Ok(room_type)
    }

    async fn delete_room_type(&self, id: Uuid, hotel_id: Uuid) -> RepoResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.hotel_mut(hotel_id)?.room_type_ids.contains(&id) {
            return Err(RepoError::not_found("room type", id));
        }

        let position = inner
            .room_types
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RepoError::not_found("room type", id))?;
        inner.room_types.remove(position);

        let now = Utc::now();
        for hotel in inner.hotels.iter_mut().filter(|h| h.room_type_ids.contains(&id)) {
            hotel.room_type_ids.retain(|r| *r != id);
            hotel.updated_at = now;
        }
        Ok(())
    }

    async fn mark_unavailable(&self, id: Uuid, update: &AvailabilityUpdate) -> RepoResult<RoomType> {
        let mut inner = self.inner.write().await;
        let room_type = inner
            .room_types
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RepoError::not_found("room type", id))?;

        mark_unavailable(room_type, update, Utc::now())?;
        Ok(room_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use innkeep_catalog::{NewHotel, NewRoomType};
    use innkeep_shared::{HotelType, Masked, RoomNumber};

    fn account(username: &str, email: &str) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: Masked::new("$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_string()),
            phone: "012128900".to_string(),
            country: "vietnam".to_string(),
            city: "hcm".to_string(),
            img: None,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn hotel(city: &str) -> Hotel {
        NewHotel {
            name: format!("Stay in {}", city),
            hotel_type: HotelType::Hotel,
            city: city.to_string(),
            address: "1 Main Street".to_string(),
            distance: "200".to_string(),
            photos: vec![],
            title: "Central".to_string(),
            description: "Close to everything".to_string(),
            rating: 4.0,
            cheapest_price: 80,
            featured: false,
        }
        .into_hotel(Utc::now())
        .unwrap()
    }

    fn room_type(numbers: &[u32]) -> RoomType {
        NewRoomType {
            title: "King Room".to_string(),
            description: "King size bed".to_string(),
            price: 100,
            max_people: 2,
            room_numbers: numbers.iter().map(|n| RoomNumber::new(*n)).collect(),
        }
        .into_room_type(Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn test_username_and_email_are_unique() {
        let store = MemoryStore::new();
        store.create_account(&account("customer3", "c3@example.com")).await.unwrap();

        let same_name = store.create_account(&account("customer3", "other@example.com")).await;
        assert!(matches!(same_name, Err(RepoError::Conflict(_))));

        let same_email = store.create_account(&account("customer4", "c3@example.com")).await;
        assert!(matches!(same_email, Err(RepoError::Conflict(_))));

        store.create_account(&account("customer4", "c4@example.com")).await.unwrap();
        assert_eq!(store.list_accounts().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_rechecks_uniqueness() {
        let store = MemoryStore::new();
        let first = account("alice", "alice@example.com");
        let mut second = account("bob", "bob@example.com");
        store.create_account(&first).await.unwrap();
        store.create_account(&second).await.unwrap();

        second.username = "alice".to_string();
        assert!(matches!(store.update_account(&second).await, Err(RepoError::Conflict(_))));

        // Saving an account unchanged does not conflict with itself.
        assert!(store.update_account(&first).await.is_ok());
    }

    #[tokio::test]
    async fn test_room_type_lifecycle_keeps_references_consistent() {
        let store = MemoryStore::new();
        let h = hotel("hanoi");
        store.create_hotel(&h).await.unwrap();

        let rt = room_type(&[101, 102]);
        store.create_room_type(h.id, &rt).await.unwrap();

        let stored = store.get_hotel(h.id).await.unwrap().unwrap();
        assert_eq!(stored.room_type_ids, vec![rt.id]);

        store.delete_room_type(rt.id, h.id).await.unwrap();
        let stored = store.get_hotel(h.id).await.unwrap().unwrap();
        assert!(stored.room_type_ids.is_empty());
        assert!(store.get_room_type(rt.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_room_type_for_missing_hotel_writes_nothing() {
        let store = MemoryStore::new();
        let rt = room_type(&[1]);

        let result = store.create_room_type(Uuid::new_v4(), &rt).await;
        assert!(matches!(result, Err(RepoError::NotFound { entity: "hotel", .. })));
        assert!(store.list_room_types().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hotel_update_cannot_overwrite_room_list() {
        let store = MemoryStore::new();
        let h = hotel("hue");
        store.create_hotel(&h).await.unwrap();
        let rt = room_type(&[7]);
        store.create_room_type(h.id, &rt).await.unwrap();

        let mut stale = h.clone();
        stale.name = "Renamed".to_string();
        store.update_hotel(&stale).await.unwrap();

        let stored = store.get_hotel(h.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.room_type_ids, vec![rt.id]);
    }

    #[tokio::test]
    async fn test_hotel_delete_cascades_to_room_types() {
        let store = MemoryStore::new();
        let h = hotel("danang");
        store.create_hotel(&h).await.unwrap();
        let rt = room_type(&[1, 2]);
        store.create_room_type(h.id, &rt).await.unwrap();

        store.delete_hotel(h.id).await.unwrap();
        assert!(store.get_room_type(rt.id).await.unwrap().is_none());
        assert!(matches!(store.delete_hotel(h.id).await, Err(RepoError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_room_types_keeps_order_and_skips_missing() {
        let store = MemoryStore::new();
        let h = hotel("hanoi");
        store.create_hotel(&h).await.unwrap();
        let a = room_type(&[1]);
        let b = room_type(&[2]);
        store.create_room_type(h.id, &a).await.unwrap();
        store.create_room_type(h.id, &b).await.unwrap();

        let found = store.get_room_types(&[b.id, Uuid::new_v4(), a.id]).await.unwrap();
        let ids: Vec<Uuid> = found.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_mark_unavailable_books_every_room() {
        let store = MemoryStore::new();
        let h = hotel("hanoi");
        store.create_hotel(&h).await.unwrap();
        let rt = room_type(&[101, 102, 103]);
        store.create_room_type(h.id, &rt).await.unwrap();

        let date = Utc.with_ymd_and_hms(2023, 12, 13, 17, 0, 0).unwrap();
        let update = AvailabilityUpdate::new(vec![date]);
        store.mark_unavailable(rt.id, &update).await.unwrap();
        let updated = store.mark_unavailable(rt.id, &update).await.unwrap();

        assert!(updated
            .room_numbers
            .iter()
            .all(|r| r.unavailable_dates.len() == 1 && r.unavailable_dates.contains(&date)));

        let missing = store.mark_unavailable(Uuid::new_v4(), &update).await;
        assert!(matches!(missing, Err(RepoError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_price_patch_keeps_bookings() {
        let store = MemoryStore::new();
        let h = hotel("hanoi");
        store.create_hotel(&h).await.unwrap();
        let rt = room_type(&[101, 102]);
        store.create_room_type(h.id, &rt).await.unwrap();

        let date = Utc.with_ymd_and_hms(2023, 12, 13, 17, 0, 0).unwrap();
        store.mark_unavailable(rt.id, &AvailabilityUpdate::new(vec![date])).await.unwrap();

        let patch = RoomTypePatch {
            price: Some(150),
            ..Default::default()
        };
        let updated = store.update_room_type(rt.id, patch).await.unwrap();
        assert_eq!(updated.price, 150);

        let stored = store.get_room_type(rt.id).await.unwrap().unwrap();
        assert_eq!(stored.price, 150);
        assert!(stored.room_numbers.iter().all(|r| r.unavailable_dates.contains(&date)));
    }

    #[tokio::test]
    async fn test_concurrent_patches_and_bookings_lose_nothing() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let h = hotel("hanoi");
        store.create_hotel(&h).await.unwrap();
        let rt = room_type(&[101]);
        store.create_room_type(h.id, &rt).await.unwrap();
        let id = rt.id;

        let dates: Vec<_> = (1..=20)
            .map(|day| Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap())
            .collect();

        let mut tasks = Vec::new();
        for (i, date) in dates.iter().copied().enumerate() {
            let booker = store.clone();
            tasks.push(tokio::spawn(async move {
                booker.mark_unavailable(id, &AvailabilityUpdate::new(vec![date])).await.map(|_| ())
            }));
            let editor = store.clone();
            tasks.push(tokio::spawn(async move {
                let patch = RoomTypePatch {
                    price: Some(100 + i as i64),
                    ..Default::default()
                };
                editor.update_room_type(id, patch).await.map(|_| ())
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = store.get_room_type(id).await.unwrap().unwrap();
        for date in &dates {
            assert!(stored.room_numbers[0].unavailable_dates.contains(date));
        }
    }

    #[tokio::test]
    async fn test_rejected_patch_leaves_record_untouched() {
        let store = MemoryStore::new();
        let h = hotel("hue");
        store.create_hotel(&h).await.unwrap();
        let rt = room_type(&[1]);
        store.create_room_type(h.id, &rt).await.unwrap();

        let patch = RoomTypePatch {
            title: Some("Suite".to_string()),
            price: Some(-5),
            ..Default::default()
        };
        let result = store.update_room_type(rt.id, patch).await;
        assert!(matches!(result, Err(RepoError::Invalid(_))));

        let stored = store.get_room_type(rt.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "King Room");
        assert_eq!(stored.price, 100);

        let missing = store.update_room_type(Uuid::new_v4(), RoomTypePatch::default()).await;
        assert!(matches!(missing, Err(RepoError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_room_type_requires_owning_hotel() {
        let store = MemoryStore::new();
        let owner = hotel("hanoi");
        let other = hotel("hue");
        store.create_hotel(&owner).await.unwrap();
        store.create_hotel(&other).await.unwrap();
        let rt = room_type(&[1]);
        store.create_room_type(owner.id, &rt).await.unwrap();

        let result = store.delete_room_type(rt.id, other.id).await;
        assert!(matches!(result, Err(RepoError::NotFound { entity: "room type", .. })));

        assert!(store.get_room_type(rt.id).await.unwrap().is_some());
        let stored = store.get_hotel(owner.id).await.unwrap().unwrap();
        assert_eq!(stored.room_type_ids, vec![rt.id]);
    }

    #[tokio::test]
    async fn test_counts() {
        let store = MemoryStore::new();
        for city in ["hochiminh", "hochiminh", "hanoi"] {
            store.create_hotel(&hotel(city)).await.unwrap();
        }

        let cities = vec!["hanoi".to_string(), "danang".to_string(), "hochiminh".to_string()];
        assert_eq!(store.count_by_city(&cities).await.unwrap(), vec![1, 0, 2]);

        let types = store.count_by_type().await.unwrap();
        assert_eq!(types[0].count, 3);
        assert!(types[1..].iter().all(|t| t.count == 0));
    }
}
