//! In-memory store backed by `DashMap`.
//!
//! Used by tests and by the server's `--in-memory` mode. Per-key shard locks
//! make the refresh-token compare-and-swap atomic.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use super::{IdentityStore, StoreError, TripStore};
use crate::auth::session::SessionRegistry;
use crate::models::auth::{Identity, NewIdentity};
use crate::models::trip::{ItineraryDay, Trip, TripRequest};
use crate::uuid::uuidv7;

#[derive(Debug, Default)]
pub struct MemoryStore {
    identities: DashMap<Uuid, Identity>,
    emails: DashMap<String, Uuid>,
    refresh_tokens: DashMap<Uuid, String>,
    trips: DashMap<Uuid, Trip>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_identity(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        match self.emails.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "email already registered: {}",
                identity.email
            ))),
            Entry::Vacant(slot) => {
                let record = Identity {
                    id: Uuid::new_v4(),
                    email: identity.email,
                    name: identity.name,
                    password_hash: identity.password_hash,
                };
                self.identities.insert(record.id, record.clone());
                slot.insert(record.id);
                Ok(record)
            }
        }
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let Some(id) = self.emails.get(email).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.identities.get(&id).map(|i| i.value().clone()))
    }

    async fn find_identity_by_id(&self, id: &Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.get(id).map(|i| i.value().clone()))
    }
}

#[async_trait]
impl SessionRegistry for MemoryStore {
    async fn set_refresh_token(&self, identity_id: &Uuid, token: &str) -> Result<(), StoreError> {
        self.refresh_tokens.insert(*identity_id, token.to_string());
        Ok(())
    }

    async fn get_refresh_token(&self, identity_id: &Uuid) -> Result<Option<String>, StoreError> {
        Ok(self
            .refresh_tokens
            .get(identity_id)
            .map(|t| t.value().clone()))
    }

    async fn clear_refresh_token(&self, identity_id: &Uuid) -> Result<(), StoreError> {
        self.refresh_tokens.remove(identity_id);
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        identity_id: &Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, StoreError> {
        // get_mut holds the shard write lock across compare and write
        match self.refresh_tokens.get_mut(identity_id) {
            Some(mut stored) if stored.as_str() == expected => {
                *stored = replacement.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TripStore for MemoryStore {
    async fn create_trip(&self, owner: &Uuid, request: TripRequest) -> Result<Trip, StoreError> {
        let now = Utc::now();
        let trip = Trip {
            id: uuidv7(),
            user_id: *owner,
            request,
            itinerary: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.trips.insert(trip.id, trip.clone());
        Ok(trip)
    }

    async fn get_trip(&self, id: &Uuid) -> Result<Option<Trip>, StoreError> {
        Ok(self.trips.get(id).map(|t| t.value().clone()))
    }

    async fn list_trips(&self, owner: &Uuid) -> Result<Vec<Trip>, StoreError> {
        let mut trips: Vec<Trip> = self
            .trips
            .iter()
            .filter(|t| t.user_id == *owner)
            .map(|t| t.value().clone())
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(trips)
    }

    async fn update_trip(&self, id: &Uuid, request: TripRequest) -> Result<Trip, StoreError> {
        let mut trip = self
            .trips
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("trip {id}")))?;
        trip.request = request;
        trip.updated_at = Utc::now();
        Ok(trip.clone())
    }

    async fn replace_itinerary(
        &self,
        id: &Uuid,
        days: &[ItineraryDay],
    ) -> Result<Trip, StoreError> {
        let mut trip = self
            .trips
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("trip {id}")))?;
        trip.itinerary = days.to_vec();
        trip.updated_at = Utc::now();
        Ok(trip.clone())
    }

    async fn delete_trip(&self, id: &Uuid) -> Result<bool, StoreError> {
        Ok(self.trips.remove(id).is_some())
    }
}
