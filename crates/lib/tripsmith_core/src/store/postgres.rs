//! PostgreSQL store.
//!
//! The live refresh-token digest is a column on `users`; the itinerary is a
//! JSONB column on `trips`, so replacing it is a single `UPDATE`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{IdentityStore, StoreError, TripStore};
use crate::auth::session::SessionRegistry;
use crate::models::auth::{Identity, NewIdentity};
use crate::models::trip::{ItineraryDay, Trip, TripRequest};
use crate::uuid::uuidv7;

const TRIP_COLUMNS: &str = "id, user_id, destination, start_date, end_date, duration, \
     travelers, budget, interests, pace, accommodation, notes, itinerary, \
     created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Identity {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    user_id: Uuid,
    destination: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration: i32,
    travelers: i32,
    budget: String,
    interests: Vec<String>,
    pace: String,
    accommodation: Option<String>,
    notes: Option<String>,
    itinerary: Json<Vec<ItineraryDay>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TripRow> for Trip {
    type Error = StoreError;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        let decode = |e: crate::models::trip::ValidationError| StoreError::Decode(e.0);
        Ok(Trip {
            id: row.id,
            user_id: row.user_id,
            request: TripRequest {
                destination: row.destination,
                start_date: row.start_date,
                end_date: row.end_date,
                duration: u32::try_from(row.duration)
                    .map_err(|_| StoreError::Decode(format!("negative duration {}", row.duration)))?,
                travelers: u32::try_from(row.travelers).map_err(|_| {
                    StoreError::Decode(format!("negative travelers {}", row.travelers))
                })?,
                budget: row.budget.parse().map_err(decode)?,
                interests: row.interests,
                pace: row.pace.parse().map_err(decode)?,
                accommodation: row.accommodation,
                notes: row.notes,
            },
            itinerary: row.itinerary.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn create_identity(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, email, name, password_hash",
        )
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(&identity.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(
                format!("email already registered: {}", identity.email),
            ),
            other => StoreError::Db(other),
        })?;
        Ok(row.into())
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, email, name, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Identity::from))
    }

    async fn find_identity_by_id(&self, id: &Uuid) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id, email, name, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Identity::from))
    }
}

#[async_trait]
impl SessionRegistry for PgStore {
    async fn set_refresh_token(&self, identity_id: &Uuid, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(identity_id)
        .bind(token)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("identity {identity_id}")));
        }
        Ok(())
    }

    async fn get_refresh_token(&self, identity_id: &Uuid) -> Result<Option<String>, StoreError> {
        let row = sqlx::query_scalar::<_, Option<String>>(
            "SELECT refresh_token_hash FROM users WHERE id = $1",
        )
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.flatten())
    }

    async fn clear_refresh_token(&self, identity_id: &Uuid) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET refresh_token_hash = NULL, updated_at = now() WHERE id = $1",
        )
        .bind(identity_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        identity_id: &Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, StoreError> {
        // Conditional write: the row lock taken by UPDATE serializes racing rotations.
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $3, updated_at = now() \
             WHERE id = $1 AND refresh_token_hash = $2",
        )
        .bind(identity_id)
        .bind(expected)
        .bind(replacement)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl TripStore for PgStore {
    async fn create_trip(&self, owner: &Uuid, request: TripRequest) -> Result<Trip, StoreError> {
        let row = sqlx::query_as::<_, TripRow>(&format!(
            "INSERT INTO trips (id, user_id, destination, start_date, end_date, duration, \
             travelers, budget, interests, pace, accommodation, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {TRIP_COLUMNS}"
        ))
        .bind(uuidv7())
        .bind(owner)
        .bind(&request.destination)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.duration as i32)
        .bind(request.travelers as i32)
        .bind(request.budget.as_str())
        .bind(&request.interests)
        .bind(request.pace.as_str())
        .bind(&request.accommodation)
        .bind(&request.notes)
        .fetch_one(&self.pool)
        .await?;
        Trip::try_from(row)
    }

    async fn get_trip(&self, id: &Uuid) -> Result<Option<Trip>, StoreError> {
        let row = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Trip::try_from).transpose()
    }

    async fn list_trips(&self, owner: &Uuid) -> Result<Vec<Trip>, StoreError> {
        let rows = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Trip::try_from).collect()
    }

    async fn update_trip(&self, id: &Uuid, request: TripRequest) -> Result<Trip, StoreError> {
        let row = sqlx::query_as::<_, TripRow>(&format!(
            "UPDATE trips SET destination = $2, start_date = $3, end_date = $4, \
             duration = $5, travelers = $6, budget = $7, interests = $8, pace = $9, \
             accommodation = $10, notes = $11, updated_at = now() WHERE id = $1 \
             RETURNING {TRIP_COLUMNS}"
        ))
        .bind(id)
        .bind(&request.destination)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.duration as i32)
        .bind(request.travelers as i32)
        .bind(request.budget.as_str())
        .bind(&request.interests)
        .bind(request.pace.as_str())
        .bind(&request.accommodation)
        .bind(&request.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("trip {id}")))?;
        Trip::try_from(row)
    }

    async fn replace_itinerary(
        &self,
        id: &Uuid,
        days: &[ItineraryDay],
    ) -> Result<Trip, StoreError> {
        let row = sqlx::query_as::<_, TripRow>(&format!(
            "UPDATE trips SET itinerary = $2, updated_at = now() WHERE id = $1 \
             RETURNING {TRIP_COLUMNS}"
        ))
        .bind(id)
        .bind(Json(days))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("trip {id}")))?;
        Trip::try_from(row)
    }

    async fn delete_trip(&self, id: &Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
