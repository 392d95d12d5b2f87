// Trip ids are UUIDv7 so they sort by creation time; listing breaks
// `created_at` ties on the id. Identity ids stay v4.

use uuid::Uuid;

/// Generate a timestamp-sortable trip id.
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}
