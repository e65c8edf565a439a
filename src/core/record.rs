//! Purpose: Named-field record types decoded from `maps` and `users` rows.
//! Exports: `MapRecord`, `UserRecord`, and their `from_row` decoders.
//! Role: Single place where store column ordinals are known; consumers see
//! only named fields.
//! Invariants: Column ordinals below are the only positional row access in
//! the crate.
//! Invariants: Records are immutable once decoded.

use postgres::Row;
use serde_json::Value;
use time::PrimitiveDateTime;

// `SELECT * FROM maps` column order: id, owner, document, created_at,
// modified_at, name.
const MAPS_ID: usize = 0;
const MAPS_OWNER: usize = 1;
const MAPS_DOCUMENT: usize = 2;
const MAPS_CREATED_AT: usize = 3;
const MAPS_MODIFIED_AT: usize = 4;
const MAPS_NAME: usize = 5;

// `SELECT * FROM users` is wider than we decode; only these ordinals are
// read. The reason-for-registration column sits at a fixed ordinal in the
// registration schema.
const USERS_ID: usize = 0;
const USERS_EMAIL: usize = 1;
const USERS_NAME: usize = 5;
const USERS_STATE: usize = 6;
const USERS_REASON: usize = 13;

/// One System Support Map row plus its metadata.
#[derive(Clone, Debug)]
pub struct MapRecord {
    pub id: i32,
    pub owner: i32,
    pub document: Value,
    pub created_at: PrimitiveDateTime,
    pub modified_at: PrimitiveDateTime,
    pub name: String,
}

impl MapRecord {
    pub fn from_row(row: &Row) -> Result<Self, postgres::Error> {
        Ok(Self {
            id: row.try_get(MAPS_ID)?,
            owner: row.try_get(MAPS_OWNER)?,
            document: row.try_get(MAPS_DOCUMENT)?,
            created_at: row.try_get(MAPS_CREATED_AT)?,
            modified_at: row.try_get(MAPS_MODIFIED_AT)?,
            name: row.try_get(MAPS_NAME)?,
        })
    }
}

/// Registration data for one map owner.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub state: String,
    pub reason: String,
}

impl UserRecord {
    pub fn from_row(row: &Row) -> Result<Self, postgres::Error> {
        Ok(Self {
            id: row.try_get(USERS_ID)?,
            email: row.try_get(USERS_EMAIL)?,
            name: row.try_get(USERS_NAME)?,
            state: row.try_get(USERS_STATE)?,
            reason: row.try_get(USERS_REASON)?,
        })
    }
}
