//! Purpose: Per-call PostgreSQL fetch of `maps` and `users` as sorted record vectors.
//! Exports: `StoreConfig`, `RecordStore`, `MapOrder`.
//! Role: Only module that talks to the backing store; everything downstream
//! works on decoded records.
//! Invariants: One connection per fetch call, opened and closed inside the call.
//! Invariants: Callers see a complete sorted vector or an error, never a
//! truncated result.

use postgres::{Client, NoTls};

use crate::core::error::{Error, ErrorKind};
use crate::core::record::{MapRecord, UserRecord};

/// Connection settings injected by the caller; no ambient globals.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    url: String,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Sort column for `fetch_maps`. Sorting is stable, so ties keep retrieval order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MapOrder {
    ById,
    ByModifiedAt,
}

pub struct RecordStore {
    config: StoreConfig,
}

impl RecordStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    fn connect(&self) -> Result<Client, Error> {
        Client::connect(self.config.url(), NoTls).map_err(|err| {
            Error::new(ErrorKind::Store)
                .with_message("failed to connect to store")
                .with_hint("Check the --db connection URL (or SSMEX_DB) and that the database is reachable.")
                .with_source(err)
        })
    }

    pub fn fetch_maps(&self, order: MapOrder) -> Result<Vec<MapRecord>, Error> {
        let mut client = self.connect()?;
        let rows = client.query("SELECT * FROM maps", &[]).map_err(|err| {
            Error::new(ErrorKind::Store)
                .with_message("failed to query maps")
                .with_table("maps")
                .with_source(err)
        })?;
        let mut maps = rows
            .iter()
            .map(MapRecord::from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                Error::new(ErrorKind::Store)
                    .with_message("failed to decode map row")
                    .with_table("maps")
                    .with_source(err)
            })?;
        match order {
            MapOrder::ById => maps.sort_by_key(|map| map.id),
            MapOrder::ByModifiedAt => maps.sort_by_key(|map| map.modified_at),
        }
        Ok(maps)
    }

    pub fn fetch_users(&self) -> Result<Vec<UserRecord>, Error> {
        let mut client = self.connect()?;
        let rows = client.query("SELECT * FROM users", &[]).map_err(|err| {
            Error::new(ErrorKind::Store)
                .with_message("failed to query users")
                .with_table("users")
                .with_source(err)
        })?;
        let mut users = rows
            .iter()
            .map(UserRecord::from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                Error::new(ErrorKind::Store)
                    .with_message("failed to decode user row")
                    .with_table("users")
                    .with_source(err)
            })?;
        users.sort_by_key(|user| user.id);
        Ok(users)
    }
}
