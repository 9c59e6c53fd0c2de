//! Keyed record storage backing the listing, booking and account repositories.
//!
//! Each collection is an independent JSON document (`listings.json`, `bookings.json`,
//! `accounts.json`) holding an
//! array of records in creation order. Collections are materialised on first access and every
//! mutation touches a single record under the collection lock before the document is rewritten
//! atomically, so writers inside one process never lose each other's updates.

mod json;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::StorageConfig;
use crate::identity::provider::StoredAccount;
use crate::marketplace::bookings::Booking;
use crate::marketplace::listings::Listing;

pub use json::JsonCollection;

pub const LISTINGS_FILE: &str = "listings.json";
pub const BOOKINGS_FILE: &str = "bookings.json";
pub const ACCOUNTS_FILE: &str = "accounts.json";

pub type ListingStore = JsonCollection<Listing>;
pub type BookingStore = JsonCollection<Booking>;
pub type AccountStore = JsonCollection<StoredAccount>;

/// A record that can live in a [`JsonCollection`].
pub trait StoredRecord: Clone + Serialize + DeserializeOwned + Send + 'static {
    type Key: Ord + Clone + Send + std::fmt::Debug;

    fn key(&self) -> Self::Key;

    /// Collections list records by this timestamp, oldest first.
    fn created_at(&self) -> DateTime<Utc>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored collection at {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Open the listing and booking collections described by `config`.
pub fn open_stores(
    config: &StorageConfig,
) -> Result<(Arc<ListingStore>, Arc<BookingStore>), RepositoryError> {
    Ok((
        Arc::new(open_collection(config, LISTINGS_FILE)?),
        Arc::new(open_collection(config, BOOKINGS_FILE)?),
    ))
}

/// Open the account collection. It shares the data directory with listings and bookings so
/// record owners stay resolvable across restarts.
pub fn open_account_store(config: &StorageConfig) -> Result<AccountStore, RepositoryError> {
    open_collection(config, ACCOUNTS_FILE)
}

fn open_collection<V: StoredRecord>(
    config: &StorageConfig,
    file: &str,
) -> Result<JsonCollection<V>, RepositoryError> {
    match &config.data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| RepositoryError::Io {
                path: dir.clone(),
                source,
            })?;
            Ok(JsonCollection::open(dir.join(file)))
        }
        None => Ok(JsonCollection::in_memory()),
    }
}
