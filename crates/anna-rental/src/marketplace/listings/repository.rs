use super::domain::{Listing, ListingId};
use crate::identity::UserId;
use crate::storage::{JsonCollection, RepositoryError};

/// Storage abstraction so the listing service can be exercised in isolation.
pub trait ListingRepository: Send + Sync {
    fn insert(&self, listing: Listing) -> Result<Listing, RepositoryError>;
    fn update(&self, listing: Listing) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError>;
    fn remove(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError>;
    /// Every listing, oldest first.
    fn all(&self) -> Result<Vec<Listing>, RepositoryError>;
    fn owned_by(&self, owner: &UserId) -> Result<Vec<Listing>, RepositoryError>;
}

impl ListingRepository for JsonCollection<Listing> {
    fn insert(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        JsonCollection::insert(self, listing)
    }

    fn update(&self, listing: Listing) -> Result<(), RepositoryError> {
        self.replace(listing)
    }

    fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        JsonCollection::fetch(self, id)
    }

    fn remove(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        JsonCollection::remove(self, id)
    }

    fn all(&self) -> Result<Vec<Listing>, RepositoryError> {
        JsonCollection::all(self)
    }

    fn owned_by(&self, owner: &UserId) -> Result<Vec<Listing>, RepositoryError> {
        self.filtered(|listing| &listing.owner == owner)
    }
}
