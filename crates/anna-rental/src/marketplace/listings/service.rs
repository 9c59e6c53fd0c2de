use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{Listing, ListingForm, ListingId, ListingStatus};
use super::editor::{ListingDraft, ListingPreview, ListingValidationError};
use super::repository::ListingRepository;
use super::search::{search, SearchCriteria};
use crate::identity::UserId;
use crate::storage::RepositoryError;

/// Service composing the listing editor, search filters and repository.
pub struct ListingService<R> {
    repository: Arc<R>,
}

impl<R> ListingService<R>
where
    R: ListingRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Run the draft through validation without touching the store.
    pub fn preview(&self, draft: ListingDraft) -> Result<ListingPreview, ListingServiceError> {
        Ok(draft.preview()?)
    }

    /// Validate and publish a new listing.
    pub fn publish(
        &self,
        owner: &UserId,
        form: ListingForm,
        now: DateTime<Utc>,
    ) -> Result<Listing, ListingServiceError> {
        let listing = ListingDraft::new(form).preview()?.publish_new(owner, now);
        let stored = self.repository.insert(listing)?;
        info!(listing_id = %stored.id, owner = %owner, "listing published");
        Ok(stored)
    }

    /// Editor draft pre-filled from one of `owner`'s listings.
    pub fn draft_for_edit(
        &self,
        owner: &UserId,
        id: &ListingId,
    ) -> Result<ListingDraft, ListingServiceError> {
        let listing = self.owned(owner, id)?;
        Ok(ListingDraft::editing(&listing))
    }

    /// Validate and publish changes over an existing listing.
    pub fn update(
        &self,
        owner: &UserId,
        id: &ListingId,
        form: ListingForm,
        now: DateTime<Utc>,
    ) -> Result<Listing, ListingServiceError> {
        let existing = self.owned(owner, id)?;
        let preview = ListingDraft::editing(&existing).with_form(form).preview()?;
        let updated = preview.publish_over(existing, now);
        self.repository.update(updated.clone())?;
        info!(listing_id = %id, "listing updated");
        Ok(updated)
    }

    pub fn delete(&self, owner: &UserId, id: &ListingId) -> Result<Listing, ListingServiceError> {
        self.owned(owner, id)?;
        let removed = self
            .repository
            .remove(id)?
            .ok_or_else(|| ListingServiceError::NotFound(id.clone()))?;
        info!(listing_id = %id, "listing deleted");
        Ok(removed)
    }

    /// Flip Active and Paused.
    pub fn toggle_status(
        &self,
        owner: &UserId,
        id: &ListingId,
    ) -> Result<Listing, ListingServiceError> {
        let mut listing = self.owned(owner, id)?;
        listing.status = listing.status.toggled();
        self.repository.update(listing.clone())?;
        info!(listing_id = %id, status = listing.status.label(), "listing status changed");
        Ok(listing)
    }

    /// Listings managed by `owner`, oldest first.
    pub fn listings_for(&self, owner: &UserId) -> Result<Vec<Listing>, ListingServiceError> {
        Ok(self.repository.owned_by(owner)?)
    }

    /// Default landing view: every active listing.
    pub fn browse(&self) -> Result<Vec<Listing>, ListingServiceError> {
        self.search(&SearchCriteria::default())
    }

    pub fn search(&self, criteria: &SearchCriteria) -> Result<Vec<Listing>, ListingServiceError> {
        let listings = self.repository.all()?;
        Ok(search(&listings, criteria).into_iter().cloned().collect())
    }

    pub fn get(&self, id: &ListingId) -> Result<Listing, ListingServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| ListingServiceError::NotFound(id.clone()))
    }

    fn owned(&self, owner: &UserId, id: &ListingId) -> Result<Listing, ListingServiceError> {
        let listing = self.get(id)?;
        if &listing.owner != owner {
            return Err(ListingServiceError::NotOwner(id.clone()));
        }
        Ok(listing)
    }
}

/// Counts shown on the landlord dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ListingCounts {
    pub total: usize,
    pub active: usize,
    pub paused: usize,
}

impl ListingCounts {
    pub fn tally(listings: &[Listing]) -> Self {
        let paused = listings
            .iter()
            .filter(|listing| listing.status == ListingStatus::Paused)
            .count();
        Self {
            total: listings.len(),
            active: listings.len() - paused,
            paused,
        }
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    Validation(#[from] ListingValidationError),
    #[error("listing {0} not found")]
    NotFound(ListingId),
    #[error("listing {0} belongs to another landlord")]
    NotOwner(ListingId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
