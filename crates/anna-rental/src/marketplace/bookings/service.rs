use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use super::domain::{
    Booking, BookingId, BookingPartition, BookingRequest, BookingValidationError, ListingSnapshot,
};
use super::repository::BookingRepository;
use crate::identity::UserId;
use crate::marketplace::listings::{ListingId, ListingRepository};
use crate::storage::RepositoryError;

/// Books listings for tenants and manages the resulting reservations.
pub struct BookingService<L, B> {
    listings: Arc<L>,
    bookings: Arc<B>,
}

impl<L, B> BookingService<L, B>
where
    L: ListingRepository + 'static,
    B: BookingRepository + 'static,
{
    pub fn new(listings: Arc<L>, bookings: Arc<B>) -> Self {
        Self { listings, bookings }
    }

    /// Validate the request, then snapshot the listing into a new booking.
    pub fn book(
        &self,
        tenant: &UserId,
        listing_id: &ListingId,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingServiceError> {
        let (check_in, check_out, guests) = request.validate()?;

        let listing = self
            .listings
            .fetch(listing_id)?
            .ok_or_else(|| BookingServiceError::ListingNotFound(listing_id.clone()))?;
        if !listing.is_active() {
            warn!(listing_id = %listing_id, "booking attempted on paused listing");
            return Err(BookingServiceError::ListingPaused(listing_id.clone()));
        }

        let booking = Booking {
            id: BookingId::generate(),
            tenant: tenant.clone(),
            listing: ListingSnapshot::capture(&listing, now),
            check_in,
            check_out,
            guests,
            created_at: now,
        };
        let stored = self.bookings.insert(booking)?;
        info!(
            booking_id = %stored.id,
            listing_id = %listing_id,
            tenant = %tenant,
            %check_in,
            %check_out,
            "booking confirmed"
        );
        Ok(stored)
    }

    /// The tenant's bookings split into upcoming and past relative to `today`.
    pub fn bookings_for(
        &self,
        tenant: &UserId,
        today: NaiveDate,
    ) -> Result<BookingPartition, BookingServiceError> {
        let bookings = self.bookings.for_tenant(tenant)?;
        Ok(BookingPartition::split(bookings, today))
    }

    /// Remove one booking by id. Only its tenant may cancel it.
    pub fn cancel(&self, tenant: &UserId, id: &BookingId) -> Result<Booking, BookingServiceError> {
        let booking = self
            .bookings
            .fetch(id)?
            .ok_or_else(|| BookingServiceError::NotFound(id.clone()))?;
        if &booking.tenant != tenant {
            return Err(BookingServiceError::NotOwner(id.clone()));
        }

        let removed = self
            .bookings
            .remove(id)?
            .ok_or_else(|| BookingServiceError::NotFound(id.clone()))?;
        info!(booking_id = %id, tenant = %tenant, "booking cancelled");
        Ok(removed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingServiceError {
    #[error(transparent)]
    Validation(#[from] BookingValidationError),
    #[error("listing {0} not found")]
    ListingNotFound(ListingId),
    #[error("listing {0} is paused and not accepting bookings")]
    ListingPaused(ListingId),
    #[error("booking {0} not found")]
    NotFound(BookingId),
    #[error("booking {0} belongs to another tenant")]
    NotOwner(BookingId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
