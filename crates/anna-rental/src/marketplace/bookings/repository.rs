use super::domain::{Booking, BookingId};
use crate::identity::UserId;
use crate::storage::{JsonCollection, RepositoryError};

pub trait BookingRepository: Send + Sync {
    fn insert(&self, booking: Booking) -> Result<Booking, RepositoryError>;
    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    fn remove(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    /// Bookings made by `tenant`, oldest first.
    fn for_tenant(&self, tenant: &UserId) -> Result<Vec<Booking>, RepositoryError>;
}

impl BookingRepository for JsonCollection<Booking> {
    fn insert(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        JsonCollection::insert(self, booking)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        JsonCollection::fetch(self, id)
    }

    fn remove(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        JsonCollection::remove(self, id)
    }

    fn for_tenant(&self, tenant: &UserId) -> Result<Vec<Booking>, RepositoryError> {
        self.filtered(|booking| &booking.tenant == tenant)
    }
}
