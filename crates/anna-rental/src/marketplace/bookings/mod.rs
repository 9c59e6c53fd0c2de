//! Tenant bookings. Each booking keeps a snapshot of the listing taken when it was made.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Booking, BookingCounts, BookingId, BookingPartition, BookingRequest, BookingValidationError,
    ListingSnapshot,
};
pub use repository::BookingRepository;
pub use router::{booking_router, BookingRoutes, TENANT_BOOKINGS_PATH};
pub use service::{BookingService, BookingServiceError};
