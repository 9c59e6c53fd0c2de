//! Apartment listings: the two-step editor, landlord management and tenant search.

pub mod domain;
pub mod editor;
pub mod repository;
pub mod router;
pub mod search;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Amenity, Availability, AvailabilityForm, Listing, ListingForm, ListingId, ListingStatus,
    ListingSummary, Price,
};
pub use editor::{EditorStage, ListingDraft, ListingPreview, ListingValidationError, MIN_IMAGES};
pub use repository::ListingRepository;
pub use router::{listing_router, ListingRoutes, LANDLORD_LISTINGS_PATH};
pub use search::{search, SearchCriteria};
pub use service::{ListingCounts, ListingService, ListingServiceError};
