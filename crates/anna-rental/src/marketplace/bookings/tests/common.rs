use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::identity::{
    Credentials, IdentityProvider, LocalIdentityProvider, Role, Session, SessionGuard, UserId,
};
use crate::marketplace::bookings::domain::{Booking, BookingId};
use crate::marketplace::bookings::repository::BookingRepository;
use crate::marketplace::bookings::{booking_router, BookingRoutes, BookingService};
use crate::marketplace::listings::{
    Amenity, AvailabilityForm, Listing, ListingDraft, ListingForm,
};
use crate::storage::{JsonCollection, ListingStore, RepositoryError};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn booked_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn lekki_studio(owner: &UserId) -> Listing {
    let form = ListingForm {
        title: "Lekki Studio".to_string(),
        description: "Bright self-contained studio a short walk from the beach".to_string(),
        location: "Lekki, Lagos".to_string(),
        amenities: BTreeSet::from([Amenity::WiFi]),
        price: "15000".to_string(),
        availability: AvailabilityForm {
            from: Some(date(2024, 1, 1)),
            to: Some(date(2024, 12, 31)),
        },
        images: vec![
            "lekki-1.jpg".to_string(),
            "lekki-2.jpg".to_string(),
            "lekki-3.jpg".to_string(),
        ],
    };
    ListingDraft::new(form)
        .preview()
        .expect("fixture form is valid")
        .publish_new(owner, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single().expect("valid"))
}

/// Listing store seeded with one active "Lekki Studio".
pub(super) fn seeded_listings() -> (Arc<ListingStore>, Listing) {
    let listings: Arc<ListingStore> = Arc::new(JsonCollection::in_memory());
    let listing = lekki_studio(&UserId::generate());
    listings.insert(listing.clone()).expect("seeds listing");
    (listings, listing)
}

pub(super) fn build_service() -> (
    BookingService<ListingStore, MemoryBookings>,
    Arc<ListingStore>,
    Arc<MemoryBookings>,
    Listing,
) {
    let (listings, listing) = seeded_listings();
    let bookings = Arc::new(MemoryBookings::default());
    let service = BookingService::new(listings.clone(), bookings.clone());
    (service, listings, bookings, listing)
}

#[derive(Default, Clone)]
pub(super) struct MemoryBookings {
    pub(super) records: Arc<Mutex<Vec<Booking>>>,
}

impl MemoryBookings {
    pub(super) fn snapshot(&self) -> Vec<Booking> {
        self.records.lock().expect("repository mutex poisoned").clone()
    }
}

impl BookingRepository for MemoryBookings {
    fn insert(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == booking.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(booking.clone());
        Ok(booking)
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|booking| &booking.id == id).cloned())
    }

    fn remove(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let position = guard.iter().position(|booking| &booking.id == id);
        Ok(position.map(|index| guard.remove(index)))
    }

    fn for_tenant(&self, tenant: &UserId) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|booking| &booking.tenant == tenant)
            .collect())
    }
}

pub(super) struct UnavailableBookings;

impl BookingRepository for UnavailableBookings {
    fn insert(&self, _booking: Booking) -> Result<Booking, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    fn fetch(&self, _id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    fn remove(&self, _id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    fn for_tenant(&self, _tenant: &UserId) -> Result<Vec<Booking>, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }
}

pub(super) fn signed_in(provider: &LocalIdentityProvider, email: &str, role: Role) -> Session {
    let registration = provider
        .register(email, "s3cret-pass", role)
        .expect("registers");
    provider
        .verify_email(&registration.verification_code)
        .expect("verifies");
    provider
        .sign_in(&Credentials {
            email: email.to_string(),
            password: "s3cret-pass".to_string(),
        })
        .expect("signs in")
}

pub(super) fn routes_with<L, B>(
    service: BookingService<L, B>,
    provider: Arc<LocalIdentityProvider>,
) -> BookingRoutes<L, B> {
    BookingRoutes {
        service: Arc::new(service),
        guard: SessionGuard::new(provider),
    }
}

pub(super) fn router_with(
    service: BookingService<ListingStore, MemoryBookings>,
    provider: Arc<LocalIdentityProvider>,
) -> axum::Router {
    booking_router(routes_with(service, provider))
}

pub(super) fn bearer(session: &Session) -> String {
    format!("Bearer {}", session.token.as_str())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
