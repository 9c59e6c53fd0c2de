use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::identity::{
    Credentials, IdentityProvider, LocalIdentityProvider, Role, Session, SessionGuard, UserId,
};
use crate::marketplace::listings::domain::{
    Amenity, AvailabilityForm, Listing, ListingForm, ListingId,
};
use crate::marketplace::listings::repository::ListingRepository;
use crate::marketplace::listings::{listing_router, ListingRoutes, ListingService};
use crate::storage::RepositoryError;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn published_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn lekki_form() -> ListingForm {
    ListingForm {
        title: "Lekki Studio".to_string(),
        description: "Bright self-contained studio a short walk from the beach".to_string(),
        location: "Lekki, Lagos".to_string(),
        amenities: BTreeSet::from([Amenity::WiFi, Amenity::AirConditioning]),
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
    }
}

pub(super) fn ikeja_form() -> ListingForm {
    ListingForm {
        title: "Ikeja Two Bedroom".to_string(),
        description: "Serviced flat near the airport".to_string(),
        location: "Ikeja, Lagos".to_string(),
        amenities: BTreeSet::from([Amenity::Generator, Amenity::Parking]),
        price: "40000".to_string(),
        availability: AvailabilityForm {
            from: Some(date(2024, 3, 1)),
            to: Some(date(2024, 6, 30)),
        },
        images: vec![
            "ikeja-1.jpg".to_string(),
            "ikeja-2.jpg".to_string(),
            "ikeja-3.jpg".to_string(),
            "ikeja-4.jpg".to_string(),
        ],
    }
}

/// Publish `form` through the editor so fixtures always satisfy validation.
pub(super) fn listing_from(form: ListingForm, owner: &UserId, minutes: i64) -> Listing {
    crate::marketplace::listings::ListingDraft::new(form)
        .preview()
        .expect("fixture form is valid")
        .publish_new(owner, published_at() + Duration::minutes(minutes))
}

pub(super) fn build_service() -> (ListingService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = ListingService::new(repository.clone());
    (service, repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) listings: Arc<Mutex<Vec<Listing>>>,
}

impl MemoryRepository {
    pub(super) fn snapshot(&self) -> Vec<Listing> {
        self.listings.lock().expect("repository mutex poisoned").clone()
    }
}

impl ListingRepository for MemoryRepository {
    fn insert(&self, listing: Listing) -> Result<Listing, RepositoryError> {
        let mut guard = self.listings.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.id == listing.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(listing.clone());
        Ok(listing)
    }

    fn update(&self, listing: Listing) -> Result<(), RepositoryError> {
        let mut guard = self.listings.lock().expect("repository mutex poisoned");
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == listing.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = listing;
        Ok(())
    }

    fn fetch(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        let guard = self.listings.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|listing| &listing.id == id).cloned())
    }

    fn remove(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        let mut guard = self.listings.lock().expect("repository mutex poisoned");
        let position = guard.iter().position(|listing| &listing.id == id);
        Ok(position.map(|index| guard.remove(index)))
    }

    fn all(&self) -> Result<Vec<Listing>, RepositoryError> {
        Ok(self.snapshot())
    }

    fn owned_by(&self, owner: &UserId) -> Result<Vec<Listing>, RepositoryError> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|listing| &listing.owner == owner)
            .collect())
    }
}

pub(super) struct UnavailableRepository;

impl ListingRepository for UnavailableRepository {
    fn insert(&self, _listing: Listing) -> Result<Listing, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    fn update(&self, _listing: Listing) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    fn fetch(&self, _id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    fn remove(&self, _id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    fn all(&self) -> Result<Vec<Listing>, RepositoryError> {
        Err(RepositoryError::Unavailable("disk full".to_string()))
    }

    fn owned_by(&self, _owner: &UserId) -> Result<Vec<Listing>, RepositoryError> {
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

pub(super) fn routes_with<R>(
    service: ListingService<R>,
    provider: Arc<LocalIdentityProvider>,
) -> ListingRoutes<R> {
    ListingRoutes {
        service: Arc::new(service),
        guard: SessionGuard::new(provider),
    }
}

pub(super) fn router_with(
    service: ListingService<MemoryRepository>,
    provider: Arc<LocalIdentityProvider>,
) -> axum::Router {
    listing_router(routes_with(service, provider))
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
