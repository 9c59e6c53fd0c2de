//! Listing and booking workflows, plus the router that stitches them to the identity surface.

pub mod bookings;
pub mod listings;

use std::sync::Arc;

use axum::response::Redirect;
use axum::routing::get;
use axum::Router;

use crate::identity::{identity_router, IdentityProvider, IdentityRoutes, SessionGuard};
use bookings::{booking_router, BookingRepository, BookingRoutes, BookingService};
use listings::{listing_router, ListingRepository, ListingRoutes, ListingService};

pub const LANDING_PATH: &str = "/api/v1/listings";

/// Services sharing one identity provider and one listing repository.
pub struct Marketplace<L, B> {
    pub identity: Arc<dyn IdentityProvider>,
    pub listings: Arc<ListingService<L>>,
    pub bookings: Arc<BookingService<L, B>>,
}

impl<L, B> Marketplace<L, B>
where
    L: ListingRepository + 'static,
    B: BookingRepository + 'static,
{
    pub fn new(identity: Arc<dyn IdentityProvider>, listings: Arc<L>, bookings: Arc<B>) -> Self {
        Self {
            identity,
            listings: Arc::new(ListingService::new(listings.clone())),
            bookings: Arc::new(BookingService::new(listings, bookings)),
        }
    }

    pub fn guard(&self) -> SessionGuard {
        SessionGuard::new(self.identity.clone())
    }

    /// Every marketplace route. `/` lands on the public browse view.
    pub fn router(&self, expose_verification_codes: bool) -> Router {
        let guard = self.guard();

        Router::new()
            .route("/", get(|| async { Redirect::to(LANDING_PATH) }))
            .merge(identity_router(IdentityRoutes::new(
                self.identity.clone(),
                expose_verification_codes,
            )))
            .merge(listing_router(ListingRoutes {
                service: self.listings.clone(),
                guard: guard.clone(),
            }))
            .merge(booking_router(BookingRoutes {
                service: self.bookings.clone(),
                guard,
            }))
    }
}
