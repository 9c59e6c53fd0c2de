use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use super::domain::{BookingId, BookingRequest};
use super::repository::BookingRepository;
use super::service::{BookingService, BookingServiceError};
use crate::error::rejection_response;
use crate::identity::{Role, SessionGuard};
use crate::marketplace::listings::{ListingId, ListingRepository};

pub const TENANT_BOOKINGS_PATH: &str = "/dashboard/tenant/bookings";

pub struct BookingRoutes<L, B> {
    pub service: Arc<BookingService<L, B>>,
    pub guard: SessionGuard,
}

impl<L, B> Clone for BookingRoutes<L, B> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            guard: self.guard.clone(),
        }
    }
}

/// Tenant booking flow: book a listing, review upcoming/past stays, cancel.
pub fn booking_router<L, B>(routes: BookingRoutes<L, B>) -> Router
where
    L: ListingRepository + 'static,
    B: BookingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/listings/:listing_id/bookings",
            post(book_handler::<L, B>),
        )
        .route("/api/v1/tenant/bookings", get(bookings_handler::<L, B>))
        .route(
            "/api/v1/tenant/bookings/:booking_id",
            delete(cancel_handler::<L, B>),
        )
        .route("/api/v1/dashboard/tenant", get(dashboard_handler::<L, B>))
        .with_state(routes)
}

pub(crate) async fn book_handler<L, B>(
    State(routes): State<BookingRoutes<L, B>>,
    headers: HeaderMap,
    listing_id: Result<Path<ListingId>, PathRejection>,
    request: Result<Json<BookingRequest>, JsonRejection>,
) -> Response
where
    L: ListingRepository + 'static,
    B: BookingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Tenant)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };
    let Path(listing_id) = match listing_id {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    let Json(request) = match request {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };

    match routes
        .service
        .book(session.user_id(), &listing_id, &request, Utc::now())
    {
        Ok(booking) => {
            let payload = json!({
                "message": "Booking confirmed!",
                "redirect": TENANT_BOOKINGS_PATH,
                "booking": booking,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => booking_error_response(err),
    }
}

pub(crate) async fn bookings_handler<L, B>(
    State(routes): State<BookingRoutes<L, B>>,
    headers: HeaderMap,
) -> Response
where
    L: ListingRepository + 'static,
    B: BookingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Tenant)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };

    let today = Utc::now().date_naive();
    match routes.service.bookings_for(session.user_id(), today) {
        Ok(partition) => (StatusCode::OK, Json(partition)).into_response(),
        Err(err) => booking_error_response(err),
    }
}

pub(crate) async fn cancel_handler<L, B>(
    State(routes): State<BookingRoutes<L, B>>,
    headers: HeaderMap,
    booking_id: Result<Path<BookingId>, PathRejection>,
) -> Response
where
    L: ListingRepository + 'static,
    B: BookingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Tenant)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };
    let Path(booking_id) = match booking_id {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };

    match routes.service.cancel(session.user_id(), &booking_id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => booking_error_response(err),
    }
}

pub(crate) async fn dashboard_handler<L, B>(
    State(routes): State<BookingRoutes<L, B>>,
    headers: HeaderMap,
) -> Response
where
    L: ListingRepository + 'static,
    B: BookingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Tenant)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };

    let today = Utc::now().date_naive();
    match routes.service.bookings_for(session.user_id(), today) {
        Ok(partition) => {
            let payload = json!({
                "message": session.role().greeting(),
                "email": session.account.email,
                "bookings": partition.counts(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => booking_error_response(err),
    }
}

pub(crate) fn booking_error_response(err: BookingServiceError) -> Response {
    let status = match &err {
        BookingServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BookingServiceError::ListingNotFound(_) | BookingServiceError::NotFound(_) => {
            StatusCode::NOT_FOUND
        }
        BookingServiceError::ListingPaused(_) => StatusCode::CONFLICT,
        BookingServiceError::NotOwner(_) => StatusCode::FORBIDDEN,
        BookingServiceError::Repository(source) => {
            error!(error = %source, "booking repository failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
