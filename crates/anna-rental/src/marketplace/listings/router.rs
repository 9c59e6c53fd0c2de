use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{Listing, ListingForm, ListingId, ListingSummary};
use super::editor::ListingDraft;
use super::repository::ListingRepository;
use super::service::{ListingCounts, ListingService, ListingServiceError};
use super::search::SearchCriteria;
use crate::error::rejection_response;
use crate::identity::{Role, SessionGuard};

pub const LANDLORD_LISTINGS_PATH: &str = "/dashboard/landlord/listings";

pub struct ListingRoutes<R> {
    pub service: Arc<ListingService<R>>,
    pub guard: SessionGuard,
}

impl<R> Clone for ListingRoutes<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            guard: self.guard.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewRequest {
    #[serde(default)]
    pub(crate) listing_id: Option<ListingId>,
    #[serde(default)]
    pub(crate) form: ListingForm,
}

/// Public browse/search endpoints plus the landlord's listing management.
pub fn listing_router<R>(routes: ListingRoutes<R>) -> Router
where
    R: ListingRepository + 'static,
{
    Router::new()
        .route("/api/v1/listings", get(browse_handler::<R>))
        .route("/api/v1/listings/search", post(search_handler::<R>))
        .route("/api/v1/listings/:listing_id", get(detail_handler::<R>))
        .route(
            "/api/v1/landlord/listings",
            get(landlord_listings_handler::<R>).post(publish_handler::<R>),
        )
        .route(
            "/api/v1/landlord/listings/preview",
            post(preview_handler::<R>),
        )
        .route(
            "/api/v1/landlord/listings/:listing_id",
            put(update_handler::<R>).delete(delete_handler::<R>),
        )
        .route(
            "/api/v1/landlord/listings/:listing_id/draft",
            get(draft_handler::<R>),
        )
        .route(
            "/api/v1/landlord/listings/:listing_id/status",
            post(toggle_status_handler::<R>),
        )
        .route("/api/v1/dashboard/landlord", get(dashboard_handler::<R>))
        .with_state(routes)
}

fn summaries(listings: &[Listing]) -> Vec<ListingSummary> {
    listings.iter().map(Listing::summary).collect()
}

pub(crate) async fn browse_handler<R>(State(routes): State<ListingRoutes<R>>) -> Response
where
    R: ListingRepository + 'static,
{
    match routes.service.browse() {
        Ok(listings) => {
            let payload = json!({ "listings": summaries(&listings) });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn search_handler<R>(
    State(routes): State<ListingRoutes<R>>,
    criteria: Result<Json<SearchCriteria>, JsonRejection>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let Json(criteria) = match criteria {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };

    match routes.service.search(&criteria) {
        Ok(listings) => {
            let payload = json!({
                "criteria": criteria,
                "count": listings.len(),
                "listings": summaries(&listings),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn detail_handler<R>(
    State(routes): State<ListingRoutes<R>>,
    listing_id: Result<Path<ListingId>, PathRejection>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let Path(listing_id) = match listing_id {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };

    match routes.service.get(&listing_id) {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn landlord_listings_handler<R>(
    State(routes): State<ListingRoutes<R>>,
    headers: HeaderMap,
) -> Response
where
    R: ListingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Landlord)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };

    match routes.service.listings_for(session.user_id()) {
        Ok(listings) => (StatusCode::OK, Json(json!({ "listings": listings }))).into_response(),
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn preview_handler<R>(
    State(routes): State<ListingRoutes<R>>,
    headers: HeaderMap,
    request: Result<Json<PreviewRequest>, JsonRejection>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Landlord)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };
    let Json(request) = match request {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };

    let draft = match &request.listing_id {
        Some(listing_id) => match routes.service.draft_for_edit(session.user_id(), listing_id) {
            Ok(draft) => draft.with_form(request.form),
            Err(err) => return listing_error_response(err),
        },
        None => ListingDraft::new(request.form),
    };

    match routes.service.preview(draft) {
        Ok(preview) => {
            let payload = json!({ "stage": preview.stage(), "preview": preview });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn publish_handler<R>(
    State(routes): State<ListingRoutes<R>>,
    headers: HeaderMap,
    form: Result<Json<ListingForm>, JsonRejection>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Landlord)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };
    let Json(form) = match form {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };

    match routes.service.publish(session.user_id(), form, Utc::now()) {
        Ok(listing) => {
            let payload = json!({
                "stage": super::editor::EditorStage::Published,
                "message": "Listing published!",
                "redirect": LANDLORD_LISTINGS_PATH,
                "listing": listing,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn draft_handler<R>(
    State(routes): State<ListingRoutes<R>>,
    headers: HeaderMap,
    listing_id: Result<Path<ListingId>, PathRejection>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Landlord)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };
    let Path(listing_id) = match listing_id {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };

    match routes.service.draft_for_edit(session.user_id(), &listing_id) {
        Ok(draft) => {
            let payload = json!({
                "stage": draft.stage(),
                "listing_id": draft.target(),
                "form": draft.form(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn update_handler<R>(
    State(routes): State<ListingRoutes<R>>,
    headers: HeaderMap,
    listing_id: Result<Path<ListingId>, PathRejection>,
    form: Result<Json<ListingForm>, JsonRejection>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Landlord)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };
    let Path(listing_id) = match listing_id {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    let Json(form) = match form {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };

    match routes
        .service
        .update(session.user_id(), &listing_id, form, Utc::now())
    {
        Ok(listing) => {
            let payload = json!({
                "stage": super::editor::EditorStage::Published,
                "message": "Listing updated!",
                "redirect": LANDLORD_LISTINGS_PATH,
                "listing": listing,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn delete_handler<R>(
    State(routes): State<ListingRoutes<R>>,
    headers: HeaderMap,
    listing_id: Result<Path<ListingId>, PathRejection>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Landlord)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };
    let Path(listing_id) = match listing_id {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };

    match routes.service.delete(session.user_id(), &listing_id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn toggle_status_handler<R>(
    State(routes): State<ListingRoutes<R>>,
    headers: HeaderMap,
    listing_id: Result<Path<ListingId>, PathRejection>,
) -> Response
where
    R: ListingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Landlord)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };
    let Path(listing_id) = match listing_id {
        Ok(extracted) => extracted,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };

    match routes.service.toggle_status(session.user_id(), &listing_id) {
        Ok(listing) => (StatusCode::OK, Json(json!({ "listing": listing }))).into_response(),
        Err(err) => listing_error_response(err),
    }
}

pub(crate) async fn dashboard_handler<R>(
    State(routes): State<ListingRoutes<R>>,
    headers: HeaderMap,
) -> Response
where
    R: ListingRepository + 'static,
{
    let session = match routes.guard.check_headers(&headers, Some(Role::Landlord)) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };

    match routes.service.listings_for(session.user_id()) {
        Ok(listings) => {
            let payload = json!({
                "message": session.role().greeting(),
                "email": session.account.email,
                "listings": ListingCounts::tally(&listings),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => listing_error_response(err),
    }
}

pub(crate) fn listing_error_response(err: ListingServiceError) -> Response {
    let status = match &err {
        ListingServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ListingServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ListingServiceError::NotOwner(_) => StatusCode::FORBIDDEN,
        ListingServiceError::Repository(source) => {
            error!(error = %source, "listing repository failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
