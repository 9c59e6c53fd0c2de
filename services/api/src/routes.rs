use std::sync::atomic::Ordering;

use crate::infra::AppState;
use anna_rental::marketplace::bookings::BookingRepository;
use anna_rental::marketplace::listings::ListingRepository;
use anna_rental::marketplace::Marketplace;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};
use serde_json::json;

/// Marketplace routes plus the operational endpoints.
pub(crate) fn with_marketplace_routes<L, B>(
    marketplace: &Marketplace<L, B>,
    expose_verification_codes: bool,
) -> axum::Router
where
    L: ListingRepository + 'static,
    B: BookingRepository + 'static,
{
    marketplace
        .router(expose_verification_codes)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
