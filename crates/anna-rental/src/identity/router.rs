use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::domain::{Credentials, RegistrationRequest};
use super::guard::{bearer_token, SessionGuard};
use super::provider::{IdentityError, IdentityProvider};
use crate::error::rejection_response;

#[derive(Clone)]
pub struct IdentityRoutes {
    provider: Arc<dyn IdentityProvider>,
    guard: SessionGuard,
    expose_verification_codes: bool,
}

impl IdentityRoutes {
    pub fn new(provider: Arc<dyn IdentityProvider>, expose_verification_codes: bool) -> Self {
        let guard = SessionGuard::new(provider.clone());
        Self {
            provider,
            guard,
            expose_verification_codes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerificationRequest {
    pub(crate) code: String,
}

/// Registration, verification, sign-in and sign-out endpoints.
pub fn identity_router(routes: IdentityRoutes) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(register_handler))
        .route("/api/v1/auth/verify", post(verify_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/auth/logout", post(logout_handler))
        .route("/api/v1/auth/session", get(session_handler))
        .with_state(routes)
}

pub(crate) async fn register_handler(
    State(routes): State<IdentityRoutes>,
    body: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    if let Err(err) = request.confirm_password() {
        return identity_error_response(err);
    }

    match routes
        .provider
        .register(&request.email, &request.password, request.role)
    {
        Ok(registration) => {
            info!(user_id = %registration.account.id, role = %registration.account.role, "account registered");
            let mut payload = json!({
                "account": registration.account,
                "message": "Registration successful! Please check your email to verify your account.",
                "redirect": super::guard::LOGIN_PATH,
            });
            if routes.expose_verification_codes {
                payload["verification_code"] = json!(registration.verification_code);
            }
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => identity_error_response(err),
    }
}

pub(crate) async fn verify_handler(
    State(routes): State<IdentityRoutes>,
    body: Result<Json<VerificationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    match routes.provider.verify_email(&request.code) {
        Ok(account) => (StatusCode::OK, Json(json!({ "account": account }))).into_response(),
        Err(err) => identity_error_response(err),
    }
}

pub(crate) async fn login_handler(
    State(routes): State<IdentityRoutes>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Response {
    let Json(credentials) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection.status(), rejection.body_text()),
    };
    match routes.provider.sign_in(&credentials) {
        Ok(session) => {
            let payload = json!({
                "token": session.token,
                "expires_at": session.expires_at,
                "account": session.account,
                "redirect": session.role().dashboard_path(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => identity_error_response(err),
    }
}

pub(crate) async fn logout_handler(
    State(routes): State<IdentityRoutes>,
    headers: HeaderMap,
) -> Response {
    let session = match routes.guard.check_headers(&headers, None) {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };

    match routes.provider.sign_out(&session.token) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => identity_error_response(err),
    }
}

pub(crate) async fn session_handler(
    State(routes): State<IdentityRoutes>,
    headers: HeaderMap,
) -> Response {
    match routes
        .guard
        .check(bearer_token(&headers).as_ref(), None)
    {
        Ok(session) => {
            let payload = json!({
                "account": session.account,
                "expires_at": session.expires_at,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(redirect) => redirect.into_response(),
    }
}

pub(crate) fn identity_error_response(err: IdentityError) -> Response {
    let status = match &err {
        IdentityError::PasswordMismatch
        | IdentityError::InvalidEmail
        | IdentityError::WeakPassword { .. }
        | IdentityError::UnknownVerificationCode => StatusCode::UNPROCESSABLE_ENTITY,
        IdentityError::EmailInUse => StatusCode::CONFLICT,
        IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        IdentityError::EmailNotVerified => StatusCode::FORBIDDEN,
        IdentityError::Hashing(_)
        | IdentityError::Unavailable(_)
        | IdentityError::Storage(_) => {
            warn!(error = %err, "identity provider failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
