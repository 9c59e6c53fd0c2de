use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::domain::{Role, Session, SessionToken};
use super::provider::IdentityProvider;

pub const LOGIN_PATH: &str = "/auth/login";

/// Access check run in front of every protected route.
#[derive(Clone)]
pub struct SessionGuard {
    provider: Arc<dyn IdentityProvider>,
}

impl SessionGuard {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Pass with the active session, or redirect to login. Provider failures also redirect.
    pub fn check(
        &self,
        token: Option<&SessionToken>,
        required: Option<Role>,
    ) -> Result<Session, GuardRedirect> {
        let token = token.ok_or_else(|| GuardRedirect::new(RedirectReason::MissingSession))?;

        let session = match self.provider.resolve(token) {
            Ok(Some(session)) => session,
            Ok(None) => return Err(GuardRedirect::new(RedirectReason::UnknownSession)),
            Err(err) => {
                warn!(error = %err, "session lookup failed");
                return Err(GuardRedirect::new(RedirectReason::ProviderUnavailable));
            }
        };

        match required {
            Some(role) if session.role() != role => {
                Err(GuardRedirect::new(RedirectReason::RoleMismatch {
                    required: role,
                    actual: session.role(),
                }))
            }
            _ => Ok(session),
        }
    }

    pub fn check_headers(
        &self,
        headers: &HeaderMap,
        required: Option<Role>,
    ) -> Result<Session, GuardRedirect> {
        let token = bearer_token(headers);
        self.check(token.as_ref(), required)
    }
}

/// Extract `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| SessionToken(token.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RedirectReason {
    MissingSession,
    UnknownSession,
    RoleMismatch { required: Role, actual: Role },
    ProviderUnavailable,
}

/// Guard failure. Always rendered as a redirect to the login surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRedirect {
    pub reason: RedirectReason,
}

impl GuardRedirect {
    fn new(reason: RedirectReason) -> Self {
        Self { reason }
    }

    pub fn location(&self) -> &'static str {
        LOGIN_PATH
    }
}

impl IntoResponse for GuardRedirect {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "redirect": LOGIN_PATH,
            "detail": self.reason,
        }));
        (StatusCode::SEE_OTHER, [(header::LOCATION, LOGIN_PATH)], body).into_response()
    }
}
