//! Accounts, sessions and the access guard.
//!
//! Credential handling belongs to an [`IdentityProvider`]; the rest of the crate only ever sees
//! a resolved [`Session`] whose account carries the caller's [`Role`].

pub mod domain;
pub mod guard;
pub mod provider;
pub mod router;

pub use domain::{
    AuthEvent, Credentials, Registration, RegistrationRequest, Role, Session, SessionToken,
    UserAccount, UserId,
};
pub use guard::{bearer_token, GuardRedirect, RedirectReason, SessionGuard, LOGIN_PATH};
pub use provider::{IdentityError, IdentityProvider, LocalIdentityProvider, StoredAccount};
pub use router::{identity_router, IdentityRoutes};
