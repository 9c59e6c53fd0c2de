use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::provider::IdentityError;

/// Identifier assigned by the identity provider to every account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which side of the marketplace an account acts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Tenant,
    Landlord,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Tenant => "tenant",
            Role::Landlord => "landlord",
        }
    }

    /// Landing page after sign-in.
    pub const fn dashboard_path(self) -> &'static str {
        match self {
            Role::Tenant => "/dashboard/tenant",
            Role::Landlord => "/dashboard/landlord",
        }
    }

    pub const fn greeting(self) -> &'static str {
        match self {
            Role::Tenant => "Welcome, Tenant!",
            Role::Landlord => "Welcome, Landlord!",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Account as exposed by the provider. The role travels with the account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Opaque bearer credential handed out on sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: SessionToken,
    pub account: UserAccount,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn user_id(&self) -> &UserId {
        &self.account.id
    }

    pub fn role(&self) -> Role {
        self.account.role
    }
}

/// Input collected by the registration surface.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub role: Role,
}

impl RegistrationRequest {
    /// Form-level checks that happen before the provider is involved.
    pub fn confirm_password(&self) -> Result<(), IdentityError> {
        if self.password != self.confirm_password {
            return Err(IdentityError::PasswordMismatch);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Newly created, still unverified account plus the code that verifies it.
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: UserAccount,
    pub verification_code: String,
}

/// Auth-state changes broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    Registered { user_id: UserId, role: Role },
    EmailVerified { user_id: UserId },
    SignedIn { user_id: UserId },
    SignedOut { user_id: UserId },
}
