use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::domain::{
    AuthEvent, Credentials, Registration, Role, Session, SessionToken, UserAccount, UserId,
};
use crate::config::IdentityConfig;
use crate::storage::{AccountStore, JsonCollection, RepositoryError, StoredRecord};

pub const MIN_PASSWORD_LENGTH: usize = 6;
const EVENT_CAPACITY: usize = 64;

/// Boundary to the service that owns accounts, passwords and sessions.
pub trait IdentityProvider: Send + Sync {
    fn register(&self, email: &str, password: &str, role: Role)
        -> Result<Registration, IdentityError>;
    fn verify_email(&self, code: &str) -> Result<UserAccount, IdentityError>;
    fn sign_in(&self, credentials: &Credentials) -> Result<Session, IdentityError>;
    fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityError>;
    fn resolve(&self, token: &SessionToken) -> Result<Option<Session>, IdentityError>;
    /// Auth-state change notifications. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("email address is badly formatted")]
    InvalidEmail,
    #[error("password should be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("email address is already in use")]
    EmailInUse,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("please verify your email before logging in")]
    EmailNotVerified,
    #[error("verification code is invalid or already used")]
    UnknownVerificationCode,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Account as persisted: the public record, its argon2 hash and, until the address is
/// verified, the outstanding verification code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAccount {
    pub account: UserAccount,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
}

impl StoredRecord for StoredAccount {
    type Key = UserId;

    fn key(&self) -> UserId {
        self.account.id.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.account.created_at
    }
}

struct SessionRecord {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

/// Lookup indexes over the account store plus the live sessions.
#[derive(Default)]
struct IdentityState {
    by_email: HashMap<String, UserId>,
    pending_verifications: HashMap<String, UserId>,
    sessions: HashMap<SessionToken, SessionRecord>,
}

impl IdentityState {
    fn indexed(accounts: &[StoredAccount]) -> Self {
        let mut state = Self::default();
        for stored in accounts {
            let id = &stored.account.id;
            state
                .by_email
                .insert(stored.account.email.clone(), id.clone());
            if let Some(code) = &stored.verification_code {
                state.pending_verifications.insert(code.clone(), id.clone());
            }
        }
        state
    }
}

/// Provider run inside the service process. Accounts live in an [`AccountStore`]; sessions are
/// held in memory and end with the process.
pub struct LocalIdentityProvider {
    state: Mutex<IdentityState>,
    accounts: AccountStore,
    events: broadcast::Sender<AuthEvent>,
    session_ttl: Duration,
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new(&IdentityConfig::default())
    }
}

impl LocalIdentityProvider {
    /// Provider whose accounts are kept only for the lifetime of the process.
    pub fn new(config: &IdentityConfig) -> Self {
        Self::assemble(config, JsonCollection::in_memory(), IdentityState::default())
    }

    /// Provider over `accounts`, picking up every account the store already holds.
    pub fn with_store(
        config: &IdentityConfig,
        accounts: AccountStore,
    ) -> Result<Self, IdentityError> {
        let state = IdentityState::indexed(&accounts.all()?);
        Ok(Self::assemble(config, accounts, state))
    }

    fn assemble(config: &IdentityConfig, accounts: AccountStore, state: IdentityState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(state),
            accounts,
            events,
            session_ttl: config.session_ttl,
        }
    }

    pub fn sign_in_at(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<Session, IdentityError> {
        let email = normalize_email(&credentials.email);
        let user_id = self
            .lock()?
            .by_email
            .get(&email)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;
        let stored = self
            .accounts
            .fetch(&user_id)?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !verify_password(&credentials.password, &stored.password_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }
        if !stored.account.email_verified {
            return Err(IdentityError::EmailNotVerified);
        }

        let account = stored.account;
        let token = SessionToken::generate();
        let expires_at = now + self.session_ttl;
        {
            let mut state = self.lock()?;
            state.sessions.retain(|_, record| record.expires_at > now);
            state.sessions.insert(
                token.clone(),
                SessionRecord {
                    user_id: account.id.clone(),
                    expires_at,
                },
            );
        }

        self.emit(AuthEvent::SignedIn {
            user_id: account.id.clone(),
        });

        Ok(Session {
            token,
            account,
            expires_at,
        })
    }

    pub fn resolve_at(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, IdentityError> {
        let (user_id, expires_at) = {
            let mut state = self.lock()?;
            let (user_id, expires_at) = match state.sessions.get(token) {
                Some(record) => (record.user_id.clone(), record.expires_at),
                None => return Ok(None),
            };
            if expires_at <= now {
                state.sessions.remove(token);
                return Ok(None);
            }
            (user_id, expires_at)
        };

        let account = self.accounts.fetch(&user_id)?.map(|stored| stored.account);

        Ok(account.map(|account| Session {
            token: token.clone(),
            account,
            expires_at,
        }))
    }

    fn lock(&self) -> Result<MutexGuard<'_, IdentityState>, IdentityError> {
        self.state
            .lock()
            .map_err(|_| IdentityError::Unavailable("identity state lock poisoned".to_string()))
    }

    fn emit(&self, event: AuthEvent) {
        // Sending only fails when nobody is subscribed.
        let _ = self.events.send(event);
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn register(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Registration, IdentityError> {
        let email = normalize_email(email);
        if !looks_like_email(&email) {
            return Err(IdentityError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(IdentityError::WeakPassword {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        if self.lock()?.by_email.contains_key(&email) {
            return Err(IdentityError::EmailInUse);
        }

        let password_hash = hash_password(password)?;

        let account = UserAccount {
            id: UserId::generate(),
            email: email.clone(),
            role,
            email_verified: false,
            created_at: Utc::now(),
        };
        let verification_code = Uuid::new_v4().simple().to_string();

        {
            // Held across the store write so two registrations cannot claim one address.
            let mut state = self.lock()?;
            if state.by_email.contains_key(&email) {
                return Err(IdentityError::EmailInUse);
            }
            self.accounts.insert(StoredAccount {
                account: account.clone(),
                password_hash,
                verification_code: Some(verification_code.clone()),
            })?;
            state.by_email.insert(email, account.id.clone());
            state
                .pending_verifications
                .insert(verification_code.clone(), account.id.clone());
        }

        self.emit(AuthEvent::Registered {
            user_id: account.id.clone(),
            role,
        });

        Ok(Registration {
            account,
            verification_code,
        })
    }

    fn verify_email(&self, code: &str) -> Result<UserAccount, IdentityError> {
        let code = code.trim();
        let account = {
            let mut state = self.lock()?;
            let user_id = state
                .pending_verifications
                .get(code)
                .cloned()
                .ok_or(IdentityError::UnknownVerificationCode)?;
            let mut stored = self
                .accounts
                .fetch(&user_id)?
                .ok_or(IdentityError::UnknownVerificationCode)?;
            stored.account.email_verified = true;
            stored.verification_code = None;
            self.accounts.replace(stored.clone())?;
            state.pending_verifications.remove(code);
            stored.account
        };

        self.emit(AuthEvent::EmailVerified {
            user_id: account.id.clone(),
        });
        Ok(account)
    }

    fn sign_in(&self, credentials: &Credentials) -> Result<Session, IdentityError> {
        self.sign_in_at(credentials, Utc::now())
    }

    fn sign_out(&self, token: &SessionToken) -> Result<(), IdentityError> {
        let removed = self.lock()?.sessions.remove(token);
        if let Some(record) = removed {
            self.emit(AuthEvent::SignedOut {
                user_id: record.user_id,
            });
        }
        Ok(())
    }

    fn resolve(&self, token: &SessionToken) -> Result<Option<Session>, IdentityError> {
        self.resolve_at(token, Utc::now())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| IdentityError::Hashing(err.to_string()))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, IdentityError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|err| IdentityError::Hashing(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
