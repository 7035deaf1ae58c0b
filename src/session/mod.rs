//! Signed-in identity tracking.
//!
//! The identity provider is authoritative for who the user is; this module
//! only holds the outcome of a sign-in. A [`Session`] is an explicit,
//! read-only value created on successful sign-in and passed by reference to
//! every gated operation — there is no global current-user state. Sign-out
//! drops the session locally and nothing else.

pub mod provider;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

pub use provider::{create_provider, HttpIdentityProvider, IdentityProvider, StaticIdentityProvider};

use crate::error::Error;
use crate::store::{Store, UserId, UserRecord};

/// Sign-in failures. The session holder reports these and keeps whatever
/// session existed before the attempt.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("sign-in rejected: {0}")]
    Rejected(String),

    #[error("identity provider unreachable: {0}")]
    Transport(String),

    #[error("malformed identity provider response: {0}")]
    InvalidResponse(String),
}

/// Profile of the signed-in user, as issued by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub photo_url: String,
}

impl AuthUser {
    fn to_record(&self) -> UserRecord {
        UserRecord {
            name: self.display_name.clone(),
            email: self.email.clone(),
            photo_url: self.photo_url.clone(),
        }
    }
}

/// A signed-in session. Read-only; created by [`SessionManager::sign_in`]
/// and dropped by [`SessionManager::sign_out`].
#[derive(Debug, Clone)]
pub struct Session {
    user: AuthUser,
    started_at: DateTime<Utc>,
}

impl Session {
    fn new(user: AuthUser) -> Self {
        Self {
            user,
            started_at: Utc::now(),
        }
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Owns the identity provider and the current session, and gates everything
/// else on it.
pub struct SessionManager {
    provider: Box<dyn IdentityProvider>,
    store: Arc<Store>,
    current: Option<Session>,
}

impl SessionManager {
    pub fn new(provider: Box<dyn IdentityProvider>, store: Arc<Store>) -> Self {
        Self {
            provider,
            store,
            current: None,
        }
    }

    /// Run the provider's sign-in exchange and open a session.
    ///
    /// On the user's first sign-in ever, their profile record is written to
    /// the `users` collection; later sign-ins leave the existing record
    /// untouched. A failed sign-in changes nothing locally.
    pub fn sign_in(&mut self) -> Result<&Session, Error> {
        let user = self.provider.sign_in()?;

        if self.store.user(&user.id)?.is_none() {
            self.store.put_user(&user.id, &user.to_record())?;
            tracing::info!(user = %user.id, "created profile record on first sign-in");
        }

        tracing::info!(
            user = %user.id,
            provider = self.provider.provider_name(),
            "signed in"
        );
        Ok(self.current.insert(Session::new(user)))
    }

    /// Drop the current session. Local state only; the provider is not
    /// contacted.
    pub fn sign_out(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!(user = %session.user_id(), "signed out");
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The current session, or `Error::NotSignedIn`.
    pub fn session(&self) -> Result<&Session, Error> {
        self.current.as_ref().ok_or(Error::NotSignedIn)
    }
}
