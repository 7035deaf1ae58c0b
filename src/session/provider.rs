//! Identity provider backends.
//!
//! Sign-in is an interactive exchange owned by the hosted provider; this
//! crate only sees its outcome — a profile or a rejection. The HTTP provider
//! exchanges the configured long-lived credential for a profile; the static
//! provider serves tests and local development.

use serde::Deserialize;

use super::{AuthError, AuthUser};
use crate::config::AuthConfig;
use crate::store::UserId;

/// Trait for identity providers that can establish who the user is.
pub trait IdentityProvider: Send + Sync {
    /// Run the sign-in exchange and return the signed-in profile.
    fn sign_in(&self) -> Result<AuthUser, AuthError>;

    /// Get the provider name for display.
    fn provider_name(&self) -> &'static str;
}

/// Create a provider from configuration.
pub fn create_provider(config: &AuthConfig) -> Box<dyn IdentityProvider> {
    Box::new(HttpIdentityProvider::new(config))
}

// ============================================================================
// HTTP provider
// ============================================================================

pub struct HttpIdentityProvider {
    agent: ureq::Agent,
    endpoint: String,
    api_key: Option<String>,
    credential: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    id: String,

    #[serde(rename = "displayName", default)]
    display_name: String,

    #[serde(default)]
    email: String,

    #[serde(rename = "photoURL", default)]
    photo_url: String,
}

impl HttpIdentityProvider {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            agent: ureq::Agent::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            credential: config.credential.clone(),
        }
    }
}

impl IdentityProvider for HttpIdentityProvider {
    fn sign_in(&self) -> Result<AuthUser, AuthError> {
        let credential = self
            .credential
            .as_deref()
            .ok_or_else(|| AuthError::Rejected("no credential configured".to_string()))?;

        let mut request = self.agent.post(&format!("{}/token", self.endpoint));
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }

        let response = request
            .send_json(serde_json::json!({ "credential": credential }))
            .map_err(|e| match e {
                ureq::Error::Status(401 | 403, _) => {
                    AuthError::Rejected("provider refused the credential".to_string())
                }
                ureq::Error::Status(code, _) => AuthError::Transport(format!("status {code}")),
                ureq::Error::Transport(t) => AuthError::Transport(t.to_string()),
            })?;

        let profile: ProfileResponse = response
            .into_json()
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        Ok(AuthUser {
            id: UserId::new(profile.id),
            display_name: profile.display_name,
            email: profile.email,
            photo_url: profile.photo_url,
        })
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

// ============================================================================
// Static provider
// ============================================================================

/// Provider that answers every sign-in with a fixed profile, or with a
/// rejection. For tests and local development.
pub struct StaticIdentityProvider {
    outcome: Result<AuthUser, String>,
}

impl StaticIdentityProvider {
    pub fn new(user: AuthUser) -> Self {
        Self { outcome: Ok(user) }
    }

    /// Provider that rejects every sign-in attempt.
    pub fn denied(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
        }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn sign_in(&self) -> Result<AuthUser, AuthError> {
        match &self.outcome {
            Ok(user) => Ok(user.clone()),
            Err(reason) => Err(AuthError::Rejected(reason.clone())),
        }
    }

    fn provider_name(&self) -> &'static str {
        "static"
    }
}
