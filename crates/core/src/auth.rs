//! Authenticated user and token pair, as returned by the hosted auth service.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    /// Label shown in the "Connecté" line.
    #[must_use]
    pub fn label(&self) -> &str {
        self.email.as_deref().unwrap_or("compte")
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

impl AuthSession {
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// True once `now` is within `leeway` seconds of the expiry.
    #[must_use]
    pub fn is_expired(&self, now: i64, leeway: i64) -> bool {
        self.expires_at.is_some_and(|exp| now.saturating_add(leeway) >= exp)
    }
}
