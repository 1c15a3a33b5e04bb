//! Request and response bodies exchanged with Supabase.

use chantier_core::{AuthSession, AuthUser};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct PasswordCredentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl TokenResponse {
    pub fn into_session(self, now: i64) -> AuthSession {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now.saturating_add(secs)));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Sign-up returns a session when e-mail confirmation is off, a bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

#[derive(Debug, Serialize)]
pub(crate) struct SortBy {
    pub column: &'static str,
    pub order: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListRequest<'a> {
    pub prefix: &'a str,
    pub limit: usize,
    pub offset: usize,
    #[serde(rename = "sortBy")]
    pub sort_by: SortBy,
    pub search: &'a str,
}

/// Entry returned by the storage list endpoint.
///
/// Folders come back as entries without an `id`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageObject {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl StorageObject {
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SignRequest<'a> {
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
    pub paths: &'a [String],
}

/// One entry of a batched signed-URL response. `signed_url` is relative to `/storage/v1`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignedUrl {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(rename = "signedURL", default)]
    pub signed_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(rename = "Key", default)]
    pub key: Option<String>,
}

/// Result of the auth health probe. Any HTTP answer means the host is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: u16,
}

impl HealthStatus {
    /// 2xx, or the 401 an unauthenticated probe usually gets.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(self.status, 200..=299 | 401)
    }
}
