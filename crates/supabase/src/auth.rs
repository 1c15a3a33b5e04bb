//! Password authentication against `/auth/v1`.

use chantier_core::{AuthSession, AuthUser};
use reqwest::Method;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;
use crate::wire::{HealthStatus, PasswordCredentials, RefreshRequest, SignUpResponse, TokenResponse};

/// Result of a sign-up: immediate session, or an account waiting for e-mail confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    Session(AuthSession),
    ConfirmationRequired(AuthUser),
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl SupabaseClient {
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let mut url = self.endpoint(&["auth/v1/token"])?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let request = self
            .request(Method::POST, url, None)
            .json(&PasswordCredentials { email, password });
        let response = self.send(request).await?;
        let token: TokenResponse = Self::parse_json(response, "password sign-in").await?;
        tracing::info!(user_id = %token.user.id, "signed in");
        Ok(token.into_session(now()))
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, SupabaseError> {
        let url = self.endpoint(&["auth/v1/signup"])?;
        let request = self
            .request(Method::POST, url, None)
            .json(&PasswordCredentials { email, password });
        let response = self.send(request).await?;
        let outcome = match Self::parse_json::<SignUpResponse>(response, "sign-up").await? {
            SignUpResponse::Session(token) => SignUpOutcome::Session(token.into_session(now())),
            SignUpResponse::User(user) => SignUpOutcome::ConfirmationRequired(user),
        };
        tracing::info!(confirmed = matches!(outcome, SignUpOutcome::Session(_)), "signed up");
        Ok(outcome)
    }

    /// Current user behind an access token.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let url = self.endpoint(&["auth/v1/user"])?;
        let response = self
            .send_idempotent("get user", || self.request(Method::GET, url.clone(), Some(access_token)))
            .await?;
        Self::parse_json(response, "user").await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError> {
        let mut url = self.endpoint(&["auth/v1/token"])?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");
        let request = self
            .request(Method::POST, url, None)
            .json(&RefreshRequest { refresh_token });
        let response = self.send(request).await?;
        let token: TokenResponse = Self::parse_json(response, "token refresh").await?;
        tracing::debug!(user_id = %token.user.id, "session refreshed");
        Ok(token.into_session(now()))
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let url = self.endpoint(&["auth/v1/logout"])?;
        self.send(self.request(Method::POST, url, Some(access_token))).await?;
        Ok(())
    }

    /// Probe `/auth/v1/health`, falling back to `/auth/v1/user`.
    ///
    /// Only transport failures are errors; any HTTP status means the host answered.
    pub async fn health(&self) -> Result<HealthStatus, SupabaseError> {
        let mut last_error = None;
        for path in ["auth/v1/health", "auth/v1/user"] {
            let url = self.endpoint(&[path])?;
            match self.client.get(url).send().await {
                Ok(response) => return Ok(HealthStatus { status: response.status().as_u16() }),
                Err(e) => {
                    tracing::debug!(path, error = %e, "health probe failed");
                    last_error = Some(SupabaseError::HttpRequest(e));
                },
            }
        }
        Err(last_error.unwrap_or_else(|| SupabaseError::InvalidUrl(self.base_url.clone())))
    }
}
