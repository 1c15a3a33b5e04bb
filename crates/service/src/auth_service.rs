use std::sync::Arc;

use chantier_core::AuthSession;
use chantier_supabase::{SignUpOutcome, SupabaseClient};

use crate::ServiceError;

/// Seconds before expiry at which a token is refreshed proactively.
const REFRESH_LEEWAY_SECS: i64 = 60;

pub struct AuthService {
    client: Arc<SupabaseClient>,
}

impl AuthService {
    #[must_use]
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ServiceError> {
        let (email, password) = credentials(email, password)?;
        Ok(self.client.sign_in_with_password(email, password).await?)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ServiceError> {
        let (email, password) = credentials(email, password)?;
        Ok(self.client.sign_up(email, password).await?)
    }

    /// Re-validate a stored session.
    ///
    /// Returns the (possibly refreshed) session, or `None` once the tokens are no longer
    /// accepted. Transient failures are errors so callers can keep the session.
    pub async fn whoami(&self, session: &AuthSession) -> Result<Option<AuthSession>, ServiceError> {
        let now = chrono::Utc::now().timestamp();
        if session.is_expired(now, REFRESH_LEEWAY_SECS) {
            return self.refresh(session).await;
        }
        match self.client.get_user(&session.access_token).await {
            Ok(user) => {
                let mut current = session.clone();
                current.user = user;
                Ok(Some(current))
            },
            Err(e) if e.is_unauthorized() => self.refresh(session).await,
            Err(e) => Err(e.into()),
        }
    }

    async fn refresh(&self, session: &AuthSession) -> Result<Option<AuthSession>, ServiceError> {
        match self.client.refresh_session(&session.refresh_token).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(e) if e.is_transient() => Err(e.into()),
            Err(e) => {
                tracing::info!(user_id = %session.user.id, error = %e, "session no longer valid");
                Ok(None)
            },
        }
    }

    /// Revoke the session server-side. Failures are logged, never surfaced.
    pub async fn sign_out(&self, session: &AuthSession) {
        if let Err(e) = self.client.sign_out(&session.access_token).await {
            tracing::warn!(user_id = %session.user.id, error = %e, "sign-out failed, dropping session anyway");
        }
    }
}

fn credentials<'a>(email: &'a str, password: &'a str) -> Result<(&'a str, &'a str), ServiceError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ServiceError::InvalidInput("email and password are required".to_owned()));
    }
    Ok((email, password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client, session};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sign_in_requires_credentials() {
        let server = MockServer::start().await;
        let service = AuthService::new(client(&server));
        let err = service.sign_in("  ", "secret").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_whoami_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "user-1", "email": "nouveau@chantier.fr"
            })))
            .mount(&server)
            .await;

        let service = AuthService::new(client(&server));
        let current = service.whoami(&session()).await.unwrap().unwrap();
        assert_eq!(current.access_token, "access-1");
        assert_eq!(current.user.email.as_deref(), Some("nouveau@chantier.fr"));
    }

    #[tokio::test]
    async fn test_whoami_refreshes_rejected_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({"msg": "JWT expired"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-2",
                "refresh_token": "refresh-2",
                "expires_in": 3600,
                "user": {"id": "user-1", "email": "chef@chantier.fr"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = AuthService::new(client(&server));
        let current = service.whoami(&session()).await.unwrap().unwrap();
        assert_eq!(current.access_token, "access-2");
    }

    #[tokio::test]
    async fn test_whoami_drops_revoked_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant", "error_description": "Invalid Refresh Token"
            })))
            .mount(&server)
            .await;

        let service = AuthService::new(client(&server));
        assert!(service.whoami(&session()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_whoami_expired_skips_user_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-3",
                "refresh_token": "refresh-3",
                "user": {"id": "user-1"}
            })))
            .mount(&server)
            .await;

        let mut stale = session();
        stale.expires_at = Some(0);
        let service = AuthService::new(client(&server));
        let current = service.whoami(&stale).await.unwrap().unwrap();
        assert_eq!(current.access_token, "access-3");
    }

    #[tokio::test]
    async fn test_sign_out_swallows_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        AuthService::new(client(&server)).sign_out(&session()).await;
    }
}
