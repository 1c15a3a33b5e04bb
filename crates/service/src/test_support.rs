use std::sync::Arc;

use chantier_core::{AuthSession, AuthUser};
use chantier_supabase::SupabaseClient;
use wiremock::MockServer;

pub(crate) fn client(server: &MockServer) -> Arc<SupabaseClient> {
    Arc::new(
        SupabaseClient::new(server.uri(), "anon-key")
            .unwrap()
            .with_retry_delays(Vec::new()),
    )
}

pub(crate) fn session() -> AuthSession {
    AuthSession {
        access_token: "access-1".to_owned(),
        refresh_token: "refresh-1".to_owned(),
        expires_at: None,
        user: AuthUser { id: "user-1".to_owned(), email: Some("chef@chantier.fr".to_owned()) },
    }
}
