use std::sync::Arc;

use chantier_core::{AuthSession, Project};
use chantier_supabase::SupabaseClient;

use crate::ServiceError;

pub struct ProjectService {
    client: Arc<SupabaseClient>,
}

impl ProjectService {
    #[must_use]
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }

    /// Projects visible to the session, ordered by name.
    pub async fn list_projects(&self, session: &AuthSession) -> Result<Vec<Project>, ServiceError> {
        let projects = self.client.select_projects(&session.access_token).await?;
        tracing::debug!(count = projects.len(), "projects listed");
        Ok(projects)
    }
}
