use std::sync::Arc;

use chantier_core::{AuthSession, PROJECT_UPDATES_TABLE, ProjectUpdate, UpdateInput};
use chantier_supabase::SupabaseClient;

use crate::ServiceError;

pub struct UpdateService {
    client: Arc<SupabaseClient>,
}

impl UpdateService {
    #[must_use]
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }

    /// Insert one `project_updates` row authored by the session's user.
    ///
    /// Returns the payload that was sent and the row the database stored.
    pub async fn insert_project_update(
        &self,
        session: &AuthSession,
        project_id: &str,
        input: UpdateInput,
    ) -> Result<(ProjectUpdate, serde_json::Value), ServiceError> {
        let update = input.into_update(project_id, session.user_id())?;
        let stored = self
            .client
            .insert_row(&session.access_token, PROJECT_UPDATES_TABLE, &update)
            .await?;
        tracing::info!(
            project_id,
            user_id = %session.user.id,
            progress_travaux = ?update.progress_travaux,
            progress_paiements = ?update.progress_paiements,
            "project update recorded"
        );
        Ok((update, stored))
    }
}
