//! Table access through PostgREST (`/rest/v1`).

use chantier_core::{PROJECTS_TABLE, Project};
use reqwest::Method;
use serde::Serialize;

use crate::client::SupabaseClient;
use crate::error::SupabaseError;

impl SupabaseClient {
    /// All projects visible to the user, ordered by name.
    pub async fn select_projects(&self, access_token: &str) -> Result<Vec<Project>, SupabaseError> {
        let mut url = self.endpoint(&["rest/v1", PROJECTS_TABLE])?;
        url.query_pairs_mut().append_pair("select", "id,name").append_pair("order", "name.asc");
        let response = self
            .send_idempotent("select projects", || {
                self.request(Method::GET, url.clone(), Some(access_token))
                    .header("Accept", "application/json")
            })
            .await?;
        Self::parse_json(response, "projects").await
    }

    /// Insert one row and return what the database stored.
    ///
    /// An empty representation (row filtered by RLS, for instance) is an error.
    pub async fn insert_row<T: Serialize + ?Sized>(
        &self,
        access_token: &str,
        table: &str,
        row: &T,
    ) -> Result<serde_json::Value, SupabaseError> {
        let url = self.endpoint(&["rest/v1", table])?;
        let request = self
            .request(Method::POST, url, Some(access_token))
            .header("Prefer", "return=representation")
            .json(row);
        let response = self.send(request).await?;
        let rows: Vec<serde_json::Value> = Self::parse_json(response, table).await?;
        rows.into_iter().next().ok_or_else(|| SupabaseError::EmptyInsert(table.to_owned()))
    }
}
