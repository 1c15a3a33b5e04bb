//! Response types (Serialize)

use chantier_core::{Project, StoredDocument};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[non_exhaustive]
pub struct VersionResponse {
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct DocumentsResponse {
    pub project_id: String,
    pub documents: Vec<StoredDocument>,
}
