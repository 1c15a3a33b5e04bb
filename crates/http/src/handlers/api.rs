use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use super::current_auth;
use crate::AppState;
use crate::api_error::ApiError;
use crate::response_types::{DocumentsResponse, ProjectsResponse};
use crate::session::SessionId;

const NOT_SIGNED_IN: &str = "not signed in";

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    session: SessionId,
) -> Result<Json<ProjectsResponse>, ApiError> {
    let auth = current_auth(&state, session)
        .await
        .ok_or_else(|| ApiError::Unauthorized(NOT_SIGNED_IN.to_owned()))?;
    let projects = state.project_service.list_projects(&auth).await?;
    Ok(Json(ProjectsResponse { projects }))
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    Path(project_id): Path<String>,
) -> Result<Json<DocumentsResponse>, ApiError> {
    let auth = current_auth(&state, session)
        .await
        .ok_or_else(|| ApiError::Unauthorized(NOT_SIGNED_IN.to_owned()))?;
    let documents = state
        .document_service
        .list_signed_pv(&auth, &project_id, state.config.signed_url_ttl_secs)
        .await?;
    Ok(Json(DocumentsResponse { project_id, documents }))
}
