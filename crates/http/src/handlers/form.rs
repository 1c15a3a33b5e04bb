use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, Multipart, Query, State};
use axum::response::{AppendHeaders, Html, IntoResponse, Response};
use chantier_core::{
    AuthSession, Banner, Project, UpdateInput, UploadFile, UploadReport, parse_pv_date, pct_or_none,
};
use chantier_service::ServiceError;
use chantier_supabase::SupabaseError;

use super::{back_to_page, current_auth};
use crate::AppState;
use crate::page::{PageView, render};
use crate::query_types::{IndexQuery, ProjectForm};
use crate::session::{FormState, SessionId};

pub async fn index(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    Query(query): Query<IndexQuery>,
) -> Response {
    let network = state.network.banner().await;
    let auth = current_auth(&state, session).await;

    let mut view = PageView {
        network: Some(network),
        signup_mode: query.signup_mode(),
        max_upload_mb: state.config.max_upload_mb,
        ..PageView::default()
    };

    if let Some(auth) = &auth {
        view.user = Some(auth.user.clone());
        view.projects = match state.project_service.list_projects(auth).await {
            Ok(projects) => projects,
            Err(e) => {
                tracing::warn!(error = %e, "project listing failed");
                state
                    .sessions
                    .update(session.id, |s| s.push(Banner::error(format!("Erreur chargement projets : {e}"))))
                    .await;
                Vec::new()
            },
        };
    }

    let selected = pick_project(&view.projects, &state, session).await;
    if let (Some(auth), Some(project_id)) = (&auth, &selected) {
        view.documents = match state
            .document_service
            .list_signed_pv(auth, project_id, state.config.signed_url_ttl_secs)
            .await
        {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!(%project_id, error = %e, "document listing failed");
                Vec::new()
            },
        };
    }

    view.banners = state.sessions.take_flash(session.id).await;
    let snapshot = state.sessions.get(session.id).await.unwrap_or_default();
    view.show_auth_panel = snapshot.auth_panel_visible;
    view.form = snapshot.form;
    view.uploader_version = snapshot.uploader_version;
    view.selected_project_id = selected;

    (AppendHeaders(session.cookie()), Html(render(&view))).into_response()
}

/// Keep the stored project when it still exists, otherwise fall back to the first one.
async fn pick_project(projects: &[Project], state: &AppState, session: SessionId) -> Option<String> {
    let first = projects.first()?;
    let stored = state.sessions.get(session.id).await.and_then(|s| s.selected_project_id);
    let chosen = stored
        .filter(|id| projects.iter().any(|p| &p.id == id))
        .unwrap_or_else(|| first.id.clone());
    let id = chosen.clone();
    state.sessions.update(session.id, |s| s.select_project(&id)).await;
    Some(chosen)
}

pub async fn select_project(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    Form(form): Form<ProjectForm>,
) -> Response {
    let changed = state.sessions.update(session.id, |s| s.select_project(&form.project_id)).await;
    if changed {
        tracing::debug!(project_id = %form.project_id, "project selected");
    }
    back_to_page(session)
}

/// Text fields and files of the update form.
#[derive(Debug, Default)]
struct SubmittedForm {
    fields: HashMap<String, String>,
    files: Vec<UploadFile>,
}

impl SubmittedForm {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// What the user typed, for redisplay after a rejected submission.
    fn typed(&self) -> FormState {
        FormState {
            progress_travaux: pct_or_none(self.field("progress_travaux")),
            progress_paiements: pct_or_none(self.field("progress_paiements")),
            pv_date: self.field("pv_date").unwrap_or_default().trim().to_owned(),
            commentaires: self.field("commentaires").unwrap_or_default().to_owned(),
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> anyhow::Result<SubmittedForm> {
    let mut form = SubmittedForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match field.file_name().map(str::to_owned) {
            // Browsers send an empty part when no file was picked.
            Some(file_name) if file_name.is_empty() => {},
            Some(file_name) => {
                let bytes = field.bytes().await?;
                form.files.push(UploadFile::new(file_name, bytes.to_vec()));
            },
            None => {
                let value = field.text().await?;
                form.fields.insert(name, value);
            },
        }
    }
    Ok(form)
}

fn insert_failure_message(err: &ServiceError) -> String {
    match err {
        ServiceError::Supabase(SupabaseError::EmptyInsert(_)) => "Insertion vide (aucune ligne).".to_owned(),
        other => format!("Erreur enregistrement: {other}"),
    }
}

fn upload_banners(report: &UploadReport) -> Vec<Banner> {
    let mut banners = Vec::new();
    if report.uploaded > 0 {
        banners.push(Banner::success(format!("Fichiers déposés : {}", report.uploaded)));
    }
    if !report.warnings.is_empty() {
        banners.push(Banner::warning(format!(
            "Quelques fichiers n’ont pas été pris en compte :\n- {}",
            report.warnings.join("\n- ")
        )));
    }
    banners
}

pub async fn submit_update(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    multipart: Multipart,
) -> Response {
    let form = match read_multipart(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable form submission");
            state
                .sessions
                .update(session.id, |s| s.push(Banner::error(format!("Formulaire illisible : {e}"))))
                .await;
            return back_to_page(session);
        },
    };

    let Some(auth) = current_auth(&state, session).await else {
        state
            .sessions
            .update(session.id, |s| s.push(Banner::info("Connecte-toi pour saisir une mise à jour.")))
            .await;
        return back_to_page(session);
    };
    let Some(project_id) = state.sessions.get(session.id).await.and_then(|s| s.selected_project_id)
    else {
        state
            .sessions
            .update(session.id, |s| s.push(Banner::warning("Aucun projet sélectionné.")))
            .await;
        return back_to_page(session);
    };

    let (outcome, typed) = match record_update(&state, &auth, &project_id, &form).await {
        Ok(banner) => (banner, None),
        Err(banner) => (banner, Some(form.typed())),
    };
    let mut banners = vec![outcome];
    if !form.files.is_empty() {
        match state.document_service.upload_files(&auth, &project_id, form.files).await {
            Ok(report) => banners.extend(upload_banners(&report)),
            Err(e) => banners.push(Banner::error(format!("Dépôt des fichiers impossible : {e}"))),
        }
    }

    state
        .sessions
        .update(session.id, |s| {
            s.flash.extend(banners);
            match typed {
                Some(form) => s.retain_form(form),
                None => s.clear_form(),
            }
        })
        .await;
    back_to_page(session)
}

/// Insert the row; the banner describes the outcome, `Err` when nothing was stored.
async fn record_update(
    state: &AppState,
    auth: &AuthSession,
    project_id: &str,
    form: &SubmittedForm,
) -> Result<Banner, Banner> {
    let pv_date = parse_pv_date(form.field("pv_date"))
        .map_err(|e| Banner::error(format!("Erreur enregistrement: {e}")))?;
    let input = UpdateInput {
        progress_travaux: pct_or_none(form.field("progress_travaux")),
        progress_paiements: pct_or_none(form.field("progress_paiements")),
        pv_date,
        commentaires: form.field("commentaires").unwrap_or_default().to_owned(),
    };
    match state.update_service.insert_project_update(auth, project_id, input).await {
        Ok(_) => Ok(Banner::success("Mise à jour enregistrée.")),
        Err(e) => {
            tracing::warn!(%project_id, error = %e, "update insert failed");
            Err(Banner::error(insert_failure_message(&e)))
        },
    }
}
