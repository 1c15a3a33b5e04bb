#![allow(clippy::single_call_fn, reason = "HTTP handlers are called once from router")]

pub mod api;
pub mod auth;
pub mod form;

use axum::http::HeaderName;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use chantier_core::AuthSession;

use crate::AppState;
use crate::session::SessionId;

/// Redirect back to the page, setting the session cookie when it is new.
pub(crate) fn back_to_page(session: SessionId) -> Response {
    let cookie: Option<(HeaderName, String)> = session.cookie();
    (AppendHeaders(cookie), Redirect::to("/")).into_response()
}

/// Current auth session, re-validated against Supabase.
///
/// A rejected session is dropped from the form state; a transient failure keeps it.
pub(crate) async fn current_auth(state: &AppState, session: SessionId) -> Option<AuthSession> {
    let stored = state.sessions.get(session.id).await.and_then(|s| s.auth)?;
    match state.auth_service.whoami(&stored).await {
        Ok(Some(fresh)) => {
            if fresh != stored {
                let kept = fresh.clone();
                state.sessions.update(session.id, |s| s.auth = Some(kept)).await;
            }
            Some(fresh)
        },
        Ok(None) => {
            state.sessions.update(session.id, |s| s.auth = None).await;
            None
        },
        Err(e) => {
            tracing::warn!(error = %e, "could not re-validate session, keeping it");
            Some(stored)
        },
    }
}
