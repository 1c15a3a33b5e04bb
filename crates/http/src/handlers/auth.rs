use std::sync::Arc;

use axum::extract::{Form, State};
use axum::response::Response;
use chantier_core::Banner;
use chantier_supabase::SignUpOutcome;

use super::back_to_page;
use crate::AppState;
use crate::query_types::CredentialsForm;
use crate::session::SessionId;

pub async fn login(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match state.auth_service.sign_in(&form.email, &form.password).await {
        Ok(auth) => {
            tracing::info!(user_id = %auth.user.id, "login");
            state.sessions.update(session.id, |s| s.signed_in(auth)).await;
        },
        Err(e) => {
            tracing::info!(error = %e, "login failed");
            state
                .sessions
                .update(session.id, |s| s.push(Banner::error(format!("Echec d'authentification : {e}"))))
                .await;
        },
    }
    back_to_page(session)
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match state.auth_service.sign_up(&form.email, &form.password).await {
        Ok(SignUpOutcome::Session(auth)) => {
            tracing::info!(user_id = %auth.user.id, "account created");
            state.sessions.update(session.id, |s| s.signed_in(auth)).await;
        },
        Ok(SignUpOutcome::ConfirmationRequired(user)) => {
            tracing::info!(user_id = %user.id, "account created, confirmation pending");
            state
                .sessions
                .update(session.id, |s| {
                    s.push(Banner::info(
                        "Compte créé : confirme ton adresse e-mail puis connecte-toi.",
                    ));
                })
                .await;
        },
        Err(e) => {
            tracing::info!(error = %e, "sign-up failed");
            state
                .sessions
                .update(session.id, |s| s.push(Banner::error(format!("Echec d'authentification : {e}"))))
                .await;
        },
    }
    back_to_page(session)
}

pub async fn logout(State(state): State<Arc<AppState>>, session: SessionId) -> Response {
    if let Some(auth) = state.sessions.get(session.id).await.and_then(|s| s.auth) {
        state.auth_service.sign_out(&auth).await;
        tracing::info!(user_id = %auth.user.id, "logout");
    }
    state.sessions.update(session.id, |s| s.reset()).await;
    back_to_page(session)
}
