//! Per-browser form state kept server-side and keyed by an `HttpOnly` cookie.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use chantier_core::{AuthSession, Banner};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::AppState;

pub const SESSION_COOKIE: &str = "chantier_session";

/// Sessions idle for longer than this are dropped.
const SESSION_IDLE_TTL: Duration = Duration::from_secs(12 * 3600);

/// Values typed in the update form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub progress_travaux: Option<f64>,
    pub progress_paiements: Option<f64>,
    /// Raw date text, kept as typed so an invalid date can be corrected.
    pub pv_date: String,
    pub commentaires: String,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub auth: Option<AuthSession>,
    pub auth_panel_visible: bool,
    pub selected_project_id: Option<String>,
    /// Bumped whenever the file input must come back empty.
    pub uploader_version: u64,
    pub form: FormState,
    /// Messages shown once, on the next render.
    pub flash: Vec<Banner>,
    last_seen: Instant,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            auth: None,
            auth_panel_visible: true,
            selected_project_id: None,
            uploader_version: 0,
            form: FormState::default(),
            flash: Vec::new(),
            last_seen: Instant::now(),
        }
    }
}

impl SessionState {
    pub fn clear_form(&mut self) {
        self.form = FormState::default();
        self.uploader_version = self.uploader_version.wrapping_add(1);
    }

    /// Keep what was typed after a rejected submission; the file input still comes back empty.
    pub fn retain_form(&mut self, form: FormState) {
        self.form = form;
        self.uploader_version = self.uploader_version.wrapping_add(1);
    }

    /// Switch project; the form is cleared only when the project actually changes.
    pub fn select_project(&mut self, project_id: &str) -> bool {
        if self.selected_project_id.as_deref() == Some(project_id) {
            return false;
        }
        self.selected_project_id = Some(project_id.to_owned());
        self.clear_form();
        true
    }

    pub fn signed_in(&mut self, auth: AuthSession) {
        self.auth = Some(auth);
        self.auth_panel_visible = false;
    }

    /// Back to the initial state, keeping pending messages.
    pub fn reset(&mut self) {
        let flash = std::mem::take(&mut self.flash);
        *self = Self { flash, ..Self::default() };
    }

    pub fn push(&mut self, banner: Banner) {
        self.flash.push(banner);
    }
}

#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<Uuid, SessionState>>,
}

impl SessionStore {
    /// Snapshot of a session, if it exists.
    pub async fn get(&self, id: Uuid) -> Option<SessionState> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Apply `f` to a session, creating it first when missing.
    ///
    /// Sessions only exist once something was written to them; idle ones are dropped
    /// whenever a new one is stored.
    pub async fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut sessions = self.inner.write().await;
        if !sessions.contains_key(&id) {
            let before = sessions.len();
            sessions.retain(|_, s| s.last_seen.elapsed() < SESSION_IDLE_TTL);
            let evicted = before - sessions.len();
            if evicted > 0 {
                tracing::debug!(evicted, "idle sessions dropped");
            }
        }
        let state = sessions.entry(id).or_default();
        state.last_seen = Instant::now();
        f(state)
    }

    /// Drop and return the pending messages. Never creates a session.
    pub async fn take_flash(&self, id: Uuid) -> Vec<Banner> {
        self.inner
            .write()
            .await
            .get_mut(&id)
            .map(|s| std::mem::take(&mut s.flash))
            .unwrap_or_default()
    }
}

/// Session id of the current request. New ids must be sent back with [`SessionId::cookie`].
#[derive(Debug, Clone, Copy)]
pub struct SessionId {
    pub id: Uuid,
    pub is_new: bool,
}

impl SessionId {
    /// `Set-Cookie` header for a freshly created session.
    pub fn cookie(&self) -> Option<(HeaderName, String)> {
        self.is_new.then(|| {
            (SET_COOKIE, format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id))
        })
    }
}

impl FromRequestParts<Arc<AppState>> for SessionId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(id) = session_cookie(&parts.headers) {
            if state.sessions.get(id).await.is_some() {
                return Ok(Self { id, is_new: false });
            }
        }
        // Unknown ids are never adopted; the store entry appears on the first write.
        Ok(Self { id: Uuid::new_v4(), is_new: true })
    }
}

/// Session id carried by the `Cookie` header, if well-formed.
pub fn session_cookie(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}
