//! HTTP server for the chantier tracker.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::single_call_fn, reason = "Helper functions improve readability")]

pub mod api_error;
mod handlers;
mod network;
mod page;
mod query_types;
mod response_types;
pub mod session;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use chantier_core::AppConfig;
use chantier_service::{AuthService, DocumentService, DocumentSettings, ProjectService, UpdateService};
use chantier_supabase::{SupabaseClient, SupabaseError};
use tower_http::trace::TraceLayer;

pub use network::NetworkProbe;
pub use response_types::VersionResponse;
pub use session::{SessionState, SessionStore};

/// Files accepted in one form submission; sizes the request body limit.
pub const MAX_FILES_PER_SUBMIT: u64 = 10;

/// Shared application state for all HTTP handlers.
pub struct AppState {
    pub config: AppConfig,
    /// Server-side form sessions, keyed by cookie
    pub sessions: SessionStore,
    /// Cached reachability of the Supabase host
    pub network: NetworkProbe,
    pub auth_service: Arc<AuthService>,
    pub project_service: Arc<ProjectService>,
    pub update_service: Arc<UpdateService>,
    pub document_service: Arc<DocumentService>,
}

impl AppState {
    /// Wire every service to one Supabase client built from `config`.
    pub fn new(config: AppConfig) -> Result<Self, SupabaseError> {
        let client = Arc::new(SupabaseClient::from_config(&config)?);
        Ok(Self::with_client(config, client))
    }

    #[must_use]
    pub fn with_client(config: AppConfig, client: Arc<SupabaseClient>) -> Self {
        Self {
            sessions: SessionStore::default(),
            network: NetworkProbe::new(Arc::clone(&client)),
            auth_service: Arc::new(AuthService::new(Arc::clone(&client))),
            project_service: Arc::new(ProjectService::new(Arc::clone(&client))),
            update_service: Arc::new(UpdateService::new(Arc::clone(&client))),
            document_service: Arc::new(DocumentService::new(client, DocumentSettings::from(&config))),
            config,
        }
    }

    fn body_limit(&self) -> usize {
        let bytes = self.config.max_upload_bytes().saturating_mul(MAX_FILES_PER_SUBMIT);
        usize::try_from(bytes.saturating_add(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.body_limit();
    Router::new()
        .route("/", get(handlers::form::index))
        .route("/health", get(health))
        .route("/api/version", get(version))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/project", post(handlers::form::select_project))
        .route("/updates", post(handlers::form::submit_update))
        .route("/api/projects", get(handlers::api::list_projects))
        .route("/api/projects/{id}/documents", get(handlers::api::list_documents))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION") })
}
