use std::sync::Arc;

use anyhow::{Context, Result};
use chantier_core::env_config::env_optional;
use chantier_core::{AppConfig, AuthSession};
use chantier_service::{AuthService, DocumentService, DocumentSettings, ProjectService};
use chantier_supabase::SupabaseClient;
use clap::Args;

/// Account used by the read-only commands. Falls back to `CHANTIER_EMAIL` / `CHANTIER_PASSWORD`.
#[derive(Args)]
pub(crate) struct Credentials {
    #[arg(short, long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
}

impl Credentials {
    fn resolve(&self) -> Result<(String, String)> {
        let email = self
            .email
            .clone()
            .or_else(|| env_optional("CHANTIER_EMAIL"))
            .context("--email or CHANTIER_EMAIL must be set")?;
        let password = self
            .password
            .clone()
            .or_else(|| env_optional("CHANTIER_PASSWORD"))
            .context("--password or CHANTIER_PASSWORD must be set")?;
        Ok((email, password))
    }
}

async fn sign_in(client: &Arc<SupabaseClient>, credentials: &Credentials) -> Result<AuthSession> {
    let (email, password) = credentials.resolve()?;
    let session = AuthService::new(Arc::clone(client)).sign_in(&email, &password).await?;
    Ok(session)
}

pub(crate) async fn run_projects(config: &AppConfig, credentials: &Credentials) -> Result<()> {
    let client = Arc::new(SupabaseClient::from_config(config)?);
    let session = sign_in(&client, credentials).await?;
    let projects = ProjectService::new(client).list_projects(&session).await?;
    println!("{}", serde_json::to_string_pretty(&projects)?);
    Ok(())
}

pub(crate) async fn run_documents(
    config: &AppConfig,
    credentials: &Credentials,
    project_id: &str,
) -> Result<()> {
    let client = Arc::new(SupabaseClient::from_config(config)?);
    let session = sign_in(&client, credentials).await?;
    let documents = DocumentService::new(client, DocumentSettings::from(config))
        .list_signed_pv(&session, project_id, config.signed_url_ttl_secs)
        .await?;
    println!("{}", serde_json::to_string_pretty(&documents)?);
    Ok(())
}
