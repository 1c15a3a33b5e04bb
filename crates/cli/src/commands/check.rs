use anyhow::Result;
use chantier_core::AppConfig;
use chantier_supabase::SupabaseClient;

pub(crate) async fn run(config: &AppConfig) -> Result<()> {
    let client = SupabaseClient::from_config(config)?;
    let status = client.health().await?;
    if status.is_expected() {
        println!("Supabase reachable at {} (status {})", config.host(), status.status);
    } else {
        println!("Supabase answered at {} with unexpected status {}", config.host(), status.status);
    }
    Ok(())
}
