mod commands;

use anyhow::Result;
use chantier_core::AppConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chantier")]
#[command(about = "Weekly construction-progress tracker backed by Supabase", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the progress form
    Serve {
        #[arg(short, long, default_value = "8080")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Check that the Supabase host answers
    Check,
    /// List the projects visible to an account
    Projects {
        #[command(flatten)]
        credentials: commands::query::Credentials,
    },
    /// List the PV documents stored for a project
    Documents {
        project_id: String,
        #[command(flatten)]
        credentials: commands::query::Credentials,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config, port, host).await?,
        Commands::Check => commands::check::run(&config).await?,
        Commands::Projects { credentials } => commands::query::run_projects(&config, &credentials).await?,
        Commands::Documents { project_id, credentials } => {
            commands::query::run_documents(&config, &credentials, &project_id).await?;
        },
    }

    Ok(())
}
