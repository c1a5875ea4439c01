use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use country_pipeline::{config::Config, database::Database, services::CatalogService};

#[derive(Parser)]
#[command(name = "country-pipeline")]
#[command(version)]
#[command(about = "Country application status pipeline engine", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run pending database migrations
    Migrate,
    /// Print the status catalog in browsing order
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("country_pipeline={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    let database = Database::new(&config.database).await?;

    match cli.command {
        Command::Migrate => {
            database.migrate().await?;
        }
        Command::Catalog => {
            database.migrate().await?;
            let catalog = CatalogService::new(&database).list_ordered().await?;
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            info!("Listed {} catalog entries", catalog.len());
        }
    }

    Ok(())
}
