//! VacuFlow admin - catalog maintenance jobs
//!
//! Runs the usage sync, industry stats refresh and guarded deletes against
//! the configured PostgreSQL database. Each command runs on a `may`
//! coroutine; a failed command exits non-zero.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use vacuflow::connection::{check_connection_health, redact};
use vacuflow::{connect, Catalog, CatalogConfig, DocumentId, MayPostgresExecutor, PgDocumentStore};

#[derive(Parser)]
#[command(name = "vacuflow-admin")]
#[command(about = "Maintenance jobs for the VacuFlow catalog", long_about = None)]
struct Cli {
    /// Config file (defaults to config/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the documents table and index if missing
    InitSchema,
    /// Rebuild brand and pump type usage fields
    SyncUsage {
        /// Only this brand
        #[arg(long, conflicts_with = "pump_type")]
        brand: Option<String>,

        /// Only this pump type
        #[arg(long)]
        pump_type: Option<String>,
    },
    /// Recompute the customer / application counts on every industry
    RefreshIndustryStats,
    /// Delete a business type that no customer references
    DeleteBusinessType { id: String },
    /// Delete an industry that no customer references
    DeleteIndustry { id: String },
    /// Check database connectivity
    Health,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CatalogConfig::load_from(path),
        None => CatalogConfig::load(),
    }
    .context("loading configuration")?;

    may::config()
        .set_workers(config.runtime.workers)
        .set_stack_size(config.runtime.stack_size);

    let json_output = cli.json;
    let command = cli.command;
    let handle = may::go!(move || run(command, &config, json_output));
    let output = handle
        .join()
        .map_err(|_| anyhow!("command coroutine panicked"))??;

    println!("{output}");
    Ok(())
}

fn run(command: Commands, config: &CatalogConfig, json_output: bool) -> anyhow::Result<String> {
    let catalog = || Catalog::connect(config).context("connecting to the catalog database");

    match command {
        Commands::Health => {
            let client = connect(&config.database.url)?;
            if !check_connection_health(&client) {
                anyhow::bail!("database at {} is not responding", redact(&config.database.url));
            }
            Ok(render(json_output, json!({"healthy": true}), "Database is healthy".into()))
        }
        Commands::InitSchema => {
            let store = PgDocumentStore::new(MayPostgresExecutor::new(connect(&config.database.url)?));
            store.ensure_schema()?;
            Ok(render(json_output, json!({"schema": "ready"}), "Schema is ready".into()))
        }
        Commands::SyncUsage { brand, pump_type } => {
            let catalog = catalog()?;
            let report = match (brand, pump_type) {
                (Some(id), _) => catalog.sync_brand(&DocumentId::from(id)),
                (None, Some(id)) => catalog.sync_pump_type(&DocumentId::from(id)),
                (None, None) => catalog.sync_all_usage(),
            }?;
            let message = report.message.clone();
            Ok(render(json_output, serde_json::to_value(&report)?, message))
        }
        Commands::RefreshIndustryStats => {
            let count = catalog()?.refresh_industry_stats()?;
            Ok(render(
                json_output,
                json!({"refreshed": count}),
                format!("Refreshed stats for {count} industries"),
            ))
        }
        Commands::DeleteBusinessType { id } => {
            let deleted = catalog()?.delete_business_type(&DocumentId::from(id))?;
            let message = format!("Deleted business type {}", deleted.name);
            Ok(render(json_output, serde_json::to_value(&deleted)?, message))
        }
        Commands::DeleteIndustry { id } => {
            let deleted = catalog()?.delete_industry(&DocumentId::from(id))?;
            let message = format!("Deleted industry {}", deleted.name);
            Ok(render(json_output, serde_json::to_value(&deleted)?, message))
        }
    }
}

fn render(json_output: bool, value: serde_json::Value, text: String) -> String {
    if json_output {
        value.to_string()
    } else {
        text
    }
}
