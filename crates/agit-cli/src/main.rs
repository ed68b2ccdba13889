mod import;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::import::{run_import, run_sources, ImportOptions};

#[derive(Debug, Parser)]
#[command(name = "agit-cli")]
#[command(about = "Bunny Agit command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Import government smoking-area CSV exports as verified public areas
    Import {
        /// CSV files to import
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Source id to use for every file instead of matching file names
        #[arg(long)]
        source: Option<String>,
        /// Parse and report without writing to the database
        #[arg(long)]
        dry_run: bool,
        /// Geocode rows that only carry an address
        #[arg(long)]
        geocode: bool,
        /// Concurrent geocoder requests
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },
    /// List the configured public-data sources
    Sources,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = agit_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    agit_db::ping(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = agit_db::run_migrations(&pool).await?;
                    println!("migrations applied: {applied}");
                }
            }
        }
        Some(Commands::Import {
            files,
            source,
            dry_run,
            geocode,
            concurrency,
        }) => {
            let pool = if dry_run {
                None
            } else {
                Some(connect(&config).await?)
            };
            let options = ImportOptions {
                source,
                dry_run,
                geocode,
                concurrency,
            };
            run_import(pool.as_ref(), &config, &files, &options).await?;
        }
        Some(Commands::Sources) => run_sources(&config)?,
        None => println!("agit-cli ready; run with --help for commands"),
    }

    Ok(())
}

async fn connect(config: &agit_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = agit_db::PoolConfig::from_app_config(config);
    let pool = agit_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
