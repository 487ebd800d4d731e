mod scrape;
mod stats;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "busdb-cli")]
#[command(about = "Bus listing scraper command line interface")]
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
    /// Scrape every route listed on the configured state landing pages
    Scrape {
        /// Restrict the run to one state (by name or state)
        #[arg(long)]
        state: Option<String>,

        /// Maximum routes scraped per state; defaults to the configured value
        #[arg(long)]
        routes_per_state: Option<usize>,

        /// Scrape and validate without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Scrape a single route page
    ScrapeRoute {
        /// Display name stored with each listing
        #[arg(long)]
        name: String,

        /// Route page URL
        #[arg(long)]
        url: String,

        /// Print the results instead of storing them
        #[arg(long)]
        no_store: bool,
    },
    /// Print aggregate statistics over stored listings
    Stats,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Delete every stored bus listing
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("busdb-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = busdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            run_db_command(&pool, command).await?;
        }
        Commands::Scrape {
            state,
            routes_per_state,
            dry_run,
        } => {
            let pool = if dry_run {
                None
            } else {
                Some(connect(&config).await?)
            };
            scrape::run_scrape(&config, pool.as_ref(), state.as_deref(), routes_per_state)
                .await?;
        }
        Commands::ScrapeRoute {
            name,
            url,
            no_store,
        } => {
            let pool = if no_store {
                None
            } else {
                Some(connect(&config).await?)
            };
            let route = busdb_core::RouteDescriptor::new(name, url);
            scrape::run_scrape_route(&config, pool.as_ref(), &route).await?;
        }
        Commands::Stats => {
            let pool = connect(&config).await?;
            stats::run_stats(&pool).await?;
        }
    }

    Ok(())
}

async fn connect(config: &busdb_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = busdb_db::PoolConfig::from_app_config(config);
    let pool = busdb_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

async fn run_db_command(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            busdb_db::health_check(pool).await?;
            println!("database: ok");
        }
        DbCommands::Migrate => {
            let applied = busdb_db::run_migrations(pool).await?;
            println!("applied {applied} migrations");
        }
        DbCommands::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to delete all bus listings without --yes");
            }
            let deleted = busdb_db::clear_bus_routes(pool).await?;
            println!("deleted {deleted} bus listings");
        }
    }
    Ok(())
}
