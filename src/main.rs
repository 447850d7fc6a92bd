//! # Care Cache CLI (`carecache`)
//!
//! Operator harness for the care cache: create the database, inspect
//! fingerprints, run inputs through the full pipeline, and report what the
//! cache holds.
//!
//! ## Usage
//!
//! ```bash
//! carecache --config ./config/carecache.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `carecache init` | Create the SQLite database and run schema migrations |
//! | `carecache fingerprint` | Print the fingerprint of an image or query |
//! | `carecache analyze <kind>` | Canonicalize and localize an image or query |
//! | `carecache stats` | Entry counts per namespace and version |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! carecache init
//!
//! # Same photo twice: the second run is a cache hit
//! carecache analyze garment --image ./shirt.jpg --locale pt-BR
//! carecache -v analyze garment --image ./shirt.jpg --locale pt-BR
//!
//! # Text query
//! carecache analyze stain --text "red wine on a linen tablecloth"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use care_cache_core::RecordKind;
use care_cache::{analyze, config, db, logging, migrate, stats};

/// Care Cache CLI: canonical result cache and translation memoization for
/// laundry-care model answers.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file falls back to built-in defaults.
#[derive(Parser)]
#[command(
    name = "carecache",
    about = "Care Cache: canonical result cache and translation memoization for laundry-care answers",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/carecache.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the cache table. Idempotent.
    Init,

    /// Print the fingerprint of an input.
    Fingerprint {
        /// Image file to fingerprint.
        #[arg(long, conflicts_with = "text")]
        image: Option<PathBuf>,

        /// Text query to fingerprint.
        #[arg(long)]
        text: Option<String>,
    },

    /// Canonicalize an input and localize the result.
    Analyze {
        /// Record kind: garment, fabric, laundry, stain or batch.
        kind: RecordKind,

        /// Image file to analyze.
        #[arg(long, conflicts_with = "text")]
        image: Option<PathBuf>,

        /// Text query to analyze.
        #[arg(long)]
        text: Option<String>,

        /// Target locale (e.g. `de`, `pt-BR`). Defaults to the base locale.
        #[arg(long)]
        locale: Option<String>,
    },

    /// Show cache entry counts per namespace and version.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::info!(path = %cli.config.display(), "config file not found, using defaults");
        config::Config::default()
    };

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Fingerprint { image, text } => {
            analyze::run_fingerprint(&cfg, image.as_deref(), text.as_deref())?;
        }
        Commands::Analyze {
            kind,
            image,
            text,
            locale,
        } => {
            analyze::run_analyze(
                &cfg,
                kind,
                image.as_deref(),
                text.as_deref(),
                locale.as_deref(),
            )
            .await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
