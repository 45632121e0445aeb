//! # Grocery CLI (`grocery`)
//!
//! Builds the combined shopping list for an event's recipes.
//!
//! ## Usage
//!
//! ```bash
//! grocery --config ./config/grocery.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `grocery init` | Create the SQLite database and run schema migrations |
//! | `grocery list <event.json>` | Print the category-grouped shopping list |
//! | `grocery export <event.json>` | Write the list as CSV |
//! | `grocery cache show <event_id>` | Print the cached merge result |
//! | `grocery cache clear <event_id>` | Drop the cached merge result |
//! | `grocery serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! grocery init
//! grocery list ./events/potluck.json --pantry ./pantry.txt
//! grocery list ./events/potluck.json --naive --json
//! grocery export ./events/potluck.json --output ./out/potluck.csv
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `info`, or `debug` with `--verbose`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use grocery_merge::{config, export, grocery, migrate, server};

/// Grocery: merge an event's recipe ingredients into one shopping list.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/grocery.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "grocery",
    about = "Combine an event's recipe ingredients into one shopping list",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/grocery.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the merge cache table.
    /// Running it more than once is safe.
    Init,

    /// Print the shopping list for an event.
    List {
        /// Event JSON file (recipes, ingredients, optional pantry).
        event: PathBuf,

        /// Pantry file: one ingredient per line, `#` comments.
        #[arg(long)]
        pantry: Option<PathBuf>,

        /// Skip the semantic merge and cache; use the simple combine only.
        #[arg(long)]
        naive: bool,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Export the shopping list for an event as CSV.
    Export {
        /// Event JSON file.
        event: PathBuf,

        #[arg(long)]
        pantry: Option<PathBuf>,

        #[arg(long)]
        naive: bool,

        /// Output file. Writes to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Inspect or clear cached merge results.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Start the HTTP server.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cached list for an event.
    Show { event_id: String },
    /// Delete the cached list for an event.
    Clear { event_id: String },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::List {
            event,
            pantry,
            naive,
            json,
        } => {
            grocery::run_list(&cfg, &event, pantry.as_deref(), naive, json).await?;
        }
        Commands::Export {
            event,
            pantry,
            naive,
            output,
        } => {
            export::run_export(&cfg, &event, pantry.as_deref(), naive, output.as_deref()).await?;
        }
        Commands::Cache { action } => match action {
            CacheAction::Show { event_id } => grocery::run_cache_show(&cfg, &event_id).await?,
            CacheAction::Clear { event_id } => grocery::run_cache_clear(&cfg, &event_id).await?,
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
