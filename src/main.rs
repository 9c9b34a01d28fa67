//! kgmem CLI - serve and inspect a persistent knowledge graph

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use kgmem::config::{self, KgmemConfig};
use kgmem::server::{self, AppState, mcp::McpService};
use kgmem::storage::StoreRegistry;
use kgmem::ui::{self, Icons};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "kgmem")]
#[command(version)]
#[command(about = "Knowledge graph memory - entities, observations and relations over MCP")]
#[command(long_about = r#"
kgmem keeps a knowledge graph in a local SQLite database:
  • Entities with a type and free-text observations
  • Typed directed relations between entities
  • One database per project, or a global one in ~/.kgmem

Example usage:
  kgmem serve
  kgmem http --port 7411
  kgmem search --query "auth"
  kgmem open --name AuthService --name Db
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file
    #[arg(short, long, global = true, env = "KGMEM_DATABASE")]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the knowledge graph as MCP tools over stdio
    Serve,

    /// Serve the knowledge graph as a JSON HTTP API
    Http {
        /// Port to listen on (localhost only)
        #[arg(short, long, default_value = "7411")]
        port: u16,
    },

    /// Print the whole graph
    Read {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Search entities by name, type or observation
    Search {
        /// Search query
        #[arg(short, long)]
        query: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show specific entities and the relations between them
    Open {
        /// Entity names
        #[arg(short, long = "name", required = true)]
        names: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show row counts
    Stats,

    /// Write a kgmem.toml and a project-scoped database location
    Init {
        /// Project root
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn print_graph(graph: &kgmem::KnowledgeGraph, format: &str) -> anyhow::Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(graph)?);
    } else if graph.is_empty() {
        println!("{} Nothing found.", Icons::EMPTY);
    } else {
        println!("{}", ui::graph_table(graph));
        ui::info("Shown", &graph.stats().to_string());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for MCP traffic
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let loaded = config::load_config(cli.config.as_deref())?;
    let database = config::resolve_database_path(cli.database.as_deref(), loaded.as_ref());
    let options = loaded.as_ref().map(KgmemConfig::store_options).unwrap_or_default();
    let registry = Arc::new(StoreRegistry::new(options));

    match cli.command {
        Commands::Serve => {
            tracing::info!("Serving MCP over stdio (default database {:?})", database);
            let state = Arc::new(AppState::new(Arc::clone(&registry), database));
            McpService::new(state).run_stdio().await?;
        }

        Commands::Http { port } => {
            ui::header(&format!("Serving HTTP on http://127.0.0.1:{}", port));
            ui::info("Database", &database.display().to_string());
            let state = Arc::new(AppState::new(Arc::clone(&registry), database));
            server::start_server(port, state).await?;
        }

        Commands::Read { format } => {
            let store = registry.get_or_open(&database)?;
            print_graph(&store.read_graph()?, &format)?;
        }

        Commands::Search { query, format } => {
            let store = registry.get_or_open(&database)?;
            if format != "json" {
                println!("{} Searching for: '{}'...", Icons::SEARCH, query);
            }
            print_graph(&store.search_nodes(&query)?, &format)?;
        }

        Commands::Open { names, format } => {
            let store = registry.get_or_open(&database)?;
            print_graph(&store.open_nodes(&names)?, &format)?;
        }

        Commands::Stats => {
            let store = registry.get_or_open(&database)?;
            let stats = store.stats()?;

            println!("{} kgmem Statistics ({:?})", Icons::STATS, store.path());
            println!("{}", ui::stats_table(&stats));
        }

        Commands::Init { path, force } => {
            let config_path = path.join(config::default_config_path());
            let project_db = config::default_database_path_in(&path);
            let new_config = KgmemConfig {
                database: Some(project_db.to_string_lossy().to_string()),
                busy_timeout_ms: Some(kgmem::storage::DEFAULT_BUSY_TIMEOUT.as_millis() as u64),
            };

            config::write_config(&config_path, &new_config, force)?;
            config::ensure_gitignore(&path)?;
            registry.get_or_open(&project_db)?;

            ui::success(&format!("Wrote {}", config_path.display()));
            ui::info("Database", &project_db.display().to_string());
        }
    }

    registry.close_all();
    Ok(())
}
