use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackmeet::{api, config::ServerConfig, db};

#[derive(Parser)]
#[command(name = "trackmeet")]
#[command(about = "Heat assignment and round progression for timed events")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Apply pending database migrations and exit
    Migrate {
        /// Path to the SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "trackmeet=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_database(config: &ServerConfig) -> anyhow::Result<db::Database> {
    let path = config.resolved_db_path()?;
    tracing::info!("Using database at {}", path.display());
    let db = db::Database::open(path)?;
    db.migrate()?;
    Ok(db)
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let db = open_database(&config)?;
    let app = api::create_router(db);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("trackmeet listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = ServerConfig::from_env();

    match cli.command {
        Some(Commands::Serve { port, db }) => serve(config.with_overrides(port, db)).await?,
        Some(Commands::Migrate { db }) => {
            open_database(&config.with_overrides(None, db))?;
            tracing::info!("Migrations applied");
        }
        None => serve(config).await?,
    }

    Ok(())
}
