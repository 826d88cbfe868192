//! Tournament bracket server.
//!
//! Serves the tournament manager over HTTP, backed by either an in-memory
//! store or PostgreSQL.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use pico_args::Arguments;
use tb_server::{
    api,
    config::{ServerConfig, StoreBackend},
    logging,
};
use tourney_bracket::{MemoryStore, TournamentManager, TournamentStore, db::Database};
use tracing::info;

const HELP: &str = "\
Run the tournament bracket server

USAGE:
  tb_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --store      BACKEND     memory or postgres          [default: env STORE_BACKEND or memory]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  STORE_BACKEND            memory | postgres
  DATABASE_URL             PostgreSQL connection string
  TOURNEY_MAX_TX_ATTEMPTS  Attempts per conflicting transaction
  TOURNEY_RETRY_BACKOFF_MS Base delay between attempts
  PAIRING_SEED             Fixed seed for member pairing
  RUST_LOG                 Log filter
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    backend: Option<StoreBackend>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        backend: pargs.opt_value_from_str("--store")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.backend)?;
    config.validate()?;
    info!("Starting tournament server at {}", config.bind);

    let (store, database): (Arc<dyn TournamentStore>, Option<Database>) = match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; state is lost on restart");
            (Arc::new(MemoryStore::new()), None)
        }
        StoreBackend::Postgres => {
            info!("Connecting to database");
            let db = Database::new(&config.database)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            let store = db
                .tournament_store()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to apply schema: {}", e))?;
            info!("Database connected successfully");
            (Arc::new(store), Some(db))
        }
    };

    let mut manager = TournamentManager::new(store).with_config(config.manager.clone());
    if let Some(seed) = config.pairing_seed {
        info!("Member pairing seeded with {seed}");
        manager = manager.with_rng_seed(seed);
    }

    let mut state = api::AppState::new(manager);
    if let Some(db) = database.clone() {
        state = state.with_database(db);
    }
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {e}");
        std::future::pending::<()>().await;
    }
}
