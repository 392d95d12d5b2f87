//! Tripsmith API server binary.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tripsmith_api::config::ApiConfig;
use tripsmith_api::{AppState, router};
use tripsmith_core::auth::{AuthSessionService, SessionRegistry};
use tripsmith_core::itinerary::{ItineraryGenerationService, provider};
use tripsmith_core::migrate::connect_and_migrate;
use tripsmith_core::store::{IdentityStore, MemoryStore, PgStore, TripStore};
use tripsmith_core::trips::TripService;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "tripsmith_api_server", about = "Tripsmith API server")]
struct Args {
    /// Port to listen on on 127.0.0.1. Overrides `BIND_ADDR`.
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep everything in memory instead of PostgreSQL. Data is lost on exit.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

/// Wire services over a store that covers identities, sessions and trips.
fn build_state<S>(store: Arc<S>, config: ApiConfig) -> Result<AppState, Box<dyn std::error::Error>>
where
    S: IdentityStore + SessionRegistry + TripStore + 'static,
{
    let generator = provider::from_config(&config.generation)?;
    info!(
        provider = generator.name(),
        model = %config.generation.model,
        timeout = ?config.generation.timeout,
        "itinerary generation configured"
    );
    let generation = Arc::new(ItineraryGenerationService::new(
        generator,
        store.clone(),
        config.generation.timeout,
    ));
    Ok(AppState {
        auth: Arc::new(AuthSessionService::new(
            &config.auth,
            store.clone(),
            store.clone(),
        )),
        trips: Arc::new(TripService::new(store, generation)),
        config,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,tripsmith_api=debug,tripsmith_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(port) = args.port {
        config.bind_addr = format!("127.0.0.1:{port}");
    }

    let state = if args.in_memory {
        info!("using in-memory store");
        build_state(Arc::new(MemoryStore::new()), config.clone())?
    } else {
        let database_url = args
            .database_url
            .ok_or("DATABASE_URL or --database-url is required unless --in-memory is set")?;
        info!(max_connections = args.max_connections, "connecting to database");
        let pool = connect_and_migrate(&database_url, args.max_connections).await?;
        build_state(Arc::new(PgStore::new(pool)), config.clone())?
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
