//! Clinic Queue server.
//!
//! Reads `CLINIC_QUEUE__*` configuration, wires storage (PostgreSQL when a
//! database is configured, in-memory otherwise), the broadcast hub and the
//! queue service, then serves HTTP and the websocket feed until Ctrl-C or
//! SIGTERM.

use std::error::Error;
use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clinic_queue::adapters::auth::JwtSessionValidator;
use clinic_queue::adapters::http::{app_router, RouterOptions};
use clinic_queue::adapters::memory::{
    InMemoryClinicDirectory, InMemoryTokenRepository, InMemoryTokenSequencer,
};
use clinic_queue::adapters::postgres::{
    PostgresClinicDirectory, PostgresTokenRepository, PostgresTokenSequencer,
};
use clinic_queue::adapters::websocket::{BroadcastHub, HubConfig};
use clinic_queue::application::{QueueService, QueueServicePorts};
use clinic_queue::config::{AppConfig, DatabaseConfig, QueueConfig, ServerConfig};
use clinic_queue::ports::{ClinicDirectory, TokenRepository, TokenSequencer};

type Storage = (
    Arc<dyn TokenRepository>,
    Arc<dyn ClinicDirectory>,
    Arc<dyn TokenSequencer>,
);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let hub = Arc::new(BroadcastHub::new(HubConfig {
        send_timeout: config.queue.broadcast_send_timeout(),
    }));

    let (tokens, directory, sequencer) = match &config.database {
        Some(database) => postgres_storage(database, &config.queue).await?,
        None => {
            tracing::warn!("No database configured, using in-memory storage");
            memory_storage(&config.queue)
        }
    };

    let queue = Arc::new(QueueService::new(QueueServicePorts {
        tokens,
        directory: directory.clone(),
        sequencer,
        publisher: hub.clone(),
        subscribers: hub.clone(),
    }));
    let sessions = Arc::new(JwtSessionValidator::new(&config.auth.jwt_secret, directory));

    let options = RouterOptions {
        cors_origins: config.server.cors_origins_list(),
        request_timeout: Some(config.server.request_timeout()),
    };
    let app = app_router(queue, sessions, &options);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Clinic queue listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    hub.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(server.log_level.clone()));

    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn memory_storage(queue: &QueueConfig) -> Storage {
    let tokens: Arc<dyn TokenRepository> = Arc::new(InMemoryTokenRepository::new());
    let directory: Arc<dyn ClinicDirectory> = Arc::new(InMemoryClinicDirectory::new());
    let sequencer: Arc<dyn TokenSequencer> = Arc::new(InMemoryTokenSequencer::with_timeout(
        tokens.clone(),
        queue.sequencer_acquire_timeout(),
    ));
    (tokens, directory, sequencer)
}

async fn postgres_storage(
    database: &DatabaseConfig,
    queue: &QueueConfig,
) -> Result<Storage, Box<dyn Error>> {
    let pool = database
        .pool_options()
        .connect(database.url.expose_secret())
        .await?;

    if database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let tokens: Arc<dyn TokenRepository> = Arc::new(PostgresTokenRepository::new(pool.clone()));
    let directory: Arc<dyn ClinicDirectory> =
        Arc::new(PostgresClinicDirectory::new(pool.clone()));
    let sequencer: Arc<dyn TokenSequencer> = Arc::new(PostgresTokenSequencer::new(
        pool,
        queue.sequencer_acquire_timeout(),
    ));
    Ok((tokens, directory, sequencer))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
