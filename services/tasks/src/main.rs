use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;

use common::{
    settings::{Settings, connect_secret_store, connect_table_store},
    shutdown::shutdown_signal,
    token::TokenService,
};

use crate::{repositories::TaskRepository, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting task service");

    let settings = Settings::load(3001)?;

    // The signing key is read from the secret store on every verification
    let secrets = connect_secret_store(&settings).await?;
    let table = connect_table_store(&settings).await?;

    let app_state = AppState {
        token_service: TokenService::new(secrets),
        task_repository: TaskRepository::new(table),
    };

    info!("Task service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Task service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
