use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod credentials;
mod routes;
mod validation;

use common::{
    settings::{Settings, connect_secret_store},
    shutdown::shutdown_signal,
    token::TokenService,
};

use crate::credentials::CredentialValidator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub credential_validator: CredentialValidator,
    pub token_service: TokenService,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting login service");

    let settings = Settings::load(3000)?;

    // Initialize the secret store shared by credential checks and token signing
    let secrets = connect_secret_store(&settings).await?;

    let app_state = AppState {
        credential_validator: CredentialValidator::new(secrets.clone()),
        token_service: TokenService::new(secrets),
    };

    info!("Login service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Login service listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
