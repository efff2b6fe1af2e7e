use std::sync::{Arc, Mutex};

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use wayfare::config::AppConfig;
use wayfare::db;
use wayfare::handlers;
use wayfare::services::credentials::{Argon2Verifier, CredentialVerifier};
use wayfare::services::ids::SqliteSequenceAllocator;
use wayfare::services::mailer::http_api::HttpApiMailer;
use wayfare::services::mailer::{LogMailer, Mailer};
use wayfare::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let credentials: Box<dyn CredentialVerifier> = Box::new(Argon2Verifier);

    let admin_hash = credentials.hash(&config.admin_password)?;
    db::admins::ensure_admin(&conn, &config.admin_email, &admin_hash)?;

    let mailer: Box<dyn Mailer> = if config.mail_api_url.is_empty() {
        tracing::info!("MAIL_API_URL not set, using log-only mailer");
        Box::new(LogMailer)
    } else {
        tracing::info!(url = %config.mail_api_url, "using HTTP API mailer");
        Box::new(HttpApiMailer::new(
            config.mail_api_url.clone(),
            config.mail_api_key.clone(),
            config.mail_from.clone(),
        ))
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        mailer,
        credentials,
        ids: Box::new(SqliteSequenceAllocator),
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
