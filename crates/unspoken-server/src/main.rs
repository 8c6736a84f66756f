mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::{info, warn};

use unspoken_api::{AppStateInner, build_provider, router};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "unspoken=debug,unspoken_api=debug,unspoken_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_placeholder_secret() {
        warn!("UNSPOKEN_JWT_SECRET is not set; session tokens use a development secret");
    }

    // Init database
    let db = unspoken_db::Database::open(&PathBuf::from(&config.db_path))?;
    if config.seed && db.seed_if_empty()? {
        info!("Seeded sample circles, users and journal entries");
    }

    let chat = build_provider(config.echo.provider, config.echo.api_key, config.echo.model);
    match &chat {
        Some(provider) => info!("Echo companion backed by {}", provider.name()),
        None => warn!(
            "No API key for {:?}; Echo will answer with the setup message",
            config.echo.provider
        ),
    }
    if config.sessions.require_session {
        info!("Session tokens are required for user-scoped requests");
    }

    let state = AppStateInner::new(db, chat, config.sessions);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Unspoken server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
