//! Sweet Shop - storefront API server

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sweetshop::services::{EventBus, TokenKeys};
use sweetshop::{app, AppState, Config, Stores};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let stores = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(config.database_max_connections).connect(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            info!("connected to postgres");
            Stores::postgres(db)
        }
        None => {
            warn!("DATABASE_URL not set, data is kept in memory only");
            Stores::memory()
        }
    };

    let events = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => EventBus::nats(client),
            Err(e) => {
                warn!(error = %e, "nats unavailable, events disabled");
                EventBus::disabled()
            }
        },
        None => EventBus::disabled(),
    };

    let state = AppState::new(stores, TokenKeys::new(&config.jwt_secret, config.jwt_ttl), events);
    if let Some((username, password)) = config.admin_seed() {
        state.accounts.ensure_admin(username, password).await?;
    }

    let addr = format!("0.0.0.0:{}", config.port);
    info!("sweetshop listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app(state)).await?;
    Ok(())
}
