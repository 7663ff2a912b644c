//! OpenSASE Storefront - catalog, cart and checkout service

use std::sync::Arc;

use anyhow::Result;
use opensase_storefront::http::{router, AppState};
use opensase_storefront::messaging::{EventPublisher, NatsPublisher, NoopPublisher};
use opensase_storefront::store::{MemoryStore, PgStore};
use opensase_storefront::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let events: Arc<dyn EventPublisher> = match &config.nats_url {
        Some(url) => match NatsPublisher::connect(url).await {
            Ok(publisher) => Arc::new(publisher),
            Err(e) => {
                tracing::warn!("NATS unavailable at {url}, order events disabled: {e}");
                Arc::new(NoopPublisher)
            }
        },
        None => Arc::new(NoopPublisher),
    };

    let state = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections).await?;
            AppState::new(Arc::new(store), events, &config.admin_role)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            AppState::new(Arc::new(MemoryStore::new()), events, &config.admin_role)
        }
    };

    let addr = config.bind_addr();
    tracing::info!("OpenSASE Storefront listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, router(state)).await?;
    Ok(())
}
