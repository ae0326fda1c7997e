//! Dropship Orders - checkout, supplier mapping and order review service

use anyhow::{Context, Result};
use dropship_orders::api::{self, AppState, OrderLocks};
use dropship_orders::config::Config;
use dropship_orders::extract::Extractor;
use dropship_orders::store::{InMemoryOrderStore, OrderStore, PgOrderStore};
use dropship_orders::supplier::{EventPublisher, LoggingPublisher, NatsPublisher, SupplierGateway, SupplierSpecBuilder};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let catalog = config.load_catalog().context("loading catalog")?;
    tracing::info!(products = catalog.len(), source = config.catalog_path.as_deref().unwrap_or("embedded"), "catalog loaded");

    let store: Arc<dyn OrderStore> = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(10).connect(url).await.context("connecting to postgres")?;
            let store = PgOrderStore::new(db);
            store.migrate().await?;
            tracing::info!("using postgres order store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory only");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    let (gateway, events): (Arc<dyn SupplierGateway>, Arc<dyn EventPublisher>) = match &config.nats_url {
        Some(url) => {
            let client = async_nats::connect(url.as_str()).await.context("connecting to nats")?;
            let publisher = NatsPublisher::new(client, config.nats_subject_prefix.clone());
            tracing::info!(subject = %publisher.supplier_subject(), "publishing supplier requests to nats");
            let gateway: Arc<dyn SupplierGateway> = Arc::new(publisher.clone());
            let events: Arc<dyn EventPublisher> = Arc::new(publisher);
            (gateway, events)
        }
        None => {
            tracing::warn!("NATS_URL not set, supplier requests and events are only logged");
            let publisher = LoggingPublisher::new();
            let gateway: Arc<dyn SupplierGateway> = Arc::new(publisher.clone());
            let events: Arc<dyn EventPublisher> = Arc::new(publisher);
            (gateway, events)
        }
    };

    let state = AppState {
        catalog: Arc::new(catalog),
        store,
        builder: SupplierSpecBuilder::new(config.supplier.clone()),
        gateway,
        events,
        extractor: Arc::new(Extractor::new()),
        locks: Arc::new(OrderLocks::new()),
    };

    let app = api::router(state).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    tracing::info!("🚀 Dropship Orders listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?, app).await?;
    Ok(())
}
