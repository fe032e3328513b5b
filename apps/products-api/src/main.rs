//! Products API - REST server over MongoDB

use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::{Config, StoreKind};
use state::{AppState, MongoHandle};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let mongo = match config.products.store {
        StoreKind::Mongodb => {
            info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());

            let client =
                database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
            let db = client.database(config.mongodb.database());

            info!(
                "Successfully connected to MongoDB database: {}",
                config.mongodb.database()
            );
            Some(MongoHandle { client, db })
        }
        StoreKind::Memory => {
            info!("Using in-memory product store");
            None
        }
    };

    let state = AppState {
        config: config.clone(),
        mongo,
    };

    let api_routes = api::routes(&state).await?;
    let app = create_router::<openapi::ApiDoc>(api_routes, &state.config.server)?
        .merge(health_router(state.config.app));

    info!(
        "Starting {} v{} on {}",
        state.config.app.name,
        state.config.app.version,
        state.config.server.address()
    );

    let mongo = state.mongo.clone();
    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30),
        async move {
            if let Some(mongo) = mongo {
                info!("Shutting down: closing MongoDB connections");
                mongo.client.shutdown().await;
                info!("MongoDB connection closed");
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Products API shutdown complete");
    Ok(())
}
