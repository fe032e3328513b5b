//! API routes module

pub mod health;

use axum::Router;
use domain_products::{
    InMemoryProductRepository, MongoProductRepository, ProductRepository, ProductService,
    demo_products, handlers,
};
use tracing::info;

use crate::config::ProductsConfig;
use crate::state::AppState;

/// Create all API routes, seeding the store first when configured
pub async fn routes(state: &AppState) -> eyre::Result<Router> {
    let products_config = &state.config.products;

    let products = match &state.mongo {
        Some(mongo) => {
            let repository =
                MongoProductRepository::with_collection(&mongo.db, &products_config.collection);
            products_router(repository, products_config).await?
        }
        None => products_router(InMemoryProductRepository::new(), products_config).await?,
    };

    Ok(products.merge(health::router(state.clone())))
}

async fn products_router<R: ProductRepository + 'static>(
    repository: R,
    config: &ProductsConfig,
) -> eyre::Result<Router> {
    let service = ProductService::new(repository).with_update_validation(config.validate_on_update);

    if config.seed_demo_data {
        let seeded = service.seed(demo_products()).await?;
        info!(count = seeded.len(), "Demo products loaded");
    }

    Ok(handlers::router(service))
}
