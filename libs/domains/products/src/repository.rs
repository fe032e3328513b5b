use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::Product;

/// Products yielded one at a time from the store
pub type ProductStream = BoxStream<'static, ProductResult<Product>>;

/// Repository trait for Product persistence
///
/// Key-addressed document store access. Implementations assign an id on the
/// first save of a record and replace the stored record on later saves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Every stored product, in store order.
    ///
    /// A failure to start the read is returned here; later failures arrive as stream items.
    async fn stream_all(&self) -> ProductResult<ProductStream>;

    /// Every stored product
    async fn find_all(&self) -> ProductResult<Vec<Product>> {
        self.stream_all().await?.try_collect().await
    }

    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Insert or replace; returns the stored record with its id
    async fn save(&self, product: Product) -> ProductResult<Product>;

    async fn delete(&self, product: &Product) -> ProductResult<()>;

    /// Remove the whole collection
    async fn drop_collection(&self) -> ProductResult<()>;
}

/// In-memory implementation of ProductRepository (for development/testing)
///
/// Ids are UUIDv7, so iteration order is insertion order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<BTreeMap<Uuid, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn stream_all(&self) -> ProductResult<ProductStream> {
        let snapshot: Vec<Product> = self.products.read().await.values().cloned().collect();
        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }

    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(&id).cloned())
    }

    async fn save(&self, mut product: Product) -> ProductResult<Product> {
        let id = *product.id.get_or_insert_with(Uuid::now_v7);

        let mut products = self.products.write().await;
        products.insert(id, product.clone());

        tracing::debug!(product_id = %id, "Saved product");
        Ok(product)
    }

    async fn delete(&self, product: &Product) -> ProductResult<()> {
        let id = product
            .id
            .ok_or_else(|| ProductError::Internal("cannot delete an unsaved product".to_string()))?;

        let mut products = self.products.write().await;
        if products.remove(&id).is_some() {
            tracing::debug!(product_id = %id, "Deleted product");
        }
        Ok(())
    }

    async fn drop_collection(&self) -> ProductResult<()> {
        self.products.write().await.clear();
        Ok(())
    }
}
