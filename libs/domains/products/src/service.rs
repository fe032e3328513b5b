//! Product Service - Business logic layer

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductPayload, validate_payload};
use crate::repository::{ProductRepository, ProductStream};

/// Product service providing the CRUD operations.
///
/// Create validates the payload before touching the store. Update merges the
/// payload into the stored record and only validates when
/// [`with_update_validation`](Self::with_update_validation) is enabled.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    validate_on_update: bool,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            validate_on_update: false,
        }
    }

    /// Run the field rules on update payloads as well
    pub fn with_update_validation(mut self, enabled: bool) -> Self {
        self.validate_on_update = enabled;
        self
    }

    /// Stamp today's date and persist
    async fn save(&self, mut product: Product) -> ProductResult<Product> {
        product.date = Some(Utc::now().date_naive());
        self.repository.save(product).await
    }

    /// Every stored product, read lazily from the store
    #[instrument(skip(self))]
    pub async fn stream_products(&self) -> ProductResult<ProductStream> {
        self.repository.stream_all().await
    }

    /// Look up a product by its path id.
    ///
    /// An id that is not a UUID cannot name a stored record and is reported as not found.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> ProductResult<Product> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return Err(ProductError::NotFound(id.to_string()));
        };

        self.repository
            .find_by_id(uuid)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    #[instrument(skip(self, payload), fields(product_name = %payload.name))]
    pub async fn create_product(&self, payload: ProductPayload) -> ProductResult<Product> {
        let errors = validate_payload(&payload);
        if !errors.is_empty() {
            return Err(ProductError::Validation(errors));
        }

        let product = self.save(Product::from(payload)).await?;
        tracing::info!(product_id = ?product.id, "Product created");
        Ok(product)
    }

    /// Merge `incoming` into the stored product and save it.
    ///
    /// The lookup runs first, so an unknown id is reported as not found even
    /// when the body failed to decode.
    #[instrument(skip(self, incoming))]
    pub async fn update_product(
        &self,
        id: &str,
        incoming: ProductResult<ProductPayload>,
    ) -> ProductResult<Product> {
        let existing = self.get_product(id).await?;
        let incoming = incoming?;

        if self.validate_on_update {
            let errors = validate_payload(&incoming);
            if !errors.is_empty() {
                return Err(ProductError::Validation(errors));
            }
        }

        let product = self.save(existing.merge(incoming)).await?;
        tracing::info!(product_id = %id, "Product updated");
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> ProductResult<()> {
        let existing = self.get_product(id).await?;
        self.repository.delete(&existing).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Empty the store and load `products` into it
    #[instrument(skip(self, products))]
    pub async fn seed(&self, products: Vec<ProductPayload>) -> ProductResult<Vec<Product>> {
        self.repository.drop_collection().await?;

        let mut saved = Vec::with_capacity(products.len());
        for payload in products {
            let product = self.save(Product::from(payload)).await?;
            tracing::info!(product_id = ?product.id, name = %product.name, "Seeded product");
            saved.push(product);
        }
        Ok(saved)
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            validate_on_update: self.validate_on_update,
        }
    }
}
