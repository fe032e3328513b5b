//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::{StreamExt, TryStreamExt};
use mongodb::{Collection, Database, bson::doc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::Product;
use crate::repository::{ProductRepository, ProductStream};

pub const DEFAULT_COLLECTION: &str = "product";

/// Stored shape of a product; the id is kept as its string form in `_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
}

impl ProductDocument {
    fn from_product(id: Uuid, product: &Product) -> Self {
        Self {
            id: id.to_string(),
            name: product.name.clone(),
            price: product.price,
            date: product.date,
        }
    }
}

impl TryFrom<ProductDocument> for Product {
    type Error = ProductError;

    fn try_from(document: ProductDocument) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&document.id).map_err(|e| {
            ProductError::Database(format!("stored product id '{}' is invalid: {}", document.id, e))
        })?;

        Ok(Product {
            id: Some(id),
            name: document.name,
            price: document.price,
            date: document.date,
        })
    }
}

/// Convert a stored document, skipping records this service cannot address.
///
/// The collection can hold documents written by other clients (ObjectId `_id`s,
/// for instance); one such record must not hide the rest of the listing.
fn readable_product(document: ProductDocument) -> Option<Product> {
    let id = document.id.clone();
    match Product::try_from(document) {
        Ok(product) => Some(product),
        Err(e) => {
            tracing::warn!(document_id = %id, error = %e, "Skipping unreadable product document");
            None
        }
    }
}

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<ProductDocument>,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository on the default collection
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, DEFAULT_COLLECTION)
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<ProductDocument>(collection_name);
        Self { collection }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn stream_all(&self) -> ProductResult<ProductStream> {
        let cursor = self.collection.find(doc! {}).await?;

        Ok(cursor
            .map_err(ProductError::from)
            .try_filter_map(|document| async move { Ok(readable_product(document)) })
            .boxed())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        self.collection
            .find_one(doc! { "_id": id.to_string() })
            .await?
            .map(Product::try_from)
            .transpose()
    }

    #[instrument(skip(self, product), fields(product_name = %product.name))]
    async fn save(&self, mut product: Product) -> ProductResult<Product> {
        let id = *product.id.get_or_insert_with(Uuid::now_v7);
        let document = ProductDocument::from_product(id, &product);

        self.collection
            .replace_one(doc! { "_id": document.id.as_str() }, &document)
            .upsert(true)
            .await?;

        tracing::debug!(product_id = %id, "Product saved");
        Ok(product)
    }

    #[instrument(skip(self, product), fields(product_id = ?product.id))]
    async fn delete(&self, product: &Product) -> ProductResult<()> {
        let id = product
            .id
            .ok_or_else(|| ProductError::Internal("cannot delete an unsaved product".to_string()))?;

        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() })
            .await?;

        tracing::debug!(deleted = result.deleted_count, "Product delete finished");
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %self.collection.name()))]
    async fn drop_collection(&self) -> ProductResult<()> {
        self.collection.drop().await?;
        tracing::info!("Product collection dropped");
        Ok(())
    }
}
