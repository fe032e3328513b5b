//! HTTP handlers for Products API

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use axum_helpers::errors::responses::{BadRequestJsonResponse, InternalServerErrorResponse};
use futures_util::{
    Stream,
    stream::{self, StreamExt, TryStreamExt},
};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductPayload};
use crate::repository::{ProductRepository, ProductStream};
use crate::service::ProductService;

/// Collection base path; the Location of a created product is `{API_V1_PRODUCTS}/{id}`.
pub const API_V1_PRODUCTS: &str = "/api/v1/products";
const API_V1_PRODUCTS_SLASH: &str = "/api/v1/products/";
const API_V1_PRODUCT: &str = "/api/v1/products/{id}";

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        get_product,
        create_product,
        update_product,
        delete_product,
    ),
    components(
        schemas(Product, ProductPayload),
        responses(BadRequestJsonResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "Products", description = "Product management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route(API_V1_PRODUCTS, get(list_products).post(create_product))
        .route(API_V1_PRODUCTS_SLASH, get(list_products).post(create_product))
        .route(
            API_V1_PRODUCT,
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(shared_service)
}

/// List every product
#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    responses(
        (status = 200, description = "All products, possibly empty", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> ProductResult<impl IntoResponse> {
    info!("Finding all products");
    let products = service.stream_products().await?;
    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(json_array(products)),
    ))
}

/// Encode products as one JSON array, a chunk per product.
///
/// Once the status line is sent a failing read can only cut the body short.
fn json_array(products: ProductStream) -> impl Stream<Item = ProductResult<Bytes>> + Send {
    let items = products.enumerate().map(|(index, item)| -> ProductResult<Bytes> {
        let mut chunk = if index == 0 { Vec::new() } else { b",".to_vec() };
        serde_json::to_writer(&mut chunk, &item?)
            .map_err(|e| ProductError::Internal(e.to_string()))?;
        Ok(Bytes::from(chunk))
    });

    stream::once(async { Ok::<_, ProductError>(Bytes::from_static(b"[")) })
        .chain(items)
        .chain(stream::once(async { Ok(Bytes::from_static(b"]")) }))
        .inspect_err(|e| error!(error = %e, "Product listing aborted mid-stream"))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, description = "No product with this id (empty body)"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(id): Path<String>,
) -> ProductResult<Json<Product>> {
    info!(product_id = %id, "Finding product by id");
    let product = service.get_product(&id).await?;
    Ok(Json(product))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    tag = "Products",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Product created", body = Product,
            headers(("Location" = String, description = "URI of the new product"))),
        (status = 400, description = "Field errors as formatted messages, or a malformed body",
            body = Vec<String>, example = json!(["The field 'name' must not be empty"])),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> ProductResult<impl IntoResponse> {
    info!("Creating a new product");
    let Json(payload) = payload?;
    let product = service.create_product(payload).await?;

    let id = product
        .id
        .ok_or_else(|| ProductError::Internal("store returned a product without an id".to_string()))?;
    let location = format!("{}/{}", API_V1_PRODUCTS, id);

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(product)))
}

/// Replace a product's name and price
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, response = BadRequestJsonResponse),
        (status = 404, description = "No product with this id (empty body)"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(id): Path<String>,
    payload: Result<Json<ProductPayload>, JsonRejection>,
) -> ProductResult<Json<Product>> {
    info!(product_id = %id, "Updating the product");
    let incoming = payload.map(|Json(p)| p).map_err(ProductError::from);
    let product = service.update_product(&id, incoming).await?;
    Ok(Json(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "No product with this id (empty body)"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(id): Path<String>,
) -> ProductResult<StatusCode> {
    info!(product_id = %id, "Deleting the product");
    service.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
