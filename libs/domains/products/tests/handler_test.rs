//! Handler tests for Products domain
//!
//! These tests drive the products router over an in-memory store:
//! - Request deserialization and field validation
//! - Response bodies, status codes and headers
//! - Not-found handling for read, update and delete
//! - Store failures surfacing as 500 responses

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use domain_products::*;
use futures_util::stream::{self, StreamExt};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()
use uuid::Uuid;

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}

fn app(repo: &InMemoryProductRepository) -> Router {
    handlers::router(ProductService::new(repo.clone()))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn product_uri(id: impl std::fmt::Display) -> String {
    format!("{}/{}", API_V1_PRODUCTS, id)
}

#[tokio::test]
async fn test_create_returns_201_with_location_and_date() {
    let repo = InMemoryProductRepository::new();

    let response = app(&repo)
        .oneshot(json_request(
            "POST",
            API_V1_PRODUCTS,
            json!({ "name": "MacBook Air", "price": 999.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();

    let product: Product = json_body(response.into_body()).await;
    let id = product.id.expect("created product has an id");
    assert_eq!(location, product_uri(id));
    assert_eq!(product.name, "MacBook Air");
    assert_eq!(product.price, 999.0);
    assert_eq!(product.date, Some(Utc::now().date_naive()));
}

#[tokio::test]
async fn test_create_with_empty_name_returns_400_and_leaves_store_untouched() {
    let repo = InMemoryProductRepository::new();

    let response = app(&repo)
        .oneshot(json_request(
            "POST",
            API_V1_PRODUCTS,
            json!({ "name": "", "price": 10 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors: Vec<String> = json_body(response.into_body()).await;
    assert_eq!(errors, vec!["The field 'name' must not be empty"]);
    assert!(repo.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_reports_every_invalid_field_in_order() {
    let repo = InMemoryProductRepository::new();

    let response = app(&repo)
        .oneshot(json_request("POST", API_V1_PRODUCTS, json!({ "price": -5 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors: Vec<String> = json_body(response.into_body()).await;
    assert_eq!(
        errors,
        vec![
            "The field 'name' must not be empty",
            "The field 'price' must be greater than 0",
        ]
    );
}

#[tokio::test]
async fn test_create_with_malformed_body_returns_400() {
    let repo = InMemoryProductRepository::new();

    let request = Request::builder()
        .method("POST")
        .uri(API_V1_PRODUCTS)
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app(&repo).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(&repo)
        .oneshot(json_request(
            "POST",
            API_V1_PRODUCTS,
            json!({ "name": "iMac", "price": "cheap" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["error"], "INVALID_JSON");
    assert!(repo.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_empty_store_returns_empty_array() {
    let repo = InMemoryProductRepository::new();

    let response = app(&repo)
        .oneshot(empty_request("GET", API_V1_PRODUCTS))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let products: Vec<Product> = json_body(response.into_body()).await;
    assert!(products.is_empty());
}

#[tokio::test]
async fn test_list_returns_seeded_products() {
    let repo = InMemoryProductRepository::new();
    ProductService::new(repo.clone())
        .seed(demo_products())
        .await
        .unwrap();

    let response = app(&repo)
        .oneshot(empty_request("GET", API_V1_PRODUCTS))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let products: Vec<Product> = json_body(response.into_body()).await;
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["MacBook Air", "MacBook Pro", "iMac", "iMac Pro"]);
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let repo = InMemoryProductRepository::new();

    let response = app(&repo)
        .oneshot(json_request(
            "POST",
            API_V1_PRODUCTS,
            json!({ "name": "iMac", "price": 1499.0 }),
        ))
        .await
        .unwrap();
    let created: Product = json_body(response.into_body()).await;

    let response = app(&repo)
        .oneshot(empty_request("GET", &product_uri(created.id.unwrap())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Product = json_body(response.into_body()).await;
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_unknown_ids_return_404_with_empty_body() {
    let repo = InMemoryProductRepository::new();
    let missing = product_uri(uuid::Uuid::now_v7());

    let requests = vec![
        empty_request("GET", &missing),
        json_request("PUT", &missing, json!({ "name": "iMac", "price": 1.0 })),
        empty_request("DELETE", &missing),
        empty_request("GET", &product_uri("not-a-uuid")),
    ];

    for request in requests {
        let response = app(&repo).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_bytes(response.into_body()).await.is_empty());
    }
}

#[tokio::test]
async fn test_update_unknown_id_with_malformed_body_returns_404() {
    let repo = InMemoryProductRepository::new();

    let request = Request::builder()
        .method("PUT")
        .uri(product_uri(uuid::Uuid::now_v7()))
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app(&repo).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_twice_is_idempotent() {
    let repo = InMemoryProductRepository::new();
    let saved = ProductService::new(repo.clone())
        .create_product(ProductPayload::new("iMac", 1499.0))
        .await
        .unwrap();
    let uri = product_uri(saved.id.unwrap());
    let payload = json!({ "name": "iMac 24", "price": 1299.0 });

    for _ in 0..2 {
        let response = app(&repo)
            .oneshot(json_request("PUT", &uri, payload.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let stored = repo.find_by_id(saved.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.id, saved.id);
    assert_eq!(stored.name, "iMac 24");
    assert_eq!(stored.price, 1299.0);
    assert_eq!(repo.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_does_not_validate_by_default() {
    let repo = InMemoryProductRepository::new();
    let saved = ProductService::new(repo.clone())
        .create_product(ProductPayload::new("iMac", 1499.0))
        .await
        .unwrap();

    let response = app(&repo)
        .oneshot(json_request(
            "PUT",
            &product_uri(saved.id.unwrap()),
            json!({ "name": "", "price": 0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let updated: Product = json_body(response.into_body()).await;
    assert_eq!(updated.name, "");
}

#[tokio::test]
async fn test_update_validates_when_enabled() {
    let repo = InMemoryProductRepository::new();
    let service = ProductService::new(repo.clone()).with_update_validation(true);
    let saved = service
        .create_product(ProductPayload::new("iMac", 1499.0))
        .await
        .unwrap();

    let response = handlers::router(service)
        .oneshot(json_request(
            "PUT",
            &product_uri(saved.id.unwrap()),
            json!({ "name": "", "price": 1499.0 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors: Vec<String> = json_body(response.into_body()).await;
    assert_eq!(errors, vec!["The field 'name' must not be empty"]);

    let stored = repo.find_by_id(saved.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.name, "iMac");
}

#[tokio::test]
async fn test_create_update_delete_get_lifecycle() {
    let repo = InMemoryProductRepository::new();

    let response = app(&repo)
        .oneshot(json_request(
            "POST",
            API_V1_PRODUCTS,
            json!({ "name": "MacBook Air", "price": 999.00 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Product = json_body(response.into_body()).await;
    assert_eq!(created.name, "MacBook Air");
    let id = created.id.unwrap();
    let uri = product_uri(id);

    let response = app(&repo)
        .oneshot(json_request(
            "PUT",
            &uri,
            json!({ "name": "MacBook Air", "price": 899.00 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Product = json_body(response.into_body()).await;
    assert_eq!(updated.price, 899.0);
    assert_eq!(updated.id, Some(id));

    let response = app(&repo)
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response.into_body()).await.is_empty());

    let response = app(&repo)
        .oneshot(empty_request("GET", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collection_path_accepts_trailing_slash() {
    let repo = InMemoryProductRepository::new();
    let collection = format!("{}/", API_V1_PRODUCTS);

    let response = app(&repo)
        .oneshot(json_request(
            "POST",
            &collection,
            json!({ "name": "iMac", "price": 1299.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app(&repo)
        .oneshot(empty_request("GET", &collection))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let products: Vec<Product> = json_body(response.into_body()).await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "iMac");
}

/// A store whose backend is unreachable
struct UnreachableStore;

fn unreachable() -> ProductError {
    ProductError::Database("connection refused".to_string())
}

#[async_trait::async_trait]
impl ProductRepository for UnreachableStore {
    async fn stream_all(&self) -> ProductResult<ProductStream> {
        Err(unreachable())
    }

    async fn find_by_id(&self, _id: Uuid) -> ProductResult<Option<Product>> {
        Err(unreachable())
    }

    async fn save(&self, _product: Product) -> ProductResult<Product> {
        Err(unreachable())
    }

    async fn delete(&self, _product: &Product) -> ProductResult<()> {
        Err(unreachable())
    }

    async fn drop_collection(&self) -> ProductResult<()> {
        Err(unreachable())
    }
}

#[tokio::test]
async fn test_store_failure_returns_500_database_error() {
    let requests = vec![
        empty_request("GET", API_V1_PRODUCTS),
        json_request(
            "POST",
            API_V1_PRODUCTS,
            json!({ "name": "MacBook Air", "price": 999.0 }),
        ),
        empty_request("GET", &product_uri(Uuid::now_v7())),
        json_request(
            "PUT",
            &product_uri(Uuid::now_v7()),
            json!({ "name": "MacBook Air", "price": 999.0 }),
        ),
        empty_request("DELETE", &product_uri(Uuid::now_v7())),
    ];

    for request in requests {
        let target = format!("{} {}", request.method(), request.uri());
        let response = handlers::router(ProductService::new(UnreachableStore))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "{target}"
        );
        let body: Value = json_body(response.into_body()).await;
        assert_eq!(body["error"], "DATABASE_ERROR", "{target}");
        assert!(
            !body["message"].as_str().unwrap().contains("connection refused"),
            "{target}"
        );
    }
}

/// A store that fails after handing out its first record
struct FlakyStore(Product);

#[async_trait::async_trait]
impl ProductRepository for FlakyStore {
    async fn stream_all(&self) -> ProductResult<ProductStream> {
        let items = vec![Ok(self.0.clone()), Err(unreachable())];
        Ok(stream::iter(items).boxed())
    }

    async fn find_by_id(&self, _id: Uuid) -> ProductResult<Option<Product>> {
        Ok(Some(self.0.clone()))
    }

    async fn save(&self, product: Product) -> ProductResult<Product> {
        Ok(product)
    }

    async fn delete(&self, _product: &Product) -> ProductResult<()> {
        Ok(())
    }

    async fn drop_collection(&self) -> ProductResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_list_failing_mid_read_cuts_the_body_short() {
    let product = Product {
        id: Some(Uuid::now_v7()),
        name: "MacBook Pro".to_string(),
        price: 2499.0,
        date: None,
    };

    let response = handlers::router(ProductService::new(FlakyStore(product)))
        .oneshot(empty_request("GET", API_V1_PRODUCTS))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.into_body().collect().await.is_err());
}
