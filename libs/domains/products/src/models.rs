use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Product record as stored and returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Assigned by the store on first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    pub price: f64,
    /// Set server-side on every save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "2024-05-01")]
    pub date: Option<NaiveDate>,
}

/// Request body for create and update.
///
/// Missing fields decode to their zero value so that they surface as field
/// errors rather than decode failures.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
pub struct ProductPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    #[schema(example = "MacBook Air")]
    pub name: String,

    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    #[schema(example = 999.0)]
    pub price: f64,
}

impl ProductPayload {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// A constraint violation tied to one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "The field '{}' {}", self.field, self.message)
    }
}

/// Declaration order of the validated fields; errors are reported in this order.
const VALIDATED_FIELDS: [&str; 2] = ["name", "price"];

/// Check a payload against the product rules.
///
/// Returns an empty list when the payload is valid.
pub fn validate_payload(payload: &ProductPayload) -> Vec<FieldError> {
    let Err(errors) = payload.validate() else {
        return Vec::new();
    };
    let by_field = errors.field_errors();
    debug_assert!(
        by_field.keys().all(|field| VALIDATED_FIELDS.contains(&field.as_ref())),
        "validated field missing from VALIDATED_FIELDS: {:?}",
        by_field.keys().collect::<Vec<_>>()
    );

    VALIDATED_FIELDS
        .iter()
        .filter_map(|field| by_field.get(*field).map(|errs| (*field, errs)))
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_deref()
                    .map(str::to_string)
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect()
}

impl From<ProductPayload> for Product {
    fn from(payload: ProductPayload) -> Self {
        Self {
            id: None,
            name: payload.name,
            price: payload.price,
            date: None,
        }
    }
}

impl Product {
    /// Overwrite the mutable fields with the incoming values, keeping id and date.
    pub fn merge(mut self, incoming: ProductPayload) -> Self {
        self.name = incoming.name;
        self.price = incoming.price;
        self
    }
}

/// Catalogue loaded into an empty store at startup
pub fn demo_products() -> Vec<ProductPayload> {
    vec![
        ProductPayload::new("MacBook Air", 999.0),
        ProductPayload::new("MacBook Pro", 1299.0),
        ProductPayload::new("iMac", 1499.0),
        ProductPayload::new("iMac Pro", 4999.0),
    ]
}
