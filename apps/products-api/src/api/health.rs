//! Readiness endpoint

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use serde_json::Value;

use crate::state::AppState;

type ReadyResult = Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)>;

/// 200 once every backing service answers, 503 otherwise
async fn ready(State(state): State<AppState>) -> ReadyResult {
    let mut checks: Vec<(&str, HealthCheckFuture)> = Vec::new();

    if let Some(mongo) = &state.mongo {
        checks.push((
            "mongodb",
            Box::pin(async move {
                let status =
                    database::mongodb::check_health_detailed(&mongo.client, mongo.db.name()).await;
                tracing::debug!(
                    healthy = status.healthy,
                    response_time_ms = status.response_time_ms,
                    "MongoDB readiness probe"
                );
                if status.healthy {
                    Ok(())
                } else {
                    Err(status.message.unwrap_or_else(|| "ping failed".to_string()))
                }
            }),
        ));
    }

    run_health_checks(checks).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .with_state(state)
}
