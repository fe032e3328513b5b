use mongodb::Client;
use std::time::Instant;

use super::connector::ping;

/// Result of a MongoDB health probe
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Error details when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Ping with timing and error details
pub async fn check_health_detailed(client: &Client, database: &str) -> HealthStatus {
    let start = Instant::now();
    let result = ping(client, database).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    HealthStatus {
        healthy: result.is_ok(),
        message: result.err().map(|e| e.to_string()),
        response_time_ms,
    }
}
