//! Application state management

use mongodb::{Client, Database};

/// Live MongoDB connection
#[derive(Clone)]
pub struct MongoHandle {
    pub client: Client,
    pub db: Database,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// `None` when products are kept in memory
    pub mongo: Option<MongoHandle>,
}
