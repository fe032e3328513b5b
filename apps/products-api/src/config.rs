//! Configuration for Products API

use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse_or, server::ServerConfig};
use database::mongodb::MongoConfig;
use strum::{Display, EnumString};

pub use core_config::Environment;

/// Backing store for product records
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreKind {
    #[default]
    Mongodb,
    Memory,
}

/// Products domain settings
#[derive(Clone, Debug)]
pub struct ProductsConfig {
    pub store: StoreKind,
    pub collection: String,
    /// Drop the collection and load the demo catalogue at startup
    pub seed_demo_data: bool,
    pub validate_on_update: bool,
}

impl FromEnv for ProductsConfig {
    /// - PRODUCTS_STORE: `mongodb` (default) or `memory`
    /// - PRODUCTS_COLLECTION: defaults to `product`
    /// - PRODUCTS_SEED_DEMO_DATA: defaults to true
    /// - PRODUCTS_VALIDATE_ON_UPDATE: defaults to false
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: env_parse_or("PRODUCTS_STORE", StoreKind::default())?,
            collection: env_or_default(
                "PRODUCTS_COLLECTION",
                domain_products::mongodb::DEFAULT_COLLECTION,
            ),
            seed_demo_data: env_parse_or("PRODUCTS_SEED_DEMO_DATA", true)?,
            validate_on_update: env_parse_or("PRODUCTS_VALIDATE_ON_UPDATE", false)?,
        })
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub products: ProductsConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mut mongodb = MongoConfig::from_env()?;
        if mongodb.app_name.is_none() {
            mongodb = mongodb.with_app_name(env!("CARGO_PKG_NAME"));
        }
        let server = ServerConfig::from_env()?;
        let products = ProductsConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            mongodb,
            server,
            environment,
            products,
        })
    }
}
