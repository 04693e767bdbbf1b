pub mod app_config;
pub mod catalog;
pub mod config;
pub mod prices;
pub mod product_info;
pub mod shipping_file;
pub mod store;

use thiserror::Error;

pub use app_config::{AppConfig, DelayRange};
pub use catalog::{filter_by_products, filter_by_sites, load_products, ProductCatalog, ProductEntry};
pub use config::{load_app_config, load_app_config_from_env};
pub use prices::{PriceOption, VariantPrices};
pub use product_info::{format_volume, parse_product_name, price_per_100ml, ProductSize};
pub use shipping_file::{load_shipping_entries, ShippingEntry};
pub use store::{normalize_site, store_identity, strip_www};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read products file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse products file {path}: {source}")]
    CatalogFileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to read shipping file {path}: {source}")]
    ShippingFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse shipping file {path}: {source}")]
    ShippingFileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config validation failed: {0}")]
    Validation(String),
}
