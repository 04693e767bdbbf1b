//! Fetching product pages and reading prices and stock status out of them.

pub mod cache;
pub mod client;
pub mod collect;
pub mod error;
pub mod extract;
pub(crate) mod rate_limit;
pub mod site;
pub mod stock;

pub use cache::HttpCache;
pub use client::PageClient;
pub use collect::{analyze_page, collect_prices, SearchStatistics, UrlOutcome};
pub use error::ScraperError;
pub use extract::{extract_price, parse_price_string};
pub use site::SiteHandler;
pub use stock::is_out_of_stock;
