use std::path::PathBuf;

use rust_decimal::Decimal;

/// Inclusive range, in seconds, a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    #[must_use]
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// A range that never sleeps. Handy for tests against local mock servers.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.max_secs <= 0.0
    }
}

/// Process-wide settings, built once at startup and passed down explicitly.
///
/// See [`crate::config::load_app_config`] for the `DEALCRAWL_*` variables
/// that populate each field.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Extracted prices at or below this value are treated as noise.
    pub min_price: Decimal,
    /// Extracted prices at or above this value are treated as noise.
    pub max_price: Decimal,
    pub request_timeout_secs: u64,
    /// Additional attempts after the first failure for transient fetch errors.
    pub max_retries: u32,
    pub cache_duration_secs: u64,
    pub cache_file: PathBuf,
    pub products_file: PathBuf,
    pub shipping_file: PathBuf,
    /// Flat shipping applied to stores missing from the shipping file.
    pub default_shipping_cost: Decimal,
    pub default_delay: DelayRange,
    /// notino.pt runs aggressive bot detection and needs longer pauses.
    pub notino_delay: DelayRange,
    pub retry_delay: DelayRange,
    pub user_agent: String,
    pub log_level: String,
}

impl AppConfig {
    /// Returns `true` when `price` lies strictly inside `(min_price, max_price)`.
    #[must_use]
    pub fn price_in_range(&self, price: Decimal) -> bool {
        price > self.min_price && price < self.max_price
    }
}

pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            min_price: Decimal::ONE,
            max_price: Decimal::new(1000, 0),
            request_timeout_secs: 15,
            max_retries: 2,
            cache_duration_secs: 3600,
            cache_file: PathBuf::from(".http_cache.json"),
            products_file: PathBuf::from("products.yml"),
            shipping_file: PathBuf::from("shipping.yaml"),
            default_shipping_cost: Decimal::new(399, 2),
            default_delay: DelayRange::new(1.0, 2.0),
            notino_delay: DelayRange::new(4.0, 7.0),
            retry_delay: DelayRange::new(5.0, 8.0),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: "warn".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_in_range_is_exclusive_on_both_ends() {
        let config = AppConfig::default();
        assert!(!config.price_in_range(Decimal::ONE));
        assert!(config.price_in_range(Decimal::new(101, 2)));
        assert!(config.price_in_range(Decimal::new(99999, 2)));
        assert!(!config.price_in_range(Decimal::new(1000, 0)));
    }

    #[test]
    fn zero_delay_range_reports_zero() {
        assert!(DelayRange::zero().is_zero());
        assert!(!DelayRange::new(0.0, 0.5).is_zero());
    }
}
