//! Sequential price collection across a product catalog.

use std::collections::BTreeMap;

use dealcrawl_core::{
    format_volume, parse_product_name, AppConfig, PriceOption, ProductCatalog, ProductSize,
    VariantPrices,
};
use scraper::Html;
use serde::Serialize;

use crate::client::PageClient;
use crate::extract::extract_price;
use crate::stock::is_out_of_stock;

/// What happened to a single product URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlOutcome {
    Found(PriceOption),
    FetchFailed,
    OutOfStock,
    ExtractionFailed,
}

/// Counters and failure details for one collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStatistics {
    pub total_products: usize,
    pub total_urls_checked: usize,
    pub prices_found: usize,
    pub out_of_stock: usize,
    pub fetch_errors: usize,
    pub extraction_errors: usize,
    /// Product name to the URLs reporting it out of stock.
    pub out_of_stock_items: BTreeMap<String, Vec<String>>,
    /// URLs that could not be fetched or yielded no price.
    pub failed_urls: Vec<String>,
}

impl SearchStatistics {
    pub fn record(&mut self, product: &str, url: &str, outcome: &UrlOutcome) {
        self.total_urls_checked += 1;
        match outcome {
            UrlOutcome::Found(_) => self.prices_found += 1,
            UrlOutcome::FetchFailed => {
                self.fetch_errors += 1;
                self.failed_urls.push(url.to_owned());
            }
            UrlOutcome::OutOfStock => {
                self.out_of_stock += 1;
                self.out_of_stock_items
                    .entry(product.to_owned())
                    .or_default()
                    .push(url.to_owned());
            }
            UrlOutcome::ExtractionFailed => {
                self.extraction_errors += 1;
                self.failed_urls.push(url.to_owned());
            }
        }
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed_urls.is_empty()
    }
}

/// Classifies a fetched page: out of stock, no readable price, or a price
/// option carrying the per-100ml value for `size`.
#[must_use]
pub fn analyze_page(body: &str, url: &str, size: &ProductSize, config: &AppConfig) -> UrlOutcome {
    let html = Html::parse_document(body);

    if is_out_of_stock(&html) {
        return UrlOutcome::OutOfStock;
    }

    match extract_price(&html, url, config) {
        Some(price) => {
            UrlOutcome::Found(PriceOption::new(price, url).with_unit_value(size.unit_value(price)))
        }
        None => UrlOutcome::ExtractionFailed,
    }
}

/// Visits every URL of every catalog entry in order and gathers in-stock
/// prices.
///
/// Every entry appears in the returned list, with no options when nothing was
/// found. Pages whose price cannot be read are dropped from the cache so the
/// next run fetches them again.
pub async fn collect_prices(
    catalog: &ProductCatalog,
    client: &PageClient,
    config: &AppConfig,
) -> (Vec<VariantPrices>, SearchStatistics) {
    let mut stats = SearchStatistics {
        total_products: catalog.len(),
        ..SearchStatistics::default()
    };
    let mut collected = Vec::with_capacity(catalog.len());

    for (position, entry) in catalog.iter().enumerate() {
        let size = parse_product_name(&entry.name);
        tracing::info!(
            product = %entry.name,
            volume = %format_volume(&size),
            position = position + 1,
            total = catalog.len(),
            urls = entry.urls.len(),
            "checking prices"
        );
        let mut options = Vec::new();

        for url in &entry.urls {
            let outcome = match client.fetch_page(url).await {
                Ok(body) => analyze_page(&body, url, &size, config),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "could not fetch page");
                    UrlOutcome::FetchFailed
                }
            };

            stats.record(&entry.name, url, &outcome);
            match outcome {
                UrlOutcome::Found(option) => {
                    tracing::info!(
                        url = %url,
                        price = %option.price,
                        per_100ml = ?option.unit_value,
                        "found price"
                    );
                    options.push(option);
                }
                UrlOutcome::OutOfStock => tracing::info!(url = %url, "out of stock, skipping"),
                UrlOutcome::ExtractionFailed => {
                    tracing::warn!(url = %url, "could not find price");
                    client.forget(url);
                }
                UrlOutcome::FetchFailed => {}
            }
        }

        collected.push(VariantPrices::new(entry.name.clone(), options));
    }

    tracing::info!(
        products = stats.total_products,
        urls = stats.total_urls_checked,
        prices = stats.prices_found,
        out_of_stock = stats.out_of_stock,
        failed = stats.failed_urls.len(),
        "price collection finished"
    );

    (collected, stats)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn analyze_page_reports_unit_value() {
        let size = parse_product_name("Cleanser (2x50ml)");
        let outcome = analyze_page(
            r#"<meta property="og:price:amount" content="12.00">"#,
            "https://shop.example/cleanser",
            &size,
            &AppConfig::default(),
        );
        let UrlOutcome::Found(option) = outcome else {
            panic!("expected a price, got {outcome:?}");
        };
        assert_eq!(option.price, dec("12.00"));
        assert_eq!(option.unit_value, Some(dec("12")));
        assert_eq!(option.source_url, "https://shop.example/cleanser");
    }

    #[test]
    fn analyze_page_checks_stock_before_price() {
        let outcome = analyze_page(
            r#"<p>Esgotado</p><meta property="og:price:amount" content="12.00">"#,
            "https://shop.example/x",
            &parse_product_name("X"),
            &AppConfig::default(),
        );
        assert_eq!(outcome, UrlOutcome::OutOfStock);
    }

    #[test]
    fn analyze_page_without_price_is_extraction_failure() {
        let outcome = analyze_page(
            "<h1>Gel</h1>",
            "https://shop.example/x",
            &parse_product_name("Gel"),
            &AppConfig::default(),
        );
        assert_eq!(outcome, UrlOutcome::ExtractionFailed);
    }

    #[test]
    fn record_tracks_each_outcome() {
        let mut stats = SearchStatistics::default();
        let found = UrlOutcome::Found(PriceOption::new(dec("5"), "https://a.pt/1"));
        stats.record("Gel", "https://a.pt/1", &found);
        stats.record("Gel", "https://b.pt/1", &UrlOutcome::OutOfStock);
        stats.record("Gel", "https://c.pt/1", &UrlOutcome::FetchFailed);
        stats.record("Toner", "https://d.pt/1", &UrlOutcome::ExtractionFailed);

        assert_eq!(stats.total_urls_checked, 4);
        assert_eq!(stats.prices_found, 1);
        assert_eq!(stats.out_of_stock, 1);
        assert_eq!(stats.fetch_errors, 1);
        assert_eq!(stats.extraction_errors, 1);
        assert_eq!(
            stats.out_of_stock_items.get("Gel"),
            Some(&vec!["https://b.pt/1".to_string()])
        );
        assert_eq!(
            stats.failed_urls,
            vec!["https://c.pt/1".to_string(), "https://d.pt/1".to_string()]
        );
        assert!(stats.has_failures());
    }
}
