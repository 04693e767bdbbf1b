//! End-to-end price collection against a local mock store.

use std::str::FromStr;

use dealcrawl_core::{AppConfig, DelayRange, ProductCatalog, ProductEntry};
use dealcrawl_scraper::{collect_prices, PageClient};
use rust_decimal::Decimal;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn page(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body.to_owned()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn collect_prices_classifies_every_url() {
    let server = MockServer::start().await;
    page(
        &server,
        "/gel-236",
        200,
        r#"<html><head><meta property="og:price:amount" content="11.80"></head></html>"#,
    )
    .await;
    page(
        &server,
        "/gel-236-sold",
        200,
        "<html><body><p>Produto esgotado</p></body></html>",
    )
    .await;
    page(
        &server,
        "/gel-473",
        200,
        "<html><body><h1>Gel 473ml</h1></body></html>",
    )
    .await;
    page(&server, "/gel-473-broken", 500, "").await;

    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        max_retries: 0,
        cache_file: dir.path().join("cache.json"),
        default_delay: DelayRange::zero(),
        notino_delay: DelayRange::zero(),
        retry_delay: DelayRange::zero(),
        ..AppConfig::default()
    };
    let client = PageClient::new(&config, false).unwrap();

    let base = server.uri();
    let catalog = ProductCatalog::new(vec![
        ProductEntry::new(
            "Gel (236ml)",
            vec![format!("{base}/gel-236"), format!("{base}/gel-236-sold")],
        ),
        ProductEntry::new(
            "Gel (2x473ml)",
            vec![format!("{base}/gel-473"), format!("{base}/gel-473-broken")],
        ),
    ]);

    let (prices, stats) = collect_prices(&catalog, &client, &config).await;

    assert_eq!(prices.len(), 2);
    assert_eq!(prices[0].name, "Gel (236ml)");
    assert_eq!(prices[0].options.len(), 1);
    let option = &prices[0].options[0];
    assert_eq!(option.price, dec("11.80"));
    assert_eq!(option.unit_value, Some(dec("5")));
    assert_eq!(option.source_url, format!("{base}/gel-236"));

    assert_eq!(prices[1].name, "Gel (2x473ml)");
    assert!(prices[1].options.is_empty());

    assert_eq!(stats.total_products, 2);
    assert_eq!(stats.total_urls_checked, 4);
    assert_eq!(stats.prices_found, 1);
    assert_eq!(stats.out_of_stock, 1);
    assert_eq!(stats.extraction_errors, 1);
    assert_eq!(stats.fetch_errors, 1);
    assert_eq!(
        stats.out_of_stock_items.get("Gel (236ml)"),
        Some(&vec![format!("{base}/gel-236-sold")])
    );
    assert_eq!(
        stats.failed_urls,
        vec![format!("{base}/gel-473"), format!("{base}/gel-473-broken")]
    );
}

#[tokio::test]
async fn collect_prices_on_empty_catalog_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        cache_file: dir.path().join("cache.json"),
        ..AppConfig::default()
    };
    let client = PageClient::new(&config, false).unwrap();

    let (prices, stats) = collect_prices(&ProductCatalog::default(), &client, &config).await;

    assert!(prices.is_empty());
    assert_eq!(stats.total_urls_checked, 0);
    assert!(!stats.has_failures());
}
