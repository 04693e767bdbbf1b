//! Per-site request behaviour and price extraction.
//!
//! Sites with unusual markup or bot protection get their own variant; every
//! other URL uses [`SiteHandler::Default`] and relies on the generic
//! extraction strategies.

use std::str::FromStr;
use std::sync::LazyLock;

use dealcrawl_core::{AppConfig, DelayRange};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rust_decimal::Decimal;
use scraper::{Html, Selector};

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid script selector"));

static NOTINO_JSON_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""price"\s*:\s*([0-9]+\.?[0-9]*)"#).expect("valid notino price regex")
});

static NUXT_PRICE_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"price:([0-9]+\.?[0-9]*)").expect("valid nuxt price regex"),
        Regex::new(r"\.price[=:]([0-9]+\.?[0-9]*)").expect("valid nuxt member regex"),
        Regex::new(r#""price"[:\s]*([0-9]+\.?[0-9]*)"#).expect("valid nuxt json regex"),
        Regex::new(r"'price'[:\s]*([0-9]+\.?[0-9]*)").expect("valid nuxt quoted regex"),
    ]
});

static BARE_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]+\.[0-9]{2})\b").expect("valid decimal regex"));

const NOTINO_FULL_VERSION_LIST: &str = "\"Google Chrome\";v=\"131.0.6778.109\", \
\"Chromium\";v=\"131.0.6778.109\", \"Not_A Brand\";v=\"24.0.0.0\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteHandler {
    /// notino.pt: aggressive bot detection, prices in inline JSON.
    Notino,
    /// farmacentral.pt: Nuxt app, prices in the `__NUXT__` state script.
    Farmacentral,
    Default,
}

/// Domain fragments checked in order against the full URL.
const REGISTRY: [(&str, SiteHandler); 2] = [
    ("notino.pt", SiteHandler::Notino),
    ("farmacentral.pt", SiteHandler::Farmacentral),
];

impl SiteHandler {
    #[must_use]
    pub fn for_url(url: &str) -> Self {
        REGISTRY
            .iter()
            .find(|(pattern, _)| url.contains(pattern))
            .map_or(Self::Default, |(_, handler)| *handler)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Notino => "notino",
            Self::Farmacentral => "farmacentral",
            Self::Default => "default",
        }
    }

    /// Pause range applied before each request to this site.
    #[must_use]
    pub fn delay_range(self, config: &AppConfig) -> DelayRange {
        match self {
            Self::Notino => config.notino_delay,
            Self::Farmacentral | Self::Default => config.default_delay,
        }
    }

    /// Headers layered over the browser defaults for requests to `domain`.
    #[must_use]
    pub fn custom_headers(self, domain: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self != Self::Notino {
            return headers;
        }

        let referers = [
            "https://www.google.com/".to_owned(),
            "https://www.google.pt/".to_owned(),
            format!("https://{domain}/"),
        ];
        let referer = &referers[usize::from(rand::random::<u8>()) % referers.len()];

        insert(&mut headers, reqwest::header::REFERER, referer);
        insert(&mut headers, reqwest::header::ORIGIN, &format!("https://{domain}"));
        insert(&mut headers, HeaderName::from_static("sec-fetch-site"), "same-origin");
        insert(&mut headers, reqwest::header::DNT, "1");
        insert(&mut headers, HeaderName::from_static("sec-ch-ua-arch"), "\"arm\"");
        insert(&mut headers, HeaderName::from_static("sec-ch-ua-bitness"), "\"64\"");
        insert(
            &mut headers,
            HeaderName::from_static("sec-ch-ua-full-version-list"),
            NOTINO_FULL_VERSION_LIST,
        );
        insert(&mut headers, HeaderName::from_static("viewport-width"), "1920");
        headers
    }

    /// Site-specific price lookup. `None` means the generic strategies should
    /// be tried.
    #[must_use]
    pub fn extract_price(self, html: &Html, config: &AppConfig) -> Option<Decimal> {
        match self {
            Self::Notino => notino_price(html, config),
            Self::Farmacentral => farmacentral_price(html, config),
            Self::Default => None,
        }
    }
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

fn script_bodies(html: &Html) -> impl Iterator<Item = String> + '_ {
    html.select(&SCRIPT)
        .map(|script| script.text().collect::<String>())
        .filter(|body| !body.is_empty())
}

fn notino_price(html: &Html, config: &AppConfig) -> Option<Decimal> {
    script_bodies(html)
        .filter(|body| body.contains("\"price\""))
        .find_map(|body| first_in_range(&NOTINO_JSON_PRICE, &body, config))
}

fn farmacentral_price(html: &Html, config: &AppConfig) -> Option<Decimal> {
    script_bodies(html)
        .filter(|body| body.contains("__NUXT__"))
        .find_map(|body| {
            NUXT_PRICE_PATTERNS
                .iter()
                .find_map(|pattern| first_in_range(pattern, &body, config))
                .or_else(|| first_in_range(&BARE_DECIMAL, &body, config))
        })
}

/// First capture of `pattern` in `body` that parses and lies in the
/// configured price range.
fn first_in_range(pattern: &Regex, body: &str, config: &AppConfig) -> Option<Decimal> {
    pattern
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| Decimal::from_str(m.as_str().trim_end_matches('.')).ok())
        .find(|price| config.price_in_range(*price))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn for_url_matches_registered_domains() {
        assert_eq!(
            SiteHandler::for_url("https://www.notino.pt/cerave/cleanser/"),
            SiteHandler::Notino
        );
        assert_eq!(
            SiteHandler::for_url("https://www.farmacentral.pt/p/123"),
            SiteHandler::Farmacentral
        );
        assert_eq!(
            SiteHandler::for_url("https://wells.pt/p/123"),
            SiteHandler::Default
        );
    }

    #[test]
    fn delay_range_uses_site_config() {
        let config = AppConfig {
            notino_delay: DelayRange::new(4.0, 7.0),
            default_delay: DelayRange::new(1.0, 2.0),
            ..AppConfig::default()
        };
        assert_eq!(
            SiteHandler::Notino.delay_range(&config),
            DelayRange::new(4.0, 7.0)
        );
        assert_eq!(
            SiteHandler::Default.delay_range(&config),
            DelayRange::new(1.0, 2.0)
        );
    }

    #[test]
    fn notino_headers_carry_origin_and_referer() {
        let headers = SiteHandler::Notino.custom_headers("www.notino.pt");
        assert_eq!(
            headers.get(reqwest::header::ORIGIN).and_then(|v| v.to_str().ok()),
            Some("https://www.notino.pt")
        );
        let referer = headers
            .get(reqwest::header::REFERER)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(
            [
                "https://www.google.com/",
                "https://www.google.pt/",
                "https://www.notino.pt/"
            ]
            .contains(&referer),
            "unexpected referer {referer}"
        );
        assert!(SiteHandler::Default.custom_headers("wells.pt").is_empty());
    }

    #[test]
    fn notino_reads_first_in_range_json_price() {
        let html = Html::parse_document(
            r#"<html><head><script>var x = {"price": 0.5, "other": 1};
            var data = {"sku": "1", "price": 12.99};</script></head></html>"#,
        );
        let price = SiteHandler::Notino.extract_price(&html, &AppConfig::default());
        assert_eq!(price, Some(dec("12.99")));
    }

    #[test]
    fn notino_ignores_scripts_without_price() {
        let html = Html::parse_document("<script>var a = 12.99;</script>");
        assert_eq!(
            SiteHandler::Notino.extract_price(&html, &AppConfig::default()),
            None
        );
    }

    #[test]
    fn farmacentral_reads_nuxt_state() {
        let html = Html::parse_document(
            "<script>window.__NUXT__=(function(a){return {product:{id:3,price:7.32}}})(1)</script>",
        );
        let price = SiteHandler::Farmacentral.extract_price(&html, &AppConfig::default());
        assert_eq!(price, Some(dec("7.32")));
    }

    #[test]
    fn farmacentral_falls_back_to_bare_decimal() {
        let html = Html::parse_document(
            "<script>window.__NUXT__={a:\"x\",b:[0.10, 15.49]}</script>",
        );
        let price = SiteHandler::Farmacentral.extract_price(&html, &AppConfig::default());
        assert_eq!(price, Some(dec("15.49")));
    }

    #[test]
    fn default_handler_defers_to_generic_extraction() {
        let html = Html::parse_document(r#"<script>{"price": 10.00}</script>"#);
        assert_eq!(
            SiteHandler::Default.extract_price(&html, &AppConfig::default()),
            None
        );
    }
}
