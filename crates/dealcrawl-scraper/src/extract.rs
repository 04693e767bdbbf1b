//! Generic price extraction from product pages.
//!
//! Strategies run from most to least reliable: meta tags, `data-price`
//! attributes, well-known price classes, any `price` class, and finally
//! currency patterns in the visible page text.

use std::str::FromStr;
use std::sync::LazyLock;

use dealcrawl_core::AppConfig;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

use crate::site::SiteHandler;

static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[,.]?\d{0,2})").expect("valid price number regex"));

static PRIORITY_PRICE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(price-product|price.*actual|actual.*price|price.*current|current.*price|price.*final|final.*price|price.*sale|sale.*price)",
    )
    .expect("valid priority price class regex")
});

static GENERIC_PRICE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)price").expect("valid price class regex"));

static CURRENCY_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"€\s*(\d+[.,]\d{2})").expect("valid euro prefix regex"),
        Regex::new(r"(\d+[.,]\d{2})\s*€").expect("valid euro suffix regex"),
        Regex::new(r"EUR\s*(\d+[.,]\d{2})").expect("valid EUR regex"),
    ]
});

static META_PRICE_SELECTORS: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    [
        selector(r#"meta[property="product:price:amount"]"#),
        selector(r#"meta[property="og:price:amount"]"#),
        selector(r#"meta[name="price"]"#),
    ]
});

static DATA_PRICE: LazyLock<Selector> = LazyLock::new(|| selector("[data-price]"));
static WITH_CLASS: LazyLock<Selector> = LazyLock::new(|| selector("[class]"));
static ITEMPROP_PRICE: LazyLock<Selector> = LazyLock::new(|| selector(r#"[itemprop="price"]"#));

const HIDDEN_CLASSES: [&str; 3] = ["display-none", "hidden", "d-none"];
const OLD_PRICE_CLASSES: [&str; 5] = ["old", "original", "was", "before", "regular"];
const DELIVERY_KEYWORDS: [&str; 5] = ["delivery", "shipping", "ship", "freight", "postage"];

/// The element itself plus this many ancestors are checked for delivery
/// containers.
const DELIVERY_ANCESTOR_DEPTH: usize = 5;

type Strategy = fn(&Html, &AppConfig) -> Option<Decimal>;

const STRATEGIES: [(&str, Strategy); 5] = [
    ("meta", from_meta_tags),
    ("data-price", from_data_attribute),
    ("priority-class", from_priority_classes),
    ("generic-class", from_generic_classes),
    ("text-pattern", from_text_patterns),
];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid static selector")
}

/// Parses the first number in `raw`, accepting `,` or `.` as the decimal
/// separator: `"€ 12,99"` gives `12.99`. Zero and unparsable input give `None`.
#[must_use]
pub fn parse_price_string(raw: &str) -> Option<Decimal> {
    let number = PRICE_NUMBER.captures(raw)?.get(1)?.as_str();
    let normalized = number.replace(',', ".");
    let price = Decimal::from_str(normalized.trim_end_matches('.')).ok()?;
    (!price.is_zero()).then_some(price)
}

/// Reads the product price from a page, trying the site handler for `url`
/// before the generic strategies.
#[must_use]
pub fn extract_price(html: &Html, url: &str, config: &AppConfig) -> Option<Decimal> {
    let handler = SiteHandler::for_url(url);
    if let Some(price) = handler.extract_price(html, config) {
        tracing::debug!(url, site = handler.name(), %price, "price from site handler");
        return Some(price);
    }

    STRATEGIES.iter().find_map(|(name, strategy)| {
        let price = strategy(html, config)?;
        tracing::debug!(url, strategy = name, %price, "price from generic strategy");
        Some(price)
    })
}

fn from_meta_tags(html: &Html, _config: &AppConfig) -> Option<Decimal> {
    META_PRICE_SELECTORS.iter().find_map(|sel| {
        html.select(sel)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .and_then(parse_price_string)
    })
}

fn from_data_attribute(html: &Html, _config: &AppConfig) -> Option<Decimal> {
    html.select(&DATA_PRICE)
        .filter_map(|el| el.value().attr("data-price"))
        .find_map(parse_price_string)
}

fn from_priority_classes(html: &Html, _config: &AppConfig) -> Option<Decimal> {
    let by_class = html
        .select(&WITH_CLASS)
        .filter(|el| has_class_matching(*el, &PRIORITY_PRICE_CLASS))
        .filter(|el| !is_hidden(*el, &[]))
        .find_map(price_from_element);

    by_class.or_else(|| {
        html.select(&ITEMPROP_PRICE)
            .filter(|el| !is_hidden(*el, &[]))
            .find_map(price_from_element)
    })
}

fn from_generic_classes(html: &Html, _config: &AppConfig) -> Option<Decimal> {
    html.select(&WITH_CLASS)
        .filter(|el| has_class_matching(*el, &GENERIC_PRICE_CLASS))
        .filter(|el| !is_hidden(*el, &OLD_PRICE_CLASSES))
        .filter(|el| !inside_delivery_container(*el))
        .find_map(price_from_element)
}

fn from_text_patterns(html: &Html, config: &AppConfig) -> Option<Decimal> {
    let text = page_text(html);
    CURRENCY_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(&text)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| parse_price_string(m.as_str()))
            .find(|price| config.price_in_range(*price))
    })
}

/// `content` attribute first, then the element's text.
fn price_from_element(el: ElementRef<'_>) -> Option<Decimal> {
    el.value()
        .attr("content")
        .and_then(parse_price_string)
        .or_else(|| parse_price_string(&element_text(el)))
}

fn has_class_matching(el: ElementRef<'_>, pattern: &Regex) -> bool {
    el.value().classes().any(|class| pattern.is_match(class))
}

fn class_list(el: ElementRef<'_>) -> String {
    el.value().attr("class").unwrap_or_default().to_lowercase()
}

fn is_hidden(el: ElementRef<'_>, extra_keywords: &[&str]) -> bool {
    let classes = class_list(el);
    if HIDDEN_CLASSES
        .iter()
        .chain(extra_keywords)
        .any(|keyword| classes.contains(keyword))
    {
        return true;
    }

    let style: String = el
        .value()
        .attr("style")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    style.contains("display:none") || style.contains("visibility:hidden")
}

fn inside_delivery_container(el: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .take(DELIVERY_ANCESTOR_DEPTH + 1)
        .any(|node| {
            let classes = class_list(node);
            let id = node.value().id().unwrap_or_default().to_lowercase();
            DELIVERY_KEYWORDS
                .iter()
                .any(|keyword| classes.contains(keyword) || id.contains(keyword))
        })
}

/// Text of `el` with each text node trimmed and the pieces joined.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

/// All text outside `<script>`, `<style>`, `<noscript>` and `<template>`.
pub(crate) fn page_text(html: &Html) -> String {
    let mut text = String::new();
    for node in html.root_element().descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let in_code = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
        if !in_code {
            text.push_str(chunk);
        }
    }
    text
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
