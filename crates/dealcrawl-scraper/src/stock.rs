//! Out-of-stock detection.
//!
//! Checks run in order and the first conclusive one decides: explicit
//! in-stock markers, availability meta tags, out-of-stock wording in the page
//! text, then out-of-stock class names. Pages with no signal count as in stock.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::extract::{element_text, page_text};

static OUT_OF_STOCK_TEXT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"out\s+of\s+stock",
        r"esgotado",
        r"sin\s+stock",
        r"não\s+disponível",
        r"indisponível",
        r"sem\s+stock",
        r"sold\s+out",
        r"rupture\s+de\s+stock",
        r"agotado",
        r"não\s+disponivel",
    ]
    .iter()
    .map(|pattern| Regex::new(&format!("(?i){pattern}")).expect("valid out-of-stock regex"))
    .collect()
});

static OUT_OF_STOCK_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)out.?of.?stock|sold.?out|unavailable").expect("valid out-of-stock class regex")
});

// "back in stock" and "indisponível" must not read as in stock, so those two
// alternatives are checked for a preceding word by hand.
static IN_STOCK_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"in.?stock").expect("valid in-stock class regex"));
static EM_STOCK_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"em.?stock").expect("valid em-stock class regex"));
static DISPONIVEL_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"disponível|disponivel").expect("valid disponivel regex"));
static AVAILABLE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bavailable\b").expect("valid available regex"));

static WITH_CLASS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class]").expect("valid class selector"));
static JSON_LD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid json-ld selector")
});
static AVAILABILITY_META: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    [
        r#"meta[property="product:availability"]"#,
        r#"meta[property="og:availability"]"#,
        r#"meta[itemprop="availability"]"#,
    ]
    .map(|css| Selector::parse(css).expect("valid availability selector"))
});

type Check = fn(&Html) -> Option<bool>;

const CHECKS: [Check; 4] = [
    in_stock_markers,
    availability_meta,
    out_of_stock_text,
    out_of_stock_classes,
];

/// Returns `true` when the page says the product cannot be bought.
#[must_use]
pub fn is_out_of_stock(html: &Html) -> bool {
    CHECKS.iter().find_map(|check| check(html)).unwrap_or(false)
}

fn in_stock_markers(html: &Html) -> Option<bool> {
    let labelled = html.select(&WITH_CLASS).any(|el| {
        el.value().classes().any(is_in_stock_class)
            && element_text(el).chars().count() > 2
            && !class_list(el).contains("icon")
    });
    if labelled {
        return Some(false);
    }

    html.select(&JSON_LD)
        .any(|script| script.text().any(|chunk| chunk.contains("InStock")))
        .then_some(false)
}

fn availability_meta(html: &Html) -> Option<bool> {
    AVAILABILITY_META.iter().find_map(|sel| {
        let content = html
            .select(sel)
            .next()?
            .value()
            .attr("content")
            .unwrap_or_default()
            .to_lowercase();
        if ["outofstock", "out of stock", "soldout"]
            .iter()
            .any(|status| content.contains(status))
        {
            Some(true)
        } else if content.contains("instock") || content.contains("in stock") {
            Some(false)
        } else {
            None
        }
    })
}

fn out_of_stock_text(html: &Html) -> Option<bool> {
    let text = page_text(html).to_lowercase();
    OUT_OF_STOCK_TEXT
        .iter()
        .any(|pattern| pattern.is_match(&text))
        .then_some(true)
}

fn out_of_stock_classes(html: &Html) -> Option<bool> {
    html.select(&WITH_CLASS)
        .any(|el| el.value().classes().any(|class| OUT_OF_STOCK_CLASS.is_match(class)))
        .then_some(true)
}

fn is_in_stock_class(class: &str) -> bool {
    let class = class.to_lowercase();
    IN_STOCK_CLASS
        .find_iter(&class)
        .any(|m| !class[..m.start()].ends_with("back"))
        || EM_STOCK_CLASS.is_match(&class)
        || DISPONIVEL_CLASS
            .find_iter(&class)
            .any(|m| !class[..m.start()].ends_with("in"))
        || AVAILABLE_CLASS.is_match(&class)
}

fn class_list(el: ElementRef<'_>) -> String {
    el.value().attr("class").unwrap_or_default().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out_of_stock(body: &str) -> bool {
        is_out_of_stock(&Html::parse_document(body))
    }

    #[test]
    fn in_stock_label_wins_over_sold_out_text() {
        let body = r#"<span class="in_stock">Em Stock</span>
            <p>Other sizes are sold out</p>"#;
        assert!(!out_of_stock(body));
    }

    #[test]
    fn in_stock_icon_without_text_is_ignored() {
        let body = r#"<i class="icon in-stock"></i><p>Esgotado</p>"#;
        assert!(out_of_stock(body));
    }

    #[test]
    fn back_in_stock_is_not_an_in_stock_marker() {
        let body = r#"<div class="alert-backinstock">Notify me</div><p>Sem stock</p>"#;
        assert!(out_of_stock(body));
    }

    #[test]
    fn indisponivel_class_is_not_an_in_stock_marker() {
        let body = r#"<span class="indisponível">Produto</span><p>Indisponível</p>"#;
        assert!(out_of_stock(body));
        assert!(is_in_stock_class("disponivel"));
        assert!(!is_in_stock_class("indisponivel"));
    }

    #[test]
    fn json_ld_in_stock_is_trusted() {
        let body = r#"<script type="application/ld+json">
            {"offers": {"availability": "https://schema.org/InStock"}}
            </script><p>out of stock elsewhere</p>"#;
        assert!(!out_of_stock(body));
    }

    #[test]
    fn availability_meta_decides() {
        assert!(out_of_stock(
            r#"<meta property="product:availability" content="OutOfStock">"#
        ));
        assert!(!out_of_stock(
            r#"<meta property="og:availability" content="instock"><p>esgotado</p>"#
        ));
    }

    #[test]
    fn multilingual_text_patterns() {
        for phrase in [
            "Out of stock",
            "ESGOTADO",
            "sin stock",
            "Não disponível",
            "rupture de stock",
            "agotado",
        ] {
            let body = format!("<p>{phrase}</p>");
            assert!(out_of_stock(&body), "expected out of stock for {phrase}");
        }
    }

    #[test]
    fn out_of_stock_class_is_last_resort() {
        assert!(out_of_stock(r#"<button class="btn sold-out"></button>"#));
    }

    #[test]
    fn pages_without_signals_are_in_stock() {
        assert!(!out_of_stock("<p>Great cleanser for daily use</p>"));
    }
}
