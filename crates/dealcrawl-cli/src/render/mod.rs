//! Terminal and markdown reports for search results and shopping plans.

mod markdown;
mod text;

use dealcrawl_optimizer::{OptimizedPlan, ShippingPolicy};
use dealcrawl_scraper::SearchStatistics;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::finder::SearchResults;

pub(crate) fn results(results: &SearchResults, markdown: bool) -> String {
    if markdown {
        markdown::Results(results).to_string()
    } else {
        text::Results(results).to_string()
    }
}

pub(crate) fn summary(statistics: &SearchStatistics, markdown: bool) -> String {
    if markdown {
        markdown::Summary(statistics).to_string()
    } else {
        text::Summary(statistics).to_string()
    }
}

pub(crate) fn plan(plan: &OptimizedPlan, policy: &ShippingPolicy, markdown: bool) -> String {
    if markdown {
        markdown::Plan { plan, policy }.to_string()
    } else {
        text::Plan { plan, policy }.to_string()
    }
}

/// `value` with exactly two decimals, halves rounded away from zero.
pub(crate) fn amount(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn euros(value: Decimal) -> String {
    format!("€{}", amount(value))
}

fn pluralize<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

/// Free-shipping threshold of a configured store, if it has a real one.
fn free_shipping_threshold(policy: &ShippingPolicy, store: &str) -> Option<Decimal> {
    policy
        .configured_rule(store)
        .filter(|rule| rule.has_free_shipping())
        .map(|rule| rule.free_over)
}

/// `"3 items from 2 stores"`.
fn items_from_stores(plan: &OptimizedPlan) -> String {
    let items = plan.total_product_families;
    let stores = plan.store_count();
    format!(
        "{items} {} from {stores} {}",
        pluralize(items, "item", "items"),
        pluralize(stores, "store", "stores")
    )
}

/// Whole-percent share of checked URLs that produced a price.
fn success_percent(statistics: &SearchStatistics) -> usize {
    let checked = statistics.total_urls_checked;
    if checked == 0 {
        return 0;
    }
    (statistics.prices_found * 200 + checked) / (2 * checked)
}

fn success_emoji(statistics: &SearchStatistics) -> &'static str {
    let found = statistics.prices_found * 100;
    let checked = statistics.total_urls_checked;
    if found >= 80 * checked {
        "✅"
    } else if found >= 50 * checked {
        "⚠️"
    } else {
        "❌"
    }
}

fn issues(statistics: &SearchStatistics) -> Vec<String> {
    let mut issues = Vec::new();
    if statistics.out_of_stock > 0 {
        issues.push(format!("📦 {} out of stock", statistics.out_of_stock));
    }
    if statistics.fetch_errors > 0 {
        issues.push(format!(
            "🌐 {} {}",
            statistics.fetch_errors,
            pluralize(statistics.fetch_errors, "fetch error", "fetch errors")
        ));
    }
    if statistics.extraction_errors > 0 {
        issues.push(format!(
            "🔍 {} {}",
            statistics.extraction_errors,
            pluralize(
                statistics.extraction_errors,
                "extraction error",
                "extraction errors"
            )
        ));
    }
    issues
}

/// At most this many failed URLs are listed in a summary.
const FAILED_URLS_SHOWN: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn amount_pads_and_rounds_half_away_from_zero() {
        assert_eq!(amount(dec("5")), "5.00");
        assert_eq!(amount(dec("3.594")), "3.59");
        assert_eq!(amount(dec("2.125")), "2.13");
        assert_eq!(euros(dec("13.9")), "€13.90");
    }

    #[test]
    fn success_rate_buckets() {
        let mut stats = SearchStatistics {
            total_urls_checked: 4,
            prices_found: 3,
            ..SearchStatistics::default()
        };
        assert_eq!(success_percent(&stats), 75);
        assert_eq!(success_emoji(&stats), "⚠️");

        stats.prices_found = 4;
        assert_eq!(success_emoji(&stats), "✅");

        stats.prices_found = 1;
        assert_eq!(success_emoji(&stats), "❌");

        stats.total_urls_checked = 3;
        assert_eq!(success_percent(&stats), 33);
    }

    #[test]
    fn issues_pluralize_counts() {
        let stats = SearchStatistics {
            out_of_stock: 2,
            fetch_errors: 1,
            extraction_errors: 2,
            ..SearchStatistics::default()
        };
        assert_eq!(
            issues(&stats),
            vec![
                "📦 2 out of stock".to_string(),
                "🌐 1 fetch error".to_string(),
                "🔍 2 extraction errors".to_string(),
            ]
        );
        assert!(issues(&SearchStatistics::default()).is_empty());
    }
}
