//! Cheapest-price and best-value selection over collected prices.

use std::collections::HashMap;

use dealcrawl_core::{AppConfig, PriceOption, ProductCatalog, VariantPrices};
use dealcrawl_optimizer::group_by_family;
use dealcrawl_scraper::{collect_prices, PageClient, SearchStatistics};

/// Cheapest option per catalog variant, in catalog order, plus the collection
/// statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SearchResults {
    /// `None` when no in-stock price was found for the variant.
    pub prices: Vec<(String, Option<PriceOption>)>,
    pub statistics: SearchStatistics,
}

/// Collects prices for `catalog` and keeps the cheapest one per variant.
pub(crate) async fn find_cheapest_prices(
    catalog: &ProductCatalog,
    client: &PageClient,
    config: &AppConfig,
) -> SearchResults {
    let (collected, statistics) = collect_prices(catalog, client, config).await;
    SearchResults {
        prices: cheapest_per_variant(collected),
        statistics,
    }
}

fn cheapest_per_variant(collected: Vec<VariantPrices>) -> Vec<(String, Option<PriceOption>)> {
    collected
        .into_iter()
        .map(|variant| {
            let cheapest = variant.cheapest().cloned();
            (variant.name, cheapest)
        })
        .collect()
}

/// Keeps only the best value size of each product family.
///
/// Within a family the variant with the lowest price per 100ml wins (the
/// first one on ties) and the family's other sizes are dropped. A family in
/// which no variant has a known price per 100ml keeps all of its variants.
/// Statistics are carried over unchanged.
pub(crate) fn filter_best_value_sizes(results: SearchResults) -> SearchResults {
    let SearchResults { prices, statistics } = results;

    let keep = {
        let index: HashMap<&str, usize> = prices
            .iter()
            .enumerate()
            .map(|(idx, (name, _))| (name.as_str(), idx))
            .collect();
        let mut keep = vec![false; prices.len()];

        for family in group_by_family(prices.iter().map(|(name, _)| name.as_str())) {
            let members: Vec<usize> = family
                .variants
                .iter()
                .filter_map(|variant| index.get(variant).copied())
                .collect();

            let best = members
                .iter()
                .filter_map(|&idx| {
                    let unit_value = prices[idx].1.as_ref()?.unit_value?;
                    Some((idx, unit_value))
                })
                .reduce(|best, next| if next.1 < best.1 { next } else { best });

            match best {
                Some((idx, _)) => keep[idx] = true,
                None => members.iter().for_each(|&idx| keep[idx] = true),
            }
        }
        keep
    };

    let prices = prices
        .into_iter()
        .zip(keep)
        .filter_map(|(entry, kept)| kept.then_some(entry))
        .collect();

    SearchResults { prices, statistics }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn option(price: &str, unit_value: Option<&str>) -> PriceOption {
        PriceOption::new(dec(price), format!("https://shop.pt/{price}"))
            .with_unit_value(unit_value.map(dec))
    }

    fn names(results: &SearchResults) -> Vec<&str> {
        results
            .prices
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    #[test]
    fn cheapest_per_variant_keeps_catalog_order_and_missing_prices() {
        let collected = vec![
            VariantPrices::new(
                "Gel (236ml)",
                vec![option("12.00", None), option("9.50", None), option("9.50", None)],
            ),
            VariantPrices::new("Toner", vec![]),
        ];

        let prices = cheapest_per_variant(collected);

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].0, "Gel (236ml)");
        assert_eq!(prices[0].1.as_ref().map(|o| o.price), Some(dec("9.50")));
        assert_eq!(prices[1], ("Toner".to_string(), None));
    }

    #[test]
    fn best_value_size_wins_within_family() {
        let results = SearchResults {
            prices: vec![
                ("Gel (236ml)".into(), Some(option("11.80", Some("5")))),
                ("Gel (473ml)".into(), Some(option("17.00", Some("3.5941")))),
                ("Gel (88ml)".into(), None),
                ("Serum (30ml)".into(), Some(option("20.00", Some("66.6667")))),
            ],
            statistics: SearchStatistics {
                total_products: 4,
                ..SearchStatistics::default()
            },
        };

        let filtered = filter_best_value_sizes(results);

        assert_eq!(names(&filtered), vec!["Gel (473ml)", "Serum (30ml)"]);
        assert_eq!(filtered.statistics.total_products, 4);
    }

    #[test]
    fn first_variant_wins_equal_unit_values() {
        let results = SearchResults {
            prices: vec![
                ("Gel (100ml)".into(), Some(option("5.00", Some("5")))),
                ("Gel (200ml)".into(), Some(option("10.00", Some("5")))),
            ],
            ..SearchResults::default()
        };

        assert_eq!(
            names(&filter_best_value_sizes(results)),
            vec!["Gel (100ml)"]
        );
    }

    #[test]
    fn family_without_unit_values_keeps_every_variant() {
        let results = SearchResults {
            prices: vec![
                ("Sunscreen (tube)".into(), Some(option("14.00", None))),
                ("Sunscreen (spray)".into(), None),
                ("Lip Balm".into(), Some(option("3.00", None))),
            ],
            ..SearchResults::default()
        };

        assert_eq!(
            names(&filter_best_value_sizes(results)),
            vec!["Sunscreen (tube)", "Sunscreen (spray)", "Lip Balm"]
        );
    }
}
