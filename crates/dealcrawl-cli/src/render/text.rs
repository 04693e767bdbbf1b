use std::fmt;

use dealcrawl_core::{store_identity, PriceOption};
use dealcrawl_optimizer::{OptimizedPlan, ShippingPolicy};
use dealcrawl_scraper::SearchStatistics;

use super::{
    amount, euros, free_shipping_threshold, issues, items_from_stores, pluralize,
    success_emoji, success_percent, FAILED_URLS_SHOWN,
};
use crate::finder::SearchResults;

const NO_PRICES: &str = "⚠️  No prices found";
const MIN_RULE_WIDTH: usize = 50;
const SUMMARY_RULE_WIDTH: usize = 70;
const PLAN_RULE_WIDTH: usize = 60;
const NAME_COLUMN: usize = 42;

/// Priced products cheapest first, then products without a price.
pub(super) struct Results<'a>(pub &'a SearchResults);

impl fmt::Display for Results<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n🛒 Best Prices")?;

        let mut rows: Vec<(&str, Option<&PriceOption>)> = self
            .0
            .prices
            .iter()
            .map(|(name, option)| (name.as_str(), option.as_ref()))
            .collect();
        if rows.is_empty() {
            let rule = "=".repeat(MIN_RULE_WIDTH);
            return writeln!(f, "{rule}\nNo products to display\n{rule}");
        }
        rows.sort_by_key(|(_, option)| (option.is_none(), option.map(|o| o.price)));

        let cells: Vec<Option<String>> = rows
            .iter()
            .map(|(_, option)| option.map(price_cell))
            .collect();
        let name_width = rows
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or_default();
        let price_width = cells
            .iter()
            .map(|cell| cell.as_deref().unwrap_or(NO_PRICES).chars().count())
            .max()
            .unwrap_or_default();

        let lines: Vec<String> = rows
            .iter()
            .zip(&cells)
            .map(|((name, option), cell)| match (option, cell) {
                (Some(option), Some(cell)) => format!(
                    "{name:<name_width$} {cell:>price_width$}  {}",
                    option.source_url
                ),
                _ => format!("{name:<name_width$} {NO_PRICES:>price_width$}"),
            })
            .collect();
        let rule_width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or_default()
            .max(MIN_RULE_WIDTH);

        let rule = "=".repeat(rule_width);
        writeln!(f, "{rule}")?;
        for line in &lines {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "{rule}")
    }
}

fn price_cell(option: &PriceOption) -> String {
    match option.unit_value {
        Some(unit_value) => format!(
            "{} ({}/100ml)",
            euros(option.price),
            euros(unit_value)
        ),
        None => euros(option.price),
    }
}

pub(super) struct Summary<'a>(pub &'a SearchStatistics);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.0;
        writeln!(f, "\n📊 Search Summary")?;
        writeln!(f, "{}", "=".repeat(SUMMARY_RULE_WIDTH))?;

        let products = format!(
            "{} {}",
            stats.total_products,
            pluralize(stats.total_products, "product", "products")
        );
        if stats.total_urls_checked == 0 {
            writeln!(f, "{products} · No URLs checked")?;
        } else {
            writeln!(
                f,
                "{} {}/{} {} ({}% success) · {products}",
                success_emoji(stats),
                stats.prices_found,
                stats.total_urls_checked,
                pluralize(stats.total_urls_checked, "URL", "URLs"),
                success_percent(stats),
            )?;
        }

        let issues = issues(stats);
        if !issues.is_empty() {
            writeln!(f, "\nIssues: {}", issues.join(" · "))?;
        }

        if !stats.out_of_stock_items.is_empty() {
            writeln!(f, "\nOut of Stock:")?;
            for (product, urls) in &stats.out_of_stock_items {
                let stores: Vec<String> = urls
                    .iter()
                    .map(|url| store_identity(url))
                    .collect();
                writeln!(f, "  • {product}: {}", stores.join(", "))?;
            }
        }

        if !stats.failed_urls.is_empty() {
            writeln!(f, "\nFailed URLs ({}):", stats.failed_urls.len())?;
            for url in stats.failed_urls.iter().take(FAILED_URLS_SHOWN) {
                writeln!(f, "  • {url}")?;
            }
            if stats.failed_urls.len() > FAILED_URLS_SHOWN {
                writeln!(
                    f,
                    "  • {} more...",
                    stats.failed_urls.len() - FAILED_URLS_SHOWN
                )?;
            }
        }

        writeln!(f)
    }
}

pub(super) struct Plan<'a> {
    pub plan: &'a OptimizedPlan,
    pub policy: &'a ShippingPolicy,
}

impl fmt::Display for Plan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan;
        if plan.is_empty() {
            return writeln!(f, "\nNo shopping plan generated.");
        }

        writeln!(f, "\n🛒 Optimized Shopping Plan\n")?;

        for cart in &plan.carts {
            match free_shipping_threshold(self.policy, &cart.store) {
                Some(threshold) => writeln!(
                    f,
                    "Store: {} (Free shipping over {})",
                    cart.store,
                    euros(threshold)
                )?,
                None => writeln!(f, "Store: {}", cart.store)?,
            }
            writeln!(f, "{}", "─".repeat(PLAN_RULE_WIDTH))?;

            for item in &cart.line_items {
                let price = euros(item.option.price);
                match item.option.unit_value {
                    Some(unit_value) => writeln!(
                        f,
                        "  {:<NAME_COLUMN$} {price:>8} ({}/100ml)",
                        item.variant,
                        euros(unit_value)
                    )?,
                    None => writeln!(f, "  {:<NAME_COLUMN$} {price:>8}", item.variant)?,
                }
            }

            if cart.ships_free() {
                writeln!(f, "  {:<NAME_COLUMN$} {:>8}", "Shipping", "FREE")?;
            } else {
                writeln!(
                    f,
                    "  {:<NAME_COLUMN$} €{:>7}",
                    "Shipping",
                    amount(cart.shipping_cost)
                )?;
            }
            writeln!(f, "  {}", "─".repeat(PLAN_RULE_WIDTH - 2))?;
            writeln!(f, "  {:<NAME_COLUMN$} €{:>7}", "Store Total", amount(cart.total))?;
            writeln!(f)?;
        }

        writeln!(f, "{}", "═".repeat(PLAN_RULE_WIDTH))?;
        writeln!(f, "Grand Total: {}", euros(plan.grand_total))?;
        writeln!(f, "Total Shipping: {}", euros(plan.total_shipping_paid))?;
        writeln!(f, "Products: {}", items_from_stores(plan))?;
        writeln!(f, "{}\n", "═".repeat(PLAN_RULE_WIDTH))
    }
}
