use std::fmt;

use dealcrawl_core::store_identity;
use dealcrawl_optimizer::{OptimizedPlan, ShippingPolicy};
use dealcrawl_scraper::SearchStatistics;

use super::{
    euros, free_shipping_threshold, issues, items_from_stores, pluralize, success_emoji,
    success_percent, FAILED_URLS_SHOWN,
};
use crate::finder::SearchResults;

/// Results table in catalog order.
pub(super) struct Results<'a>(pub &'a SearchResults);

impl fmt::Display for Results<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n# 🛒 Best Prices\n")?;
        writeln!(f, "| Product | Price | Link |")?;
        writeln!(f, "|---------|-------|------|")?;

        for (name, option) in &self.0.prices {
            match option {
                Some(option) => {
                    let price = match option.unit_value {
                        Some(unit_value) => format!(
                            "{}<br>_({}/100ml)_",
                            euros(option.price),
                            euros(unit_value)
                        ),
                        None => euros(option.price),
                    };
                    writeln!(
                        f,
                        "| **{name}** | {price} | [🔗 {}]({}) |",
                        store_identity(&option.source_url),
                        option.source_url
                    )?;
                }
                None => writeln!(f, "| **{name}** | _No prices found_ | - |")?,
            }
        }

        writeln!(f, "\n---\n")
    }
}

pub(super) struct Summary<'a>(pub &'a SearchStatistics);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.0;
        writeln!(f, "\n## 📊 Search Summary\n")?;

        let products = format!(
            "{} {}",
            stats.total_products,
            pluralize(stats.total_products, "product", "products")
        );
        if stats.total_urls_checked == 0 {
            writeln!(f, "**{products}** · No URLs checked")?;
        } else {
            writeln!(
                f,
                "**{} {}/{} {}** ({}% success) · **{products}**",
                success_emoji(stats),
                stats.prices_found,
                stats.total_urls_checked,
                pluralize(stats.total_urls_checked, "URL", "URLs"),
                success_percent(stats),
            )?;
        }

        let issues = issues(stats);
        if !issues.is_empty() {
            writeln!(f, "\n_{}_", issues.join(" · "))?;
        }

        if !stats.out_of_stock_items.is_empty() {
            writeln!(f, "\n**Out of Stock:**")?;
            for (product, urls) in &stats.out_of_stock_items {
                let stores: Vec<String> = urls.iter().map(|url| store_identity(url)).collect();
                writeln!(f, "- **{product}**: {}", stores.join(", "))?;
            }
        }

        if !stats.failed_urls.is_empty() {
            writeln!(f, "\n**Failed URLs** ({}):", stats.failed_urls.len())?;
            for url in stats.failed_urls.iter().take(FAILED_URLS_SHOWN) {
                writeln!(f, "- `{url}`")?;
            }
            if stats.failed_urls.len() > FAILED_URLS_SHOWN {
                writeln!(
                    f,
                    "- _{} more..._",
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

        writeln!(f, "\n# 🛒 Optimized Shopping Plan\n")?;

        for cart in &plan.carts {
            match free_shipping_threshold(self.policy, &cart.store) {
                Some(threshold) => writeln!(
                    f,
                    "## Store: {} *(Free shipping over {})*\n",
                    cart.store,
                    euros(threshold)
                )?,
                None => writeln!(f, "## Store: {}\n", cart.store)?,
            }
            writeln!(f, "| Product | Price | Value |")?;
            writeln!(f, "|---------|-------|-------|")?;

            for item in &cart.line_items {
                let value = item
                    .option
                    .unit_value
                    .map_or_else(|| "-".to_string(), |v| format!("{}/100ml", euros(v)));
                writeln!(
                    f,
                    "| {} | {} | {value} |",
                    item.variant,
                    euros(item.option.price)
                )?;
            }
            writeln!(f)?;

            if cart.ships_free() {
                writeln!(f, "**Shipping:** FREE  ")?;
            } else {
                writeln!(f, "**Shipping:** {}  ", euros(cart.shipping_cost))?;
            }
            writeln!(f, "**Store Total:** {}\n", euros(cart.total))?;
        }

        writeln!(f, "---\n")?;
        writeln!(f, "**Grand Total:** {}  ", euros(plan.grand_total))?;
        writeln!(f, "**Total Shipping:** {}  ", euros(plan.total_shipping_paid))?;
        writeln!(f, "**Products:** {}\n", items_from_stores(plan))
    }
}
