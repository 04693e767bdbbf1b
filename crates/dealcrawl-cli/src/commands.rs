//! Subcommand handlers.
//!
//! Loader failures and filters that leave nothing to check are fatal. A CSV
//! dump that cannot be written is logged and does not change the exit status.

use std::path::Path;

use anyhow::{bail, Context};
use dealcrawl_core::{
    filter_by_products, filter_by_sites, load_products, load_shipping_entries, AppConfig,
    ProductCatalog,
};
use dealcrawl_optimizer::{OptimizeGoal, PlanOptimizer, ShippingPolicy};
use dealcrawl_scraper::{collect_prices, PageClient};

use crate::{dump, finder, render, GlobalArgs};

/// Site and product-name substrings narrowing the catalog for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CatalogFilters {
    sites: Vec<String>,
    products: Vec<String>,
}

impl CatalogFilters {
    pub(crate) fn new(sites: &[String], products: &[String]) -> Self {
        Self {
            sites: clean(sites),
            products: clean(products),
        }
    }

    /// Applies the site filter, then the product filter.
    ///
    /// # Errors
    ///
    /// Returns an error when a filter leaves no products.
    pub(crate) fn apply(&self, catalog: ProductCatalog) -> anyhow::Result<ProductCatalog> {
        let mut catalog = catalog;

        if !self.sites.is_empty() {
            catalog = filter_by_sites(&catalog, &self.sites);
            if catalog.is_empty() {
                bail!("no products found for sites: {}", self.sites.join(", "));
            }
        }

        if !self.products.is_empty() {
            catalog = filter_by_products(&catalog, &self.products);
            if catalog.is_empty() {
                bail!("no products matching: {}", self.products.join(", "));
            }
        }

        Ok(catalog)
    }
}

fn clean(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}

fn load_catalog(config: &AppConfig, filters: &CatalogFilters) -> anyhow::Result<ProductCatalog> {
    let catalog = load_products(&config.products_file).with_context(|| {
        format!(
            "failed to load products from {}",
            config.products_file.display()
        )
    })?;
    if catalog.is_empty() {
        bail!(
            "no products to compare in {}",
            config.products_file.display()
        );
    }

    let catalog = filters.apply(catalog)?;
    tracing::info!(
        products = catalog.len(),
        urls = catalog.url_count(),
        "catalog loaded"
    );
    Ok(catalog)
}

fn page_client(config: &AppConfig, global: &GlobalArgs) -> anyhow::Result<PageClient> {
    PageClient::new(config, !global.no_cache).context("failed to build HTTP client")
}

fn report_dump(path: &Path, written: anyhow::Result<()>) {
    match written {
        Ok(()) => tracing::info!(path = %path.display(), "results dumped"),
        Err(e) => tracing::error!(path = %path.display(), error = %e, "could not write CSV dump"),
    }
}

/// Looks up the cheapest in-stock price of every catalog product and prints
/// them with a run summary.
///
/// Unless `all_sizes` is set, only the best value size of each product family
/// is shown.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, the filters leave no
/// products, or the HTTP client cannot be built.
pub(crate) async fn run_prices(
    config: &AppConfig,
    global: &GlobalArgs,
    filters: &CatalogFilters,
    all_sizes: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(config, filters)?;
    let client = page_client(config, global)?;

    let mut results = finder::find_cheapest_prices(&catalog, &client, config).await;
    if !all_sizes {
        results = finder::filter_best_value_sizes(results);
    }

    print!("{}", render::results(&results, global.markdown));
    print!("{}", render::summary(&results.statistics, global.markdown));

    if let Some(path) = &global.dump {
        report_dump(path, dump::write_results_csv(path, &results));
    }
    Ok(())
}

/// Finds the cheapest way to buy every catalog product matching the filters,
/// shipping included, and prints the plan.
///
/// The shipping file is read before any page is fetched.
///
/// # Errors
///
/// Returns an error if the catalog or the shipping file cannot be loaded, the
/// filters leave no products, or the HTTP client cannot be built.
pub(crate) async fn run_plan(
    config: &AppConfig,
    global: &GlobalArgs,
    filters: &CatalogFilters,
    optimize_for_value: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(config, filters)?;

    let entries = load_shipping_entries(&config.shipping_file).with_context(|| {
        format!(
            "failed to load shipping rules from {}",
            config.shipping_file.display()
        )
    })?;
    let policy = ShippingPolicy::from_entries(&entries, config.default_shipping_cost);

    let client = page_client(config, global)?;
    let (prices, statistics) = collect_prices(&catalog, &client, config).await;
    if statistics.has_failures() {
        tracing::warn!(
            failed = statistics.failed_urls.len(),
            "some pages could not be priced; the plan only uses prices that were found"
        );
    }

    let goal = if optimize_for_value {
        OptimizeGoal::BestValue
    } else {
        OptimizeGoal::LowestCost
    };
    let plan = PlanOptimizer::new(&policy).with_goal(goal).optimize(&prices);

    print!("{}", render::plan(&plan, &policy, global.markdown));

    if let Some(path) = &global.dump {
        report_dump(path, dump::write_plan_csv(path, &plan));
    }
    Ok(())
}
