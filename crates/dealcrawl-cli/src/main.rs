mod commands;
mod dump;
mod finder;
mod render;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dealcrawl_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dealcrawl")]
#[command(about = "Find the cheapest prices and shopping plans across online stores")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand.
#[derive(Debug, Args)]
struct GlobalArgs {
    /// Print reports as markdown
    #[arg(long, global = true, env = "DEALCRAWL_MARKDOWN")]
    markdown: bool,

    /// Bypass the HTTP cache
    #[arg(long, global = true, env = "DEALCRAWL_NO_CACHE")]
    no_cache: bool,

    /// Products catalog (YAML); overrides DEALCRAWL_PRODUCTS_FILE
    #[arg(long, global = true, value_name = "PATH")]
    products_file: Option<PathBuf>,

    /// Shipping rules (YAML); overrides DEALCRAWL_SHIPPING_FILE
    #[arg(long, global = true, value_name = "PATH")]
    shipping_file: Option<PathBuf>,

    /// HTTP cache lifetime in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    cache_duration: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    request_timeout: Option<u64>,

    /// Also write the report rows to a CSV file
    #[arg(long, global = true, value_name = "CSV", env = "DEALCRAWL_DUMP")]
    dump: Option<PathBuf>,

    /// Log progress at info level
    #[arg(short, long, global = true, env = "DEALCRAWL_VERBOSE")]
    verbose: bool,
}

impl GlobalArgs {
    /// Applies per-run overrides on top of the environment configuration.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(path) = &self.products_file {
            config.products_file.clone_from(path);
        }
        if let Some(path) = &self.shipping_file {
            config.shipping_file.clone_from(path);
        }
        if let Some(secs) = self.cache_duration {
            config.cache_duration_secs = secs;
        }
        if let Some(secs) = self.request_timeout {
            config.request_timeout_secs = secs;
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Cheapest in-stock price for every catalog product
    Prices {
        /// Only check URLs on these sites (comma-separated domain substrings)
        #[arg(long, value_delimiter = ',', env = "DEALCRAWL_SITES")]
        sites: Vec<String>,

        /// Only check products whose name contains one of these substrings
        #[arg(long, value_delimiter = ',', env = "DEALCRAWL_PRODUCTS")]
        products: Vec<String>,

        /// Show every size instead of the best value size per product
        #[arg(long, env = "DEALCRAWL_ALL_SIZES")]
        all_sizes: bool,
    },
    /// Cheapest way to buy a set of products, shipping included
    Plan {
        /// Products to buy (comma-separated name substrings)
        #[arg(value_delimiter = ',', required = true)]
        products: Vec<String>,

        /// Only consider these sites (comma-separated domain substrings)
        #[arg(long, value_delimiter = ',', env = "DEALCRAWL_SITES")]
        sites: Vec<String>,

        /// Break ties between equally priced plans by price per 100ml
        ///
        /// The cheapest total still wins. This flag only changes the result
        /// when several plans cost exactly the same; it never picks a larger,
        /// pricier size for its better unit value.
        #[arg(long, env = "DEALCRAWL_OPTIMIZE_FOR_VALUE")]
        optimize_for_value: bool,
    },
}

fn init_tracing(log_level: &str, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "info" } else { log_level };
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = dealcrawl_core::load_app_config().context("failed to load configuration")?;
    cli.global.apply_to(&mut config);
    init_tracing(&config.log_level, cli.global.verbose)?;

    match cli.command {
        Commands::Prices {
            sites,
            products,
            all_sizes,
        } => {
            let filters = commands::CatalogFilters::new(&sites, &products);
            commands::run_prices(&config, &cli.global, &filters, all_sizes).await
        }
        Commands::Plan {
            products,
            sites,
            optimize_for_value,
        } => {
            let filters = commands::CatalogFilters::new(&sites, &products);
            commands::run_plan(&config, &cli.global, &filters, optimize_for_value).await
        }
    }
}
