//! CSV export of search results and shopping plans.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use dealcrawl_core::PriceOption;
use dealcrawl_optimizer::OptimizedPlan;

use crate::finder::SearchResults;
use crate::render::amount;

const RESULTS_HEADER: [&str; 4] = ["Product", "Price", "Price per 100ml", "URL"];
const PLAN_HEADER: [&str; 5] = ["Store", "Product", "Price", "Price per 100ml", "URL"];

pub(crate) fn write_results_csv(path: &Path, results: &SearchResults) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_results(file, results)
}

pub(crate) fn write_plan_csv(path: &Path, plan: &OptimizedPlan) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_plan(file, plan)
}

/// One row per variant; variants without a price get empty cells.
fn write_results<W: Write>(out: W, results: &SearchResults) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(RESULTS_HEADER)?;

    for (name, option) in &results.prices {
        match option {
            Some(option) => {
                let (price, unit_value) = price_cells(option);
                writer.write_record([
                    name.as_str(),
                    price.as_str(),
                    unit_value.as_str(),
                    option.source_url.as_str(),
                ])?;
            }
            None => writer.write_record([name.as_str(), "", "", ""])?,
        }
    }

    writer.flush()?;
    Ok(())
}

/// One row per line item, stores in plan order.
fn write_plan<W: Write>(out: W, plan: &OptimizedPlan) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(PLAN_HEADER)?;

    for (cart, item) in plan.line_items() {
        let (price, unit_value) = price_cells(&item.option);
        writer.write_record([
            cart.store.as_str(),
            item.variant.as_str(),
            price.as_str(),
            unit_value.as_str(),
            item.option.source_url.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn price_cells(option: &PriceOption) -> (String, String) {
    (
        amount(option.price),
        option.unit_value.map(amount).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use dealcrawl_optimizer::{StoreCart, StoreShippingRule};
    use rust_decimal::Decimal;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn results_rows_keep_order_and_blank_missing_prices() {
        let results = SearchResults {
            prices: vec![
                (
                    "Gel, Foaming (236ml)".into(),
                    Some(
                        PriceOption::new(dec("11.8"), "https://a.pt/gel")
                            .with_unit_value(Some(dec("5"))),
                    ),
                ),
                ("Serum".into(), None),
            ],
            ..SearchResults::default()
        };

        let mut out = Vec::new();
        write_results(&mut out, &results).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Product,Price,Price per 100ml,URL\n\
             \"Gel, Foaming (236ml)\",11.80,5.00,https://a.pt/gel\n\
             Serum,,,\n"
        );
    }

    #[test]
    fn plan_rows_name_the_store() {
        let rule = StoreShippingRule::new("b.pt", dec("3.99"), dec("50"));
        let mut cart = StoreCart::new("b.pt");
        cart.push("Toner", PriceOption::new(dec("7.5"), "https://www.b.pt/t"));
        cart.settle(&rule);
        let plan = OptimizedPlan::from_carts(vec![cart], 1);

        let mut out = Vec::new();
        write_plan(&mut out, &plan).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Store,Product,Price,Price per 100ml,URL\n\
             b.pt,Toner,7.50,,https://www.b.pt/t\n"
        );
    }

    #[test]
    fn csv_file_is_written_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        write_results_csv(&path, &SearchResults::default()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Product,Price,Price per 100ml,URL\n");
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("plan.csv");

        let err = write_plan_csv(&path, &OptimizedPlan::default()).unwrap_err();
        assert!(err.to_string().contains("failed to create"), "got: {err}");
    }
}
