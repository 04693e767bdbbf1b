use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::store::store_identity;

/// One observed price for one product variant at one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceOption {
    pub price: Decimal,
    /// Product page the price was read from; the store is derived from it.
    pub source_url: String,
    /// Price per 100ml, when the variant name carries a volume.
    pub unit_value: Option<Decimal>,
}

impl PriceOption {
    #[must_use]
    pub fn new(price: Decimal, source_url: impl Into<String>) -> Self {
        Self {
            price,
            source_url: source_url.into(),
            unit_value: None,
        }
    }

    #[must_use]
    pub fn with_unit_value(mut self, unit_value: Option<Decimal>) -> Self {
        self.unit_value = unit_value;
        self
    }

    /// Ranking key for value comparisons: the unit value when known, else the
    /// plain price.
    #[must_use]
    pub fn value_key(&self) -> Decimal {
        self.unit_value.unwrap_or(self.price)
    }

    #[must_use]
    pub fn store(&self) -> String {
        store_identity(&self.source_url)
    }
}

/// Every price observed for a single named variant, e.g.
/// `"Cerave Cleanser (236ml)"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPrices {
    pub name: String,
    pub options: Vec<PriceOption>,
}

impl VariantPrices {
    #[must_use]
    pub fn new(name: impl Into<String>, options: Vec<PriceOption>) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Lowest-priced option; the first one wins on equal prices.
    #[must_use]
    pub fn cheapest(&self) -> Option<&PriceOption> {
        self.options
            .iter()
            .reduce(|best, next| if next.price < best.price { next } else { best })
    }
}
