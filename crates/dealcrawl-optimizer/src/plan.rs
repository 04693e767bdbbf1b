use dealcrawl_core::PriceOption;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::shipping::StoreShippingRule;

/// A variant bought at a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub variant: String,
    pub option: PriceOption,
}

/// Everything bought from one store, with shipping settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreCart {
    pub store: String,
    pub line_items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub qualifies_for_free_shipping: bool,
}

impl StoreCart {
    #[must_use]
    pub fn new(store: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            line_items: Vec::new(),
            subtotal: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            total: Decimal::ZERO,
            qualifies_for_free_shipping: false,
        }
    }

    pub fn push(&mut self, variant: impl Into<String>, option: PriceOption) {
        self.subtotal += option.price;
        self.line_items.push(LineItem {
            variant: variant.into(),
            option,
        });
    }

    /// Fixes shipping and total for the current subtotal.
    pub fn settle(&mut self, rule: &StoreShippingRule) {
        self.qualifies_for_free_shipping = rule.qualifies_for_free_shipping(self.subtotal);
        self.shipping_cost = rule.shipping_cost_for(self.subtotal);
        self.total = self.subtotal + self.shipping_cost;
    }

    #[must_use]
    pub fn ships_free(&self) -> bool {
        self.qualifies_for_free_shipping && self.shipping_cost.is_zero()
    }
}

/// Cheapest assignment found by the optimizer.
///
/// The default value is the empty plan: no carts and zero totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizedPlan {
    /// Sorted by store name.
    pub carts: Vec<StoreCart>,
    pub grand_total: Decimal,
    pub total_product_families: usize,
    pub total_shipping_paid: Decimal,
}

impl OptimizedPlan {
    /// Sorts `carts` by store and derives the plan totals from them.
    #[must_use]
    pub fn from_carts(mut carts: Vec<StoreCart>, total_product_families: usize) -> Self {
        carts.retain(|cart| !cart.line_items.is_empty());
        carts.sort_by(|a, b| a.store.cmp(&b.store));
        let grand_total = carts.iter().map(|cart| cart.total).sum();
        let total_shipping_paid = carts.iter().map(|cart| cart.shipping_cost).sum();
        Self {
            carts,
            grand_total,
            total_product_families,
            total_shipping_paid,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.carts.is_empty()
    }

    #[must_use]
    pub fn store_count(&self) -> usize {
        self.carts.len()
    }

    /// Sum of the selected item prices, shipping excluded.
    #[must_use]
    pub fn items_total(&self) -> Decimal {
        self.carts.iter().map(|cart| cart.subtotal).sum()
    }

    pub fn line_items(&self) -> impl Iterator<Item = (&StoreCart, &LineItem)> {
        self.carts
            .iter()
            .flat_map(|cart| cart.line_items.iter().map(move |item| (cart, item)))
    }
}
