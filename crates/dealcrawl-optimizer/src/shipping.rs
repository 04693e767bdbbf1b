//! Per-store shipping rules and the shipping cost function.

use std::collections::HashMap;

use dealcrawl_core::{normalize_site, strip_www, ShippingEntry};
use rust_decimal::Decimal;

/// Threshold given to stores without a configured rule. High enough that no
/// real basket reaches it.
pub const NO_FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreShippingRule {
    pub store: String,
    pub flat_cost: Decimal,
    /// Subtotals at or above this amount ship free.
    pub free_over: Decimal,
}

impl StoreShippingRule {
    #[must_use]
    pub fn new(store: impl Into<String>, flat_cost: Decimal, free_over: Decimal) -> Self {
        Self {
            store: store.into(),
            flat_cost,
            free_over,
        }
    }

    /// Rule for a store nobody configured: flat fee, no free shipping.
    #[must_use]
    pub fn fallback(store: impl Into<String>, flat_cost: Decimal) -> Self {
        Self::new(store, flat_cost, NO_FREE_SHIPPING_THRESHOLD)
    }

    #[must_use]
    pub fn shipping_cost_for(&self, subtotal: Decimal) -> Decimal {
        shipping_cost_for(subtotal, self)
    }

    #[must_use]
    pub fn qualifies_for_free_shipping(&self, subtotal: Decimal) -> bool {
        subtotal >= self.free_over
    }

    /// Whether the store offers free shipping at any reachable subtotal.
    #[must_use]
    pub fn has_free_shipping(&self) -> bool {
        self.free_over < NO_FREE_SHIPPING_THRESHOLD
    }
}

/// Zero when `subtotal` reaches the rule's threshold, else the flat fee.
#[must_use]
pub fn shipping_cost_for(subtotal: Decimal, rule: &StoreShippingRule) -> Decimal {
    if rule.qualifies_for_free_shipping(subtotal) {
        Decimal::ZERO
    } else {
        rule.flat_cost
    }
}

/// Looks up the rule for `store`: exact key first, then without `"www."`,
/// then a default rule with `default_flat_cost` and no free shipping.
/// `store` is compared in [`normalize_site`] form.
///
/// The default case logs a warning.
#[must_use]
pub fn resolve_rule_for_store(
    store: &str,
    rules: &HashMap<String, StoreShippingRule>,
    default_flat_cost: Decimal,
) -> StoreShippingRule {
    if let Some(rule) = lookup(store, rules) {
        return rule.clone();
    }

    tracing::warn!(
        store = %store,
        default_shipping = %default_flat_cost,
        "no shipping rule for store, using default shipping"
    );
    StoreShippingRule::fallback(strip_www(store), default_flat_cost)
}

fn lookup<'a>(
    store: &str,
    rules: &'a HashMap<String, StoreShippingRule>,
) -> Option<&'a StoreShippingRule> {
    let key = normalize_site(store);
    rules
        .get(&key)
        .or_else(|| rules.get(strip_www(&key)))
}

/// All configured shipping rules plus the flat fee for unknown stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingPolicy {
    rules: HashMap<String, StoreShippingRule>,
    default_flat_cost: Decimal,
}

impl ShippingPolicy {
    #[must_use]
    pub fn new(default_flat_cost: Decimal) -> Self {
        Self {
            rules: HashMap::new(),
            default_flat_cost,
        }
    }

    /// Builds a policy from shipping-file records. Each record is reachable
    /// both by its literal site and by the site without `"www."`.
    #[must_use]
    pub fn from_entries<'a, I>(entries: I, default_flat_cost: Decimal) -> Self
    where
        I: IntoIterator<Item = &'a ShippingEntry>,
    {
        let mut policy = Self::new(default_flat_cost);
        for entry in entries {
            policy.insert(StoreShippingRule::new(
                entry.site.clone(),
                entry.shipping,
                entry.free_over,
            ));
        }
        policy
    }

    /// Registers a rule under its normalized store name and, if different,
    /// that name without `"www."`. A later rule for the same key replaces the
    /// earlier one.
    pub fn insert(&mut self, rule: StoreShippingRule) {
        let key = normalize_site(&rule.store);
        let bare = strip_www(&key).to_string();
        if bare != key {
            self.rules.insert(bare, rule.clone());
        }
        self.rules.insert(key, rule);
    }

    #[must_use]
    pub fn default_flat_cost(&self) -> Decimal {
        self.default_flat_cost
    }

    #[must_use]
    pub fn rules(&self) -> &HashMap<String, StoreShippingRule> {
        &self.rules
    }

    /// The configured rule for `store`, if any. Never falls back and never logs.
    #[must_use]
    pub fn configured_rule(&self, store: &str) -> Option<&StoreShippingRule> {
        lookup(store, &self.rules)
    }

    /// See [`resolve_rule_for_store`].
    #[must_use]
    pub fn resolve(&self, store: &str) -> StoreShippingRule {
        resolve_rule_for_store(store, &self.rules, self.default_flat_cost)
    }
}
