//! Exhaustive shopping-plan search.
//!
//! Every assignment of one (variant, store, price) candidate per product
//! family is priced with shipping settled per store, and the cheapest one
//! wins. Shipping couples the families through free-shipping thresholds, so
//! no family can be decided on its own.

use std::collections::HashMap;

use dealcrawl_core::{PriceOption, VariantPrices};
use rust_decimal::Decimal;

use crate::family::group_by_family;
use crate::plan::{OptimizedPlan, StoreCart};
use crate::shipping::{ShippingPolicy, StoreShippingRule};

/// Search spaces above this many assignments are logged before the search
/// starts. The search still runs to completion.
const LARGE_SEARCH_WARN: u128 = 1_000_000;

/// What the optimizer ranks assignments by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptimizeGoal {
    /// Lowest shipping-inclusive total.
    #[default]
    LowestCost,
    /// Lowest shipping-inclusive total; among equal totals, the lowest summed
    /// price per 100ml (price when the volume is unknown). Candidates are also
    /// visited best value first.
    BestValue,
}

/// One way to buy a family: a variant at one store.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    variant: &'a str,
    store: usize,
    option: &'a PriceOption,
}

/// Finds the cheapest shopping plan for a set of priced variants.
#[derive(Debug, Clone, Copy)]
pub struct PlanOptimizer<'a> {
    policy: &'a ShippingPolicy,
    goal: OptimizeGoal,
}

impl<'a> PlanOptimizer<'a> {
    #[must_use]
    pub fn new(policy: &'a ShippingPolicy) -> Self {
        Self {
            policy,
            goal: OptimizeGoal::default(),
        }
    }

    #[must_use]
    pub fn with_goal(mut self, goal: OptimizeGoal) -> Self {
        self.goal = goal;
        self
    }

    #[must_use]
    pub fn goal(&self) -> OptimizeGoal {
        self.goal
    }

    /// Runs the search.
    ///
    /// Variants without prices are ignored. When a variant name repeats, the
    /// later entry replaces the earlier one. Returns the empty plan when
    /// nothing is left to buy.
    #[must_use]
    pub fn optimize(&self, prices: &[VariantPrices]) -> OptimizedPlan {
        let variants = dedupe_variants(prices);
        if variants.is_empty() {
            return OptimizedPlan::default();
        }

        let options_by_variant: HashMap<&str, &[PriceOption]> = variants.iter().copied().collect();
        let families = group_by_family(variants.iter().map(|(name, _)| *name));

        let mut stores = StoreIndex::default();
        let mut candidates: Vec<Vec<Candidate<'_>>> = families
            .iter()
            .map(|family| {
                family
                    .variants
                    .iter()
                    .flat_map(|variant| {
                        options_by_variant
                            .get(variant)
                            .copied()
                            .unwrap_or_default()
                            .iter()
                            .map(move |option| (*variant, option))
                    })
                    .map(|(variant, option)| Candidate {
                        variant,
                        store: stores.intern(option.store()),
                        option,
                    })
                    .collect()
            })
            .collect();

        if self.goal == OptimizeGoal::BestValue {
            for family in &mut candidates {
                family.sort_by_key(|candidate| candidate.option.value_key());
            }
        }

        let rules: Vec<StoreShippingRule> = stores
            .names
            .iter()
            .map(|store| self.policy.resolve(store))
            .collect();

        let combinations = candidates
            .iter()
            .try_fold(1u128, |acc, family| acc.checked_mul(family.len().try_into().ok()?));
        match combinations {
            Some(count) if count <= LARGE_SEARCH_WARN => {
                tracing::debug!(
                    families = candidates.len(),
                    stores = rules.len(),
                    combinations = count,
                    "searching shopping plans"
                );
            }
            _ => {
                tracing::warn!(
                    families = candidates.len(),
                    stores = rules.len(),
                    combinations = ?combinations,
                    "shopping plan search space is very large"
                );
            }
        }

        let best = self.search(&candidates, &rules);
        build_plan(&candidates, &best, &stores.names, &rules)
    }

    /// Odometer walk over all assignments, rightmost family fastest. Returns
    /// the winning candidate index per family.
    fn search(&self, candidates: &[Vec<Candidate<'_>>], rules: &[StoreShippingRule]) -> Vec<usize> {
        let mut indices = vec![0usize; candidates.len()];
        let mut best = indices.clone();
        let mut best_score: Option<Score> = None;
        let mut subtotals = vec![Decimal::ZERO; rules.len()];
        let mut used = vec![false; rules.len()];

        loop {
            let score = self.score(candidates, &indices, rules, &mut subtotals, &mut used);
            if best_score.is_none_or(|current| score.beats(current)) {
                best_score = Some(score);
                best.clone_from(&indices);
            }

            if !advance(&mut indices, candidates) {
                break;
            }
        }

        best
    }

    fn score(
        &self,
        candidates: &[Vec<Candidate<'_>>],
        indices: &[usize],
        rules: &[StoreShippingRule],
        subtotals: &mut [Decimal],
        used: &mut [bool],
    ) -> Score {
        subtotals.fill(Decimal::ZERO);
        used.fill(false);

        let mut value = Decimal::ZERO;
        for (family, &idx) in candidates.iter().zip(indices) {
            let candidate = family[idx];
            subtotals[candidate.store] += candidate.option.price;
            used[candidate.store] = true;
            if self.goal == OptimizeGoal::BestValue {
                value += candidate.option.value_key();
            }
        }

        let total: Decimal = subtotals
            .iter()
            .zip(used.iter())
            .zip(rules)
            .filter(|((_, used), _)| **used)
            .map(|((subtotal, _), rule)| *subtotal + rule.shipping_cost_for(*subtotal))
            .sum();

        Score {
            total,
            value,
            goal: self.goal,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Score {
    total: Decimal,
    value: Decimal,
    goal: OptimizeGoal,
}

impl Score {
    /// Strictly better only; earlier assignments keep ties.
    fn beats(self, other: Score) -> bool {
        if self.total != other.total {
            return self.total < other.total;
        }
        self.goal == OptimizeGoal::BestValue && self.value < other.value
    }
}

/// Convenience wrapper around [`PlanOptimizer`].
#[must_use]
pub fn optimize(
    prices: &[VariantPrices],
    policy: &ShippingPolicy,
    goal: OptimizeGoal,
) -> OptimizedPlan {
    PlanOptimizer::new(policy).with_goal(goal).optimize(prices)
}

/// Distinct store names in first-seen order.
#[derive(Debug, Default)]
struct StoreIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl StoreIndex {
    fn intern(&mut self, store: String) -> usize {
        if let Some(&idx) = self.positions.get(&store) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(store.clone());
        self.positions.insert(store, idx);
        idx
    }
}

/// Later duplicates replace earlier ones but keep the first position; empty
/// option lists are dropped.
fn dedupe_variants(prices: &[VariantPrices]) -> Vec<(&str, &[PriceOption])> {
    let mut ordered: Vec<(&str, &[PriceOption])> = Vec::with_capacity(prices.len());
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(prices.len());

    for variant in prices {
        let entry = (variant.name.as_str(), variant.options.as_slice());
        match seen.get(variant.name.as_str()) {
            Some(&idx) => ordered[idx] = entry,
            None => {
                seen.insert(variant.name.as_str(), ordered.len());
                ordered.push(entry);
            }
        }
    }

    ordered.retain(|(_, options)| !options.is_empty());
    ordered
}

/// Moves to the next assignment. Returns `false` once every assignment has
/// been visited.
fn advance(indices: &mut [usize], candidates: &[Vec<Candidate<'_>>]) -> bool {
    for pos in (0..indices.len()).rev() {
        indices[pos] += 1;
        if indices[pos] < candidates[pos].len() {
            return true;
        }
        indices[pos] = 0;
    }
    false
}

fn build_plan(
    candidates: &[Vec<Candidate<'_>>],
    indices: &[usize],
    stores: &[String],
    rules: &[StoreShippingRule],
) -> OptimizedPlan {
    let mut carts: Vec<Option<StoreCart>> = vec![None; stores.len()];

    for (family, &idx) in candidates.iter().zip(indices) {
        let candidate = family[idx];
        carts[candidate.store]
            .get_or_insert_with(|| StoreCart::new(stores[candidate.store].clone()))
            .push(candidate.variant, candidate.option.clone());
    }

    let carts = carts
        .into_iter()
        .zip(rules)
        .filter_map(|(cart, rule)| {
            cart.map(|mut cart| {
                cart.settle(rule);
                cart
            })
        })
        .collect();

    OptimizedPlan::from_carts(carts, candidates.len())
}

#[cfg(test)]
#[path = "optimizer_test.rs"]
mod tests;
