//! Shopping-plan optimizer: groups variants into product families, prices
//! every store assignment with shipping rules applied, and returns the
//! cheapest plan.

pub mod family;
pub mod optimizer;
pub mod plan;
pub mod shipping;

pub use family::{family_name, group_by_family, ProductFamily};
pub use optimizer::{optimize, OptimizeGoal, PlanOptimizer};
pub use plan::{LineItem, OptimizedPlan, StoreCart};
pub use shipping::{
    resolve_rule_for_store, shipping_cost_for, ShippingPolicy, StoreShippingRule,
    NO_FREE_SHIPPING_THRESHOLD,
};
