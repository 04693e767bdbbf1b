//! Pack-size parsing from variant names and per-100ml value math.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

static MULTI_PACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\((\d+)x(\d+(?:\.\d+)?)ml\)").expect("valid multi-pack regex")
});

static SINGLE_PACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\((\d+(?:\.\d+)?)ml\)").expect("valid volume regex"));

/// Volume information carried by a variant name such as `"Toner (2x200ml)"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSize {
    /// Volume of a single unit in ml.
    pub volume_ml: Option<Decimal>,
    pub quantity: u32,
    /// `quantity * volume_ml`.
    pub total_volume_ml: Option<Decimal>,
}

impl ProductSize {
    fn new(volume_ml: Decimal, quantity: u32) -> Self {
        Self {
            volume_ml: Some(volume_ml),
            quantity,
            total_volume_ml: Some(volume_ml * Decimal::from(quantity)),
        }
    }

    fn unknown() -> Self {
        Self {
            volume_ml: None,
            quantity: 1,
            total_volume_ml: None,
        }
    }

    /// Price per 100ml for this size, if the volume is known.
    #[must_use]
    pub fn unit_value(&self, price: Decimal) -> Option<Decimal> {
        self.total_volume_ml
            .and_then(|total| price_per_100ml(price, total))
    }
}

/// Extracts pack size from a variant name.
///
/// Recognizes `(236ml)` and `(2x236ml)`, case-insensitively. Names without a
/// volume annotation yield a size with no volume and a quantity of one.
#[must_use]
pub fn parse_product_name(name: &str) -> ProductSize {
    if let Some(caps) = MULTI_PACK.captures(name) {
        let quantity = caps[1].parse::<u32>().ok();
        let volume = Decimal::from_str(&caps[2]).ok();
        if let (Some(quantity), Some(volume)) = (quantity, volume) {
            return ProductSize::new(volume, quantity);
        }
    }

    if let Some(caps) = SINGLE_PACK.captures(name) {
        if let Ok(volume) = Decimal::from_str(&caps[1]) {
            return ProductSize::new(volume, 1);
        }
    }

    ProductSize::unknown()
}

/// `price / total_volume_ml * 100`, rounded to four decimal places.
///
/// Returns `None` for a zero volume.
#[must_use]
pub fn price_per_100ml(price: Decimal, total_volume_ml: Decimal) -> Option<Decimal> {
    if total_volume_ml.is_zero() {
        return None;
    }
    price
        .checked_div(total_volume_ml)
        .map(|per_ml| (per_ml * Decimal::ONE_HUNDRED).round_dp(4))
}

/// Human-readable size: `"236ml"` or `"2x236ml (472ml)"`. Empty when unknown.
#[must_use]
pub fn format_volume(size: &ProductSize) -> String {
    let Some(volume) = size.volume_ml else {
        return String::new();
    };

    if size.quantity == 1 {
        return format!("{}ml", volume.round_dp(0));
    }

    let total = size.total_volume_ml.unwrap_or_default();
    format!(
        "{}x{}ml ({}ml)",
        size.quantity,
        volume.round_dp(0),
        total.round_dp(0)
    )
}
