//! Shipping cost calculation.
//!
//! Pure functions over cart lines and a [`ShippingConfig`]; no side effects,
//! no I/O. All math is decimal - the rate normalization rule is defined in
//! exact cents and would not survive binary floats.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use marigold_core::{CurrencyCode, Money, ProductId};

use crate::cart::CartLine;

/// Per-product shipping rate override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTemplate {
    /// Charged once per line.
    pub base: Decimal,
    /// Charged per unit, after normalization.
    pub additional: Decimal,
}

/// Store-wide shipping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingConfig {
    /// Default per-line base rate.
    pub base_rate: Decimal,
    /// Default per-unit additional rate.
    pub additional_item_rate: Decimal,
    /// Per-product rate templates overriding the defaults.
    pub product_overrides: HashMap<ProductId, RateTemplate>,
    /// Subtotal at which shipping becomes free; zero disables.
    pub free_shipping_threshold: Decimal,
    /// Added once per shipment.
    pub handling_fee: Decimal,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            base_rate: Decimal::new(500, 2),
            additional_item_rate: Decimal::ZERO,
            product_overrides: HashMap::new(),
            free_shipping_threshold: Decimal::ZERO,
            handling_fee: Decimal::ZERO,
        }
    }
}

impl ShippingConfig {
    /// Resolve `(base, additional)` for a product: template override when
    /// present, store-wide defaults otherwise.
    #[must_use]
    pub fn rates_for(&self, product_id: &ProductId) -> (Decimal, Decimal) {
        self.product_overrides.get(product_id).map_or(
            (self.base_rate, self.additional_item_rate),
            |template| (template.base, template.additional),
        )
    }
}

/// A computed shipping quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingQuote {
    /// What will be charged.
    pub cost: Money,
    /// What the free-shipping threshold waived ("you saved $X"), zero when
    /// shipping was charged.
    pub savings: Money,
}

/// Quote shipping for a cart.
///
/// Per line: resolve the rate pair, then either `base x qty` (no additional
/// rate) or `base + normalized_additional x qty`. Lines are summed, the
/// handling fee is added once, and the free-shipping threshold is applied
/// last against the cart subtotal - the waived amount is still reported as
/// savings for display.
#[must_use]
pub fn quote(lines: &[CartLine], config: &ShippingConfig) -> ShippingQuote {
    let subtotal: Decimal = lines.iter().map(|l| l.line_total().amount).sum();

    let mut total = Decimal::ZERO;
    for line in lines {
        let (base, additional) = config.rates_for(&line.product_id);
        let qty = Decimal::from(line.quantity);
        total += if additional.is_zero() {
            base * qty
        } else {
            base + normalize_additional_rate(additional) * qty
        };
    }
    total += config.handling_fee;

    let threshold = config.free_shipping_threshold;
    if threshold > Decimal::ZERO && subtotal >= threshold {
        ShippingQuote {
            cost: Money::zero(),
            savings: Money::new(total, CurrencyCode::USD),
        }
    } else {
        ShippingQuote {
            cost: Money::new(total, CurrencyCode::USD),
            savings: Money::zero(),
        }
    }
}

/// Snap an additional per-unit rate onto the allowed cents grid.
///
/// Rates whose cents are 25, 50, 75 or 95 pass through unchanged. Anything
/// else rounds to the nearest quarter-dollar, and a result landing on a
/// whole dollar is bumped up a quarter - a whole-dollar additional rate
/// never survives normalization.
///
/// `1.10` -> cents 10 -> nearest quarter `1.00` -> whole dollar -> `1.25`.
#[must_use]
pub fn normalize_additional_rate(rate: Decimal) -> Decimal {
    let hundred = Decimal::from(100u32);
    let cents = (rate.fract() * hundred)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    let allowed = [25u32, 50, 75, 95].map(Decimal::from);
    if allowed.contains(&cents) {
        return rate;
    }

    let four = Decimal::from(4u32);
    let mut adjusted = (rate * four)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        / four;

    if adjusted.fract().is_zero() {
        adjusted += Decimal::new(25, 2);
    }
    adjusted
}
