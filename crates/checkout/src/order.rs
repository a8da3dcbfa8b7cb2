//! Order record model.
//!
//! An order is created only after a successful charge and is immutable
//! thereafter; later status transitions are driven by back-office systems.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marigold_core::{Money, OrderId, OrderStatus};

use crate::cart::CartLine;

/// Payment provider references for a completed charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRefs {
    /// Charge identifier from the provider.
    pub charge_id: String,
    /// Payment intent identifier from the provider.
    pub payment_intent_id: String,
}

/// Fraud signal attached by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FraudFlag {
    /// Provider risk score.
    pub score: f64,
}

/// A completed order.
///
/// `total` is the server-verified charge amount, authoritative over any
/// client-side estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Cart lines as charged.
    pub line_snapshot: Vec<CartLine>,
    pub subtotal: Money,
    pub shipping_cost: Money,
    pub discount: Money,
    /// Server-verified charge total.
    pub total: Money,
    pub promo_code: Option<String>,
    pub payment_refs: PaymentRefs,
    pub fraud_flag: Option<FraudFlag>,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
}
