//! Status enums for orders.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// An order record is created only after a successful charge, so `Placed` is
/// the initial state. Later transitions (fulfillment, refunds) are driven by
/// back-office systems, not by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Charge succeeded; record written (or write attempted).
    #[default]
    Placed,
    /// Flagged for manual review by the payment provider's fraud signal.
    FraudReview,
    /// Fulfilled by the warehouse.
    Fulfilled,
    /// Refunded after the fact.
    Refunded,
    /// Cancelled by support.
    Cancelled,
}

impl OrderStatus {
    /// Returns the status name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::FraudReview => "fraud_review",
            Self::Fulfilled => "fulfilled",
            Self::Refunded => "refunded",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
