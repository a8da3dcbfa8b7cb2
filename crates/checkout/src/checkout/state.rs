//! Checkout step state machine.

use serde::{Deserialize, Serialize};

/// The checkout steps.
///
/// State transitions:
/// ```text
/// ContactInfo ──► ShippingAddress ──► Payment ──► Processing ──► Complete
///      ▲                 ▲               ▲            │
///      └─────────────────┴───────────────┴────────────┘
///                 (recoverable errors return to the
///                  originating state, never forward)
/// ```
///
/// The wallet/express path may submit from any pre-processing state, since
/// the provider supplies the contact and shipping details the earlier steps
/// would have collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    /// Email entry, optional inline login/registration.
    #[default]
    ContactInfo,

    /// Shipping address entry.
    ShippingAddress,

    /// Payment method entry (manual, saved, or express).
    Payment,

    /// A charge is in flight; resubmission is rejected.
    Processing,

    /// Order placed (terminal state).
    Complete,
}

impl CheckoutState {
    /// Returns true if contact info can be submitted in this state.
    #[must_use]
    pub const fn can_submit_contact(&self) -> bool {
        matches!(self, Self::ContactInfo)
    }

    /// Returns true if a shipping address can be submitted in this state.
    #[must_use]
    pub const fn can_submit_address(&self) -> bool {
        matches!(self, Self::ShippingAddress)
    }

    /// Returns true if a manual or saved payment method can be submitted in
    /// this state.
    #[must_use]
    pub const fn can_submit_payment(&self) -> bool {
        matches!(self, Self::Payment)
    }

    /// Returns true if the wallet/express path can submit from this state.
    #[must_use]
    pub const fn can_submit_express(&self) -> bool {
        matches!(self, Self::ContactInfo | Self::ShippingAddress | Self::Payment)
    }

    /// Returns true if this is a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Returns the state name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ContactInfo => "contact_info",
            Self::ShippingAddress => "shipping_address",
            Self::Payment => "payment",
            Self::Processing => "processing",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
