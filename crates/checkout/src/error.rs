//! Checkout error taxonomy.
//!
//! The propagation policy is split at the charge boundary: anything below it
//! (validation, tokenization, the charge itself) is recoverable and surfaces
//! to the caller; anything at or after a successful charge (order record
//! write, session re-persist, confirmation email) is logged and absorbed,
//! because reversing a completed payment is worse for the customer than a
//! silent record-sync gap.
//!
//! Two failure classes never appear here at all by design:
//!
//! - the email-availability lookup fails **open** (treated as available)
//!   inside the flow, because a non-critical lookup must not block checkout;
//! - promo validation fails **closed** (zero discount) inside
//!   [`crate::promo::PromoResolver`], because a broken validator must never
//!   grant a discount.

use thiserror::Error;

use crate::checkout::CheckoutState;

/// A field-level validation failure, recoverable in place.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Form field the failure belongs to.
    pub field: &'static str,
    /// User-facing message.
    pub message: String,
}

impl FieldError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors surfaced by the checkout flow.
///
/// Every variant is recoverable: the flow returns to the state the error
/// originated in, with entered data retained.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Field-level validation failure.
    #[error("validation failed: {0}")]
    Validation(#[from] FieldError),

    /// Inline login/registration against the primary auth path failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Payment method tokenization failed; no charge was attempted.
    #[error("payment tokenization failed: {0}")]
    Tokenization(String),

    /// The charge was declined or the charge call failed; assumed to have
    /// had no side effect, safe to retry.
    #[error("charge failed: {0}")]
    Charge(String),

    /// A submission is already awaiting the payment provider.
    #[error("a submission is already in flight")]
    SubmissionInFlight,

    /// The operation is not valid in the current checkout step.
    #[error("expected the {expected} step, currently in {actual}")]
    WrongState {
        expected: CheckoutState,
        actual: CheckoutState,
    },

    /// The cart is empty; there is nothing to charge.
    #[error("cart is empty")]
    EmptyCart,
}
