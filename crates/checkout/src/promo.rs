//! Promotional discount resolution.
//!
//! The server is the only authority on whether a code is valid and what it
//! is worth; this module never infers validity locally. The trust boundary
//! is fail-closed: any transport error, decode error or `valid == false`
//! resolves to a **zero** discount, so a broken or unreachable validator can
//! never grant one.

use std::rc::Rc;

use rust_decimal::Decimal;

use marigold_core::Money;

use crate::api::{CommerceApi, PromoKind};
use crate::storage::{SharedStore, keys};

/// A resolved promo, ephemeral by design.
///
/// Never persisted as a source of truth - the discount is recomputed at the
/// point of charge, and a cached code is only a UI convenience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoApplication {
    /// Normalized code.
    pub code: String,
    /// Discount shape, as the server declared it. `None` when rejected.
    pub kind: Option<PromoKind>,
    /// Raw discount value from the server.
    pub value: Option<Decimal>,
    /// What the code is worth against the current subtotal.
    pub resolved_discount: Money,
}

impl PromoApplication {
    fn rejected(code: String) -> Self {
        Self {
            code,
            kind: None,
            value: None,
            resolved_discount: Money::zero(),
        }
    }

    /// Whether the server accepted the code.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        self.kind.is_some()
    }
}

/// Resolves promo codes against the server validator.
pub struct PromoResolver<A> {
    api: Rc<A>,
    ephemeral: SharedStore,
}

impl<A: CommerceApi> PromoResolver<A> {
    /// Create a resolver caching saved codes in the ephemeral tier.
    pub fn new(api: Rc<A>, ephemeral: SharedStore) -> Self {
        Self { api, ephemeral }
    }

    /// Resolve a code against the current subtotal.
    ///
    /// Fixed discounts clamp to the subtotal (a $10 code against an $8 cart
    /// is worth $8); percentage discounts compute on the subtotal, rounded
    /// to cents. Every failure path returns a zero-discount application
    /// rather than an error.
    pub async fn apply(&self, code: &str, subtotal: Money) -> PromoApplication {
        let code = normalize(code);
        if code.is_empty() {
            return PromoApplication::rejected(code);
        }

        let validation = match self.api.validate_promo(&code).await {
            Ok(validation) => validation,
            Err(e) => {
                // Fail-closed: an unreachable validator grants nothing.
                tracing::warn!(%code, "promo validation failed: {e}");
                return PromoApplication::rejected(code);
            }
        };

        let (Some(kind), Some(value)) = (validation.kind, validation.value) else {
            if validation.valid {
                tracing::warn!(%code, "promo marked valid but missing kind/value");
            }
            return PromoApplication::rejected(code);
        };
        if !validation.valid {
            return PromoApplication::rejected(code);
        }

        let discount = match kind {
            PromoKind::Fixed => Money::new(value, subtotal.currency_code).min(subtotal),
            PromoKind::Percentage => Money::new(
                (subtotal.amount * value / Decimal::from(100u32)).round_dp(2),
                subtotal.currency_code,
            ),
        };

        self.save_code(&code);

        PromoApplication {
            code,
            kind: Some(kind),
            value: Some(value),
            resolved_discount: discount,
        }
    }

    /// Re-validate and re-apply a code saved earlier in this browsing
    /// session, if any. The saved code is a convenience, not a guarantee:
    /// it goes back through the server before it is worth anything.
    pub async fn reapply_saved(&self, subtotal: Money) -> Option<PromoApplication> {
        let code = self.saved_code()?;
        let application = self.apply(&code, subtotal).await;
        if !application.is_applied() {
            // The code stopped validating since it was saved; drop it.
            self.clear_saved();
            return None;
        }
        Some(application)
    }

    /// The code saved in this browsing session, if any.
    #[must_use]
    pub fn saved_code(&self) -> Option<String> {
        match self.ephemeral.get(keys::PROMO_CODE) {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!("failed to read saved promo code: {e}");
                None
            }
        }
    }

    /// Forget the saved code (explicit removal or successful order).
    pub fn clear_saved(&self) {
        if let Err(e) = self.ephemeral.remove(keys::PROMO_CODE) {
            tracing::warn!("failed to clear saved promo code: {e}");
        }
    }

    fn save_code(&self, code: &str) {
        if let Err(e) = self.ephemeral.set(keys::PROMO_CODE, code) {
            tracing::warn!("failed to save promo code: {e}");
        }
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}
