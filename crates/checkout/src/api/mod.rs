//! Server endpoints the core consumes.
//!
//! Each endpoint gets a typed request/response pair instead of loose JSON
//! shapes, and transport failures collapse into [`ApiError`]. The
//! orchestrator only ever sees the [`CommerceApi`] trait; tests substitute a
//! scripted implementation, production uses [`http::HttpCommerceApi`].

pub mod http;

pub use http::HttpCommerceApi;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use marigold_core::{Email, OrderId, ProductId};

use crate::address::Address;
use crate::cart::CartLine;
use crate::order::Order;
use crate::session::Session;

/// Transport-level API failure.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("parse error: {0}")]
    Decode(String),
}

/// `check_email_available` response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmailAvailability {
    /// Whether no account exists for the email.
    pub available: bool,
}

/// Promo discount kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromoKind {
    /// Percent off the subtotal.
    Percentage,
    /// Fixed amount off, clamped to the subtotal.
    Fixed,
}

/// `validate_promo` response.
///
/// The server is the only authority on validity and on kind/value; the
/// client never infers either locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoValidation {
    pub valid: bool,
    #[serde(default)]
    pub kind: Option<PromoKind>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `create_payment_intent` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Secret the wallet sheet confirms against.
    pub client_secret: String,
    pub id: String,
}

/// Raw card fields for tokenization. The provider's tokenization internals
/// are opaque; these fields pass straight through.
#[derive(Clone, Serialize)]
pub struct CardFields {
    pub number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: String,
}

// Manual Debug: card numbers must never reach logs.
impl std::fmt::Debug for CardFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardFields")
            .field("number", &"[REDACTED]")
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

/// Provider payment method token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentToken {
    pub id: String,
}

/// One cart line as sent to the charge endpoint.
///
/// Quantities and identities only - the server looks prices up itself and
/// recomputes the total. A client-computed amount is never part of the
/// charge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeItem {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl From<&CartLine> for ChargeItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            size: line.variant.size.clone(),
            color: line.variant.color.clone(),
        }
    }
}

/// `process_payment` request.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    pub payment_method_id: Option<String>,
    /// Full current cart contents; the server recomputes the total.
    pub items: Vec<ChargeItem>,
    pub promo_code: Option<String>,
    pub customer_email: String,
    pub save_card: bool,
    pub payment_intent_id: Option<String>,
}

/// `process_payment` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeReceipt {
    pub success: bool,
    pub charge_id: String,
    pub payment_intent_id: String,
    #[serde(default)]
    pub is_fraud_suspect: bool,
    #[serde(default)]
    pub fraud_score: f64,
    /// Server-recomputed charge amount, authoritative over any client
    /// estimate.
    pub verified_total: Decimal,
}

/// Login/registration credentials.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

// Manual Debug: passwords must never reach logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// The server endpoints the checkout core consumes.
///
/// Implementations are not required to produce `Send` futures: the core runs
/// on one cooperative UI thread.
#[allow(async_fn_in_trait)]
pub trait CommerceApi {
    /// Whether an account already exists for this email.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure. Callers in the checkout
    /// flow treat failure as "available" (fail-open).
    async fn check_email_available(&self, email: &Email) -> Result<EmailAvailability, ApiError>;

    /// Validate a promo code; the server owns validity and discount shape.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure. [`crate::promo`] treats
    /// failure as zero discount (fail-closed).
    async fn validate_promo(&self, code: &str) -> Result<PromoValidation, ApiError>;

    /// Create a payment intent for the wallet/express sheet.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure.
    async fn create_payment_intent(
        &self,
        items: &[ChargeItem],
        promo_code: Option<&str>,
    ) -> Result<PaymentIntent, ApiError>;

    /// Exchange raw card fields for an opaque payment method token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or provider rejection.
    async fn tokenize_card(&self, card: &CardFields) -> Result<PaymentToken, ApiError>;

    /// Charge the customer. The server recomputes the total from `items`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure.
    async fn process_payment(&self, request: &ChargeRequest) -> Result<ChargeReceipt, ApiError>;

    /// Write the order record. Best-effort bookkeeping after a successful
    /// charge.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure; callers log and continue.
    async fn create_order(&self, order: &Order) -> Result<(), ApiError>;

    /// Replace the authenticated user's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure.
    async fn update_user_addresses(
        &self,
        auth_token: &str,
        addresses: &[Address],
    ) -> Result<(), ApiError>;

    /// Trigger the order confirmation email. Best-effort; never blocks
    /// navigation.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure; callers log and continue.
    async fn send_order_confirmation(&self, email: &Email, order_id: OrderId)
    -> Result<(), ApiError>;

    /// Primary authentication path: log into an existing account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or rejected credentials.
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError>;

    /// Primary authentication path: create an account inline.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure or rejected registration.
    async fn register(&self, credentials: &Credentials) -> Result<Session, ApiError>;
}
