//! The multi-step checkout flow.
//!
//! Drives `ContactInfo -> ShippingAddress -> Payment -> Processing ->
//! Complete`. Recoverable errors return the flow to the state they
//! originated in, with entered data retained; nothing ever moves the flow
//! forward past a failure.
//!
//! The submission protocol ordering in [`CheckoutFlow::submit_order`] is the
//! core invariant of the whole subsystem - see the step comments there.

use std::rc::Rc;

use marigold_core::{Email, Money, OrderId, OrderStatus};

use crate::address::{Address, AddressForm};
use crate::api::{
    CardFields, ChargeItem, ChargeRequest, CommerceApi, Credentials, PaymentIntent,
};
use crate::cart::CartLedger;
use crate::error::{CheckoutError, FieldError};
use crate::order::{FraudFlag, Order, PaymentRefs};
use crate::promo::{PromoApplication, PromoResolver};
use crate::session::{GuestPrefill, SessionStore, StorageTier};
use crate::shipping::{self, ShippingConfig, ShippingQuote};

use super::CheckoutState;

/// Minimum password length for inline account creation.
const MIN_PASSWORD_LENGTH: usize = 8;

/// How the contact step is being completed.
pub enum ContactSubmission {
    /// Continue as guest (or as the already-authenticated user).
    Guest,
    /// Inline login for a known email.
    Login { password: String, remember: bool },
    /// Inline account creation for an unknown email.
    Register { password: String, remember: bool },
}

// Manual Debug: passwords must never reach logs.
impl std::fmt::Debug for ContactSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Guest => write!(f, "Guest"),
            Self::Login { remember, .. } => f
                .debug_struct("Login")
                .field("password", &"[REDACTED]")
                .field("remember", remember)
                .finish(),
            Self::Register { remember, .. } => f
                .debug_struct("Register")
                .field("password", &"[REDACTED]")
                .field("remember", remember)
                .finish(),
        }
    }
}

/// Completion flags reported by the hosted card fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardCompletion {
    pub number: bool,
    pub expiry: bool,
    pub cvc: bool,
}

impl CardCompletion {
    const fn complete(self) -> bool {
        self.number && self.expiry && self.cvc
    }
}

/// Wallet/express confirmation returned by the payment provider.
///
/// Carries the contact and shipping details the form steps would have
/// collected; the form state may be empty on this path.
#[derive(Debug, Clone)]
pub struct WalletConfirmation {
    pub payment_method_id: String,
    pub payer_email: Email,
    pub shipping: Address,
    pub payment_intent_id: Option<String>,
}

/// Payment method entry paths.
#[derive(Debug)]
pub enum PaymentEntry {
    /// Manually entered card, tokenized at submission.
    Manual {
        card: CardFields,
        completion: CardCompletion,
    },
    /// A saved payment method; field completion checks are skipped
    /// entirely.
    Saved { payment_method_id: String },
    /// Wallet/express confirmation from the provider.
    Express { confirmation: WalletConfirmation },
}

/// Submission options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitOptions {
    /// Ask the provider to keep the card on file.
    pub save_card: bool,
    /// Save the shipping address to the account.
    pub save_address: bool,
}

/// Display totals; estimates only.
///
/// The server recomputes the charge from the cart contents - these numbers
/// exist for the summary panel, never for the charge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub shipping: ShippingQuote,
    pub discount: Money,
    pub estimated_total: Money,
}

/// Events the flow emits for collaborator surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEffect {
    /// Conversion analytics event; the pixel layer shapes and ships it.
    TrackConversion { order_id: OrderId, total: Money },
}

/// The checkout orchestrator.
///
/// One flow per checkout session. All collaborators are injected; nothing
/// here touches globals.
pub struct CheckoutFlow<A> {
    api: Rc<A>,
    cart: CartLedger,
    sessions: SessionStore,
    promo: PromoResolver<A>,
    shipping_config: ShippingConfig,

    state: CheckoutState,
    session: Option<crate::session::Session>,
    session_tier: StorageTier,
    email: Option<Email>,
    availability_memo: Option<(String, bool)>,
    address: Option<Address>,
    applied_promo: Option<PromoApplication>,
    /// Exactly one submission may be awaiting the provider.
    processing: bool,
    /// Set the moment a charge succeeds, before any bookkeeping. Suppresses
    /// the collaborator's empty-cart redirect while the cart is cleared.
    order_complete: bool,
    completed_order: Option<Order>,
    effects: Vec<CheckoutEffect>,
}

impl<A: CommerceApi> CheckoutFlow<A> {
    /// Assemble a flow from its collaborators.
    pub fn new(
        api: Rc<A>,
        cart: CartLedger,
        sessions: SessionStore,
        promo: PromoResolver<A>,
        shipping_config: ShippingConfig,
    ) -> Self {
        Self {
            api,
            cart,
            sessions,
            promo,
            shipping_config,
            state: CheckoutState::ContactInfo,
            session: None,
            session_tier: StorageTier::Remember,
            email: None,
            availability_memo: None,
            address: None,
            applied_promo: None,
            processing: false,
            order_complete: false,
            completed_order: None,
            effects: Vec::new(),
        }
    }

    /// Load persisted state when the checkout page opens: restore the
    /// session, prefill contact info, and re-validate any promo code saved
    /// earlier in this browsing session.
    pub async fn begin(&mut self) {
        if let Some((session, tier)) = self.sessions.load() {
            self.email = Some(session.profile.email.clone());
            self.session = Some(session);
            self.session_tier = tier;
        } else if let Some(prefill) = self.sessions.load_guest_prefill() {
            self.email = Some(prefill.email);
            self.address = prefill.address;
        }

        // Saved codes are revalidated, never trusted.
        self.applied_promo = self.promo.reapply_saved(self.cart.subtotal()).await;
    }

    // =========================================================================
    // Accessors for collaborator surfaces
    // =========================================================================

    /// Current checkout step.
    #[must_use]
    pub const fn state(&self) -> CheckoutState {
        self.state
    }

    /// The authenticated session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&crate::session::Session> {
        self.session.as_ref()
    }

    /// Contact email collected so far.
    #[must_use]
    pub const fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// The currently applied promo, if the server accepted one.
    #[must_use]
    pub const fn applied_promo(&self) -> Option<&PromoApplication> {
        self.applied_promo.as_ref()
    }

    /// The placed order once the flow completes.
    #[must_use]
    pub const fn completed_order(&self) -> Option<&Order> {
        self.completed_order.as_ref()
    }

    /// Mutable access to the cart (the drawer mutates it mid-checkout).
    pub const fn cart_mut(&mut self) -> &mut CartLedger {
        &mut self.cart
    }

    /// Read access to the cart.
    #[must_use]
    pub const fn cart(&self) -> &CartLedger {
        &self.cart
    }

    /// Whether the empty-cart auto-redirect should fire.
    ///
    /// False once a charge has succeeded, even though the cart is cleared at
    /// the end of submission - otherwise the redirect would yank the
    /// customer off the confirmation screen mid-flow.
    #[must_use]
    pub fn should_redirect_empty_cart(&self) -> bool {
        self.cart.is_empty() && !self.order_complete
    }

    /// Drain pending collaborator effects.
    pub fn take_effects(&mut self) -> Vec<CheckoutEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Display totals for the summary panel. Estimates only; the charge
    /// endpoint receives cart contents, never these numbers.
    #[must_use]
    pub fn totals(&self) -> CheckoutTotals {
        let subtotal = self.cart.subtotal();
        let shipping = shipping::quote(self.cart.lines(), &self.shipping_config);
        let discount = self
            .applied_promo
            .as_ref()
            .map_or_else(Money::zero, |p| p.resolved_discount);
        CheckoutTotals {
            subtotal,
            shipping,
            discount,
            estimated_total: subtotal.saturating_sub(discount) + shipping.cost,
        }
    }

    // =========================================================================
    // ContactInfo step
    // =========================================================================

    /// Whether no account exists for this email.
    ///
    /// Memoized per distinct input so repeated renders don't re-query.
    /// Fails **open**: if the lookup errors, the email is treated as
    /// available, because a non-critical lookup must never block checkout.
    pub async fn email_available(&mut self, email: &Email) -> bool {
        if let Some((checked, available)) = &self.availability_memo
            && checked == email.as_str()
        {
            return *available;
        }

        let available = match self.api.check_email_available(email).await {
            Ok(response) => response.available,
            Err(e) => {
                tracing::warn!("email availability check failed, failing open: {e}");
                true
            }
        };
        self.availability_memo = Some((email.as_str().to_owned(), available));
        available
    }

    /// Complete the contact step and advance to the shipping address.
    ///
    /// An already-authenticated user skips inline auth entirely. Inline
    /// registration is gated by a password-strength check; inline login goes
    /// through the primary authentication path.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] for a malformed email or weak
    /// password, [`CheckoutError::Auth`] when login/registration is
    /// rejected, and [`CheckoutError::WrongState`] outside the contact step.
    /// The flow stays in the contact step on every error.
    pub async fn submit_contact(
        &mut self,
        email_input: &str,
        submission: ContactSubmission,
    ) -> Result<CheckoutState, CheckoutError> {
        self.expect(CheckoutState::ContactInfo)?;

        // An existing authenticated user skips both inline paths.
        if let Some(session) = &self.session {
            self.email = Some(session.profile.email.clone());
            self.state = CheckoutState::ShippingAddress;
            return Ok(self.state);
        }

        let email = Email::parse(email_input.trim())
            .map_err(|e| FieldError::new("email", e.to_string()))?;

        match submission {
            ContactSubmission::Guest => {}
            ContactSubmission::Login { password, remember } => {
                self.authenticate(&email, &password, remember, false).await?;
            }
            ContactSubmission::Register { password, remember } => {
                validate_password(&password)?;
                self.authenticate(&email, &password, remember, true).await?;
            }
        }

        self.email = Some(email);
        self.state = CheckoutState::ShippingAddress;
        Ok(self.state)
    }

    async fn authenticate(
        &mut self,
        email: &Email,
        password: &str,
        remember: bool,
        create_account: bool,
    ) -> Result<(), CheckoutError> {
        let credentials = Credentials {
            email: email.clone(),
            password: password.to_owned(),
        };
        let result = if create_account {
            self.api.register(&credentials).await
        } else {
            self.api.login(&credentials).await
        };

        let session = result.map_err(|e| {
            tracing::info!("inline auth failed: {e}");
            CheckoutError::Auth(if create_account {
                "could not create your account".to_owned()
            } else {
                "email or password is incorrect".to_owned()
            })
        })?;

        let tier = if remember {
            StorageTier::Remember
        } else {
            StorageTier::Ephemeral
        };
        self.sessions.write(&session, tier);
        self.session = Some(session);
        self.session_tier = tier;
        Ok(())
    }

    /// Log out: destroy the session in memory and in both storage tiers.
    pub fn logout(&mut self) {
        self.session = None;
        self.sessions.clear();
    }

    // =========================================================================
    // ShippingAddress step
    // =========================================================================

    /// Address to prefill the form with: the first saved account address,
    /// else a stashed guest address from a previous visit.
    #[must_use]
    pub fn prefill_address(&self) -> Option<&Address> {
        self.session
            .as_ref()
            .and_then(|s| s.addresses.first())
            .or(self.address.as_ref())
    }

    /// Validate and accept the shipping address, advancing to payment.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] with the first failing field;
    /// the flow stays in the address step.
    pub fn submit_address(&mut self, form: &AddressForm) -> Result<CheckoutState, CheckoutError> {
        self.expect(CheckoutState::ShippingAddress)?;

        let address = form.validate()?;
        self.address = Some(address);
        self.state = CheckoutState::Payment;
        Ok(self.state)
    }

    // =========================================================================
    // Promo
    // =========================================================================

    /// Apply a promo code against the current subtotal.
    ///
    /// Fail-closed: the returned application carries a zero discount unless
    /// the server accepted the code.
    pub async fn apply_promo(&mut self, code: &str) -> PromoApplication {
        let application = self.promo.apply(code, self.cart.subtotal()).await;
        self.applied_promo = application.is_applied().then(|| application.clone());
        application
    }

    /// Remove the applied promo and forget the saved code.
    pub fn remove_promo(&mut self) {
        self.applied_promo = None;
        self.promo.clear_saved();
    }

    // =========================================================================
    // Payment + submission
    // =========================================================================

    /// Create a payment intent for the wallet/express sheet.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Charge`] if the intent cannot be created and
    /// [`CheckoutError::WrongState`] once processing has begun.
    pub async fn begin_express(&mut self) -> Result<PaymentIntent, CheckoutError> {
        if !self.state.can_submit_express() {
            return Err(CheckoutError::WrongState {
                expected: CheckoutState::Payment,
                actual: self.state,
            });
        }
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let items: Vec<ChargeItem> = self.cart.lines().iter().map(ChargeItem::from).collect();
        let promo_code = self.promo_code();
        self.api
            .create_payment_intent(&items, promo_code.as_deref())
            .await
            .map_err(|e| {
                tracing::warn!("failed to create payment intent: {e}");
                CheckoutError::Charge("could not start express checkout".to_owned())
            })
    }

    /// Submit the order.
    ///
    /// The ordering below is the core invariant of the subsystem:
    ///
    /// 1. persist a new address if requested (best-effort, deduped);
    /// 2. obtain a payment method token, or reuse a saved one;
    /// 3. charge with the full cart contents - the server recomputes the
    ///    total, the client never sends one;
    /// 4. on success, set the order-complete guard **before** any
    ///    persistence, so the empty-cart redirect cannot fire mid-flow;
    /// 5. write the order record - best-effort, a failure never rolls back
    ///    the charge;
    /// 6. update the session (or stash guest prefill);
    /// 7. fire confirmation email and conversion analytics, non-blocking;
    /// 8. clear the cart and the saved promo code.
    ///
    /// # Errors
    ///
    /// Below the charge boundary every error is recoverable: the flow
    /// returns to the originating state with entered data retained.
    /// [`CheckoutError::SubmissionInFlight`] is returned while a previous
    /// submission is still awaiting the provider.
    pub async fn submit_order(
        &mut self,
        entry: PaymentEntry,
        opts: SubmitOptions,
    ) -> Result<Order, CheckoutError> {
        if self.processing {
            return Err(CheckoutError::SubmissionInFlight);
        }

        let allowed = match entry {
            PaymentEntry::Express { .. } => self.state.can_submit_express(),
            _ => self.state.can_submit_payment(),
        };
        if !allowed {
            return Err(CheckoutError::WrongState {
                expected: CheckoutState::Payment,
                actual: self.state,
            });
        }
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let origin = self.state;
        self.processing = true;
        self.state = CheckoutState::Processing;

        let result = self.submit_inner(entry, opts).await;
        self.processing = false;

        match result {
            Ok(order) => {
                self.state = CheckoutState::Complete;
                Ok(order)
            }
            Err(e) => {
                // Never forward: back to where the submission started,
                // entered data untouched.
                self.state = origin;
                Err(e)
            }
        }
    }

    async fn submit_inner(
        &mut self,
        entry: PaymentEntry,
        opts: SubmitOptions,
    ) -> Result<Order, CheckoutError> {
        // Express supplies contact and shipping from the wallet; the form
        // state may be empty on that path and is not consulted.
        let (email, address) = match &entry {
            PaymentEntry::Express { confirmation } => (
                confirmation.payer_email.clone(),
                confirmation.shipping.clone(),
            ),
            _ => {
                let email = self
                    .email
                    .clone()
                    .ok_or_else(|| FieldError::new("email", "contact email is missing"))?;
                let address = self
                    .address
                    .clone()
                    .ok_or_else(|| FieldError::new("address", "shipping address is missing"))?;
                (email, address)
            }
        };

        if let PaymentEntry::Manual { completion, .. } = &entry
            && !completion.complete()
        {
            return Err(CheckoutError::Validation(FieldError::new(
                "card",
                "please complete your card details",
            )));
        }

        // Step 1: persist a new address when asked. Best-effort - a failed
        // address save must not stand between the customer and the charge.
        if opts.save_address {
            self.save_address_deduped(&address).await;
        }

        // Step 2: payment method token.
        let (payment_method_id, payment_intent_id) = match &entry {
            PaymentEntry::Manual { card, .. } => {
                let token = self.api.tokenize_card(card).await.map_err(|e| {
                    tracing::info!("tokenization failed: {e}");
                    CheckoutError::Tokenization("could not verify your card".to_owned())
                })?;
                (token.id, None)
            }
            PaymentEntry::Saved { payment_method_id } => (payment_method_id.clone(), None),
            PaymentEntry::Express { confirmation } => (
                confirmation.payment_method_id.clone(),
                confirmation.payment_intent_id.clone(),
            ),
        };

        // Step 3: charge with the full current cart contents. The client
        // total is a display estimate; the server recomputes and returns
        // the verified total.
        let request = ChargeRequest {
            payment_method_id: Some(payment_method_id),
            items: self.cart.lines().iter().map(ChargeItem::from).collect(),
            promo_code: self.promo_code(),
            customer_email: email.as_str().to_owned(),
            save_card: opts.save_card,
            payment_intent_id,
        };

        let receipt = self.api.process_payment(&request).await.map_err(|e| {
            tracing::warn!("charge call failed: {e}");
            CheckoutError::Charge("payment could not be processed".to_owned())
        })?;
        if !receipt.success {
            return Err(CheckoutError::Charge("payment was declined".to_owned()));
        }

        // Step 4: the charge has succeeded. Everything from here on is
        // bookkeeping; set the guard first so clearing the cart below
        // cannot trigger the empty-cart redirect.
        self.order_complete = true;

        let totals = self.totals();
        let order = Order {
            id: OrderId::new(),
            line_snapshot: self.cart.lines().to_vec(),
            subtotal: totals.subtotal,
            shipping_cost: totals.shipping.cost,
            discount: totals.discount,
            total: Money::new(receipt.verified_total, totals.subtotal.currency_code),
            promo_code: self.promo_code(),
            payment_refs: PaymentRefs {
                charge_id: receipt.charge_id.clone(),
                payment_intent_id: receipt.payment_intent_id.clone(),
            },
            fraud_flag: receipt.is_fraud_suspect.then(|| FraudFlag {
                score: receipt.fraud_score,
            }),
            status: if receipt.is_fraud_suspect {
                OrderStatus::FraudReview
            } else {
                OrderStatus::Placed
            },
            placed_at: chrono::Utc::now(),
        };

        // Step 5: best-effort order record. The charge already happened;
        // a failed write is a record-sync gap, not a checkout failure.
        if let Err(e) = self.api.create_order(&order).await {
            tracing::error!(
                order_id = %order.id,
                charge_id = %order.payment_refs.charge_id,
                "order record write failed after successful charge: {e}"
            );
        }

        // Step 6: session history for account holders, prefill stash for
        // guests.
        if let Some(session) = self.session.as_mut() {
            session.order_history.push(order.clone());
            self.sessions.write(session, self.session_tier);
        } else {
            self.sessions.write_guest_prefill(&GuestPrefill {
                email: email.clone(),
                address: Some(address),
            });
        }

        // Step 7: confirmation email and conversion analytics, neither
        // blocking.
        if let Err(e) = self.api.send_order_confirmation(&email, order.id).await {
            tracing::warn!(order_id = %order.id, "confirmation email failed: {e}");
        }
        self.effects.push(CheckoutEffect::TrackConversion {
            order_id: order.id,
            total: order.total,
        });

        // Step 8: the cart and the saved code are spent.
        self.cart.clear();
        self.promo.clear_saved();
        self.applied_promo = None;

        self.completed_order = Some(order.clone());
        Ok(order)
    }

    /// Save the address to the account unless an entry with the same
    /// street+zip already exists. Absorbs failures: address bookkeeping
    /// never blocks a submission.
    async fn save_address_deduped(&mut self, address: &Address) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let key = address.dedupe_key();
        if session.addresses.iter().any(|a| a.dedupe_key() == key) {
            return;
        }
        session.addresses.push(address.clone());

        let token = session.auth_token.clone();
        let addresses = session.addresses.clone();
        if let Err(e) = self.api.update_user_addresses(&token, &addresses).await {
            tracing::warn!("failed to save address to account: {e}");
        }
    }

    fn promo_code(&self) -> Option<String> {
        self.applied_promo.as_ref().map(|p| p.code.clone())
    }

    fn expect(&self, expected: CheckoutState) -> Result<(), CheckoutError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongState {
                expected,
                actual: self.state,
            })
        }
    }
}

/// Password strength gate for inline account creation.
fn validate_password(password: &str) -> Result<(), CheckoutError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(CheckoutError::Validation(FieldError::new(
            "password",
            format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
        )));
    }
    Ok(())
}
