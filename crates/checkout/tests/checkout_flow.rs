//! End-to-end checkout flow tests against a scripted server.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use rust_decimal::Decimal;
use secrecy::SecretString;

use marigold_checkout::address::{Address, AddressForm};
use marigold_checkout::api::{
    ApiError, CardFields, ChargeItem, ChargeReceipt, ChargeRequest, CommerceApi, Credentials,
    EmailAvailability, PaymentIntent, PaymentToken, PromoKind, PromoValidation,
};
use marigold_checkout::cart::{CartLedger, ProductSummary, Variant};
use marigold_checkout::checkout::{
    CardCompletion, CheckoutEffect, CheckoutFlow, CheckoutState, ContactSubmission, PaymentEntry,
    SubmitOptions, WalletConfirmation,
};
use marigold_checkout::error::CheckoutError;
use marigold_checkout::order::Order;
use marigold_checkout::promo::PromoResolver;
use marigold_checkout::session::{Profile, Session, SessionStore};
use marigold_checkout::shipping::ShippingConfig;
use marigold_checkout::storage::{MemoryStore, SharedStore, keys};
use marigold_checkout::vault::SessionVault;
use marigold_core::{Email, Money, OrderId, ProductId, UserId};

// =============================================================================
// Scripted server
// =============================================================================

/// Scripted [`CommerceApi`]: every failure mode can be switched on, every
/// call is recorded.
#[derive(Default)]
struct MockApi {
    // check_email_available
    fail_availability: Cell<bool>,
    email_known: Cell<bool>,
    availability_calls: Cell<u32>,

    // validate_promo
    promos: RefCell<HashMap<String, PromoValidation>>,
    fail_promo: Cell<bool>,

    // tokenize_card / process_payment
    fail_tokenize: Cell<bool>,
    decline_charge: Cell<bool>,
    fail_charge: Cell<bool>,
    flag_fraud: Cell<bool>,
    verified_total: RefCell<Decimal>,
    charges: RefCell<Vec<ChargeRequest>>,

    // create_order / bookkeeping
    fail_create_order: Cell<bool>,
    orders_created: RefCell<Vec<Order>>,
    confirmations: RefCell<Vec<(String, OrderId)>>,
    address_updates: RefCell<Vec<Vec<Address>>>,

    // auth
    reject_auth: Cell<bool>,
}

impl MockApi {
    fn transport_error() -> ApiError {
        ApiError::Decode("scripted failure".into())
    }

    fn accept_promo(&self, code: &str, kind: PromoKind, value: Decimal) {
        self.promos.borrow_mut().insert(
            code.to_owned(),
            PromoValidation {
                valid: true,
                kind: Some(kind),
                value: Some(value),
                error: None,
            },
        );
    }

    fn session_for(email: &Email) -> Session {
        Session {
            user_id: UserId::new("usr_77"),
            profile: Profile {
                email: email.clone(),
                first_name: None,
                last_name: None,
            },
            auth_token: "tok_mock".into(),
            addresses: Vec::new(),
            order_history: Vec::new(),
        }
    }
}

impl CommerceApi for MockApi {
    async fn check_email_available(&self, _email: &Email) -> Result<EmailAvailability, ApiError> {
        self.availability_calls.set(self.availability_calls.get() + 1);
        if self.fail_availability.get() {
            return Err(Self::transport_error());
        }
        Ok(EmailAvailability {
            available: !self.email_known.get(),
        })
    }

    async fn validate_promo(&self, code: &str) -> Result<PromoValidation, ApiError> {
        if self.fail_promo.get() {
            return Err(Self::transport_error());
        }
        Ok(self.promos.borrow().get(code).cloned().unwrap_or(
            PromoValidation {
                valid: false,
                kind: None,
                value: None,
                error: Some("unknown code".into()),
            },
        ))
    }

    async fn create_payment_intent(
        &self,
        _items: &[ChargeItem],
        _promo_code: Option<&str>,
    ) -> Result<PaymentIntent, ApiError> {
        Ok(PaymentIntent {
            client_secret: "cs_mock".into(),
            id: "pi_mock".into(),
        })
    }

    async fn tokenize_card(&self, _card: &CardFields) -> Result<PaymentToken, ApiError> {
        if self.fail_tokenize.get() {
            return Err(Self::transport_error());
        }
        Ok(PaymentToken {
            id: "pm_mock".into(),
        })
    }

    async fn process_payment(&self, request: &ChargeRequest) -> Result<ChargeReceipt, ApiError> {
        if self.fail_charge.get() {
            return Err(Self::transport_error());
        }
        self.charges.borrow_mut().push(request.clone());
        Ok(ChargeReceipt {
            success: !self.decline_charge.get(),
            charge_id: "ch_mock".into(),
            payment_intent_id: request
                .payment_intent_id
                .clone()
                .unwrap_or_else(|| "pi_mock".into()),
            is_fraud_suspect: self.flag_fraud.get(),
            fraud_score: if self.flag_fraud.get() { 0.91 } else { 0.02 },
            verified_total: *self.verified_total.borrow(),
        })
    }

    async fn create_order(&self, order: &Order) -> Result<(), ApiError> {
        if self.fail_create_order.get() {
            return Err(Self::transport_error());
        }
        self.orders_created.borrow_mut().push(order.clone());
        Ok(())
    }

    async fn update_user_addresses(
        &self,
        _auth_token: &str,
        addresses: &[Address],
    ) -> Result<(), ApiError> {
        self.address_updates.borrow_mut().push(addresses.to_vec());
        Ok(())
    }

    async fn send_order_confirmation(
        &self,
        email: &Email,
        order_id: OrderId,
    ) -> Result<(), ApiError> {
        self.confirmations
            .borrow_mut()
            .push((email.as_str().to_owned(), order_id));
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        if self.reject_auth.get() {
            return Err(ApiError::Status {
                status: 401,
                message: "bad credentials".into(),
            });
        }
        Ok(Self::session_for(&credentials.email))
    }

    async fn register(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        if self.reject_auth.get() {
            return Err(ApiError::Status {
                status: 409,
                message: "account exists".into(),
            });
        }
        Ok(Self::session_for(&credentials.email))
    }
}

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    api: Rc<MockApi>,
    remember: SharedStore,
    ephemeral: SharedStore,
    flow: CheckoutFlow<MockApi>,
}

/// Route crate logs through the test writer; `RUST_LOG` filters as usual.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn vault() -> SessionVault {
    SessionVault::new(&SecretString::from("kH8!pQ2wXr9zLm4vNc7yTb3eFj6aDu1s"))
}

fn shipping_config() -> ShippingConfig {
    ShippingConfig {
        base_rate: Decimal::new(500, 2),
        ..ShippingConfig::default()
    }
}

fn harness() -> Harness {
    init_tracing();
    let api = Rc::new(MockApi::default());
    let remember: SharedStore = MemoryStore::shared();
    let ephemeral: SharedStore = MemoryStore::shared();

    let cart = CartLedger::new(remember.clone());
    let sessions = SessionStore::new(remember.clone(), ephemeral.clone(), vault());
    let promo = PromoResolver::new(api.clone(), ephemeral.clone());
    let flow = CheckoutFlow::new(api.clone(), cart, sessions, promo, shipping_config());

    Harness {
        api,
        remember,
        ephemeral,
        flow,
    }
}

fn shirt() -> ProductSummary {
    ProductSummary {
        id: ProductId::new("linen-shirt"),
        title: "Linen Shirt".into(),
        unit_price: Money::from_cents(2400),
        original_price: None,
        artwork: None,
    }
}

fn email() -> Email {
    Email::parse("jamie@example.com").expect("valid email")
}

fn address_form() -> AddressForm {
    AddressForm {
        name: "Jamie Rivera".into(),
        street: "14 Cannery Row".into(),
        street2: None,
        city: "Monterey".into(),
        state: "CA".into(),
        zip: "93940".into(),
    }
}

fn complete_card() -> PaymentEntry {
    PaymentEntry::Manual {
        card: CardFields {
            number: "4242424242424242".into(),
            exp_month: 11,
            exp_year: 2030,
            cvc: "123".into(),
        },
        completion: CardCompletion {
            number: true,
            expiry: true,
            cvc: true,
        },
    }
}

/// Walk a guest to the payment step with one shirt in the cart.
async fn to_payment(h: &mut Harness) {
    h.flow.cart_mut().add_line(&shirt(), 1, Variant::default());
    h.flow.begin().await;
    h.flow
        .submit_contact(email().as_str(), ContactSubmission::Guest)
        .await
        .expect("contact step");
    h.flow
        .submit_address(&address_form())
        .expect("address step");
    assert_eq!(h.flow.state(), CheckoutState::Payment);
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn guest_manual_checkout_happy_path() {
    let mut h = harness();
    *h.api.verified_total.borrow_mut() = Decimal::new(2900, 2);
    to_payment(&mut h).await;

    let order = h
        .flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect("submission succeeds");

    assert_eq!(h.flow.state(), CheckoutState::Complete);
    // The server-verified total is authoritative over the client estimate.
    assert_eq!(order.total, Money::from_cents(2900));
    assert_eq!(order.subtotal, Money::from_cents(2400));
    assert_eq!(order.shipping_cost, Money::from_cents(500));

    // The charge request carried the full cart, not a total.
    let charges = h.api.charges.borrow();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].items.len(), 1);
    assert_eq!(charges[0].items[0].quantity, 1);
    assert_eq!(charges[0].customer_email, "jamie@example.com");

    // Bookkeeping: order record, confirmation email, conversion event.
    assert_eq!(h.api.orders_created.borrow().len(), 1);
    assert_eq!(h.api.confirmations.borrow().len(), 1);
    let effects = h.flow.take_effects();
    assert!(matches!(
        effects.as_slice(),
        [CheckoutEffect::TrackConversion { total, .. }] if *total == Money::from_cents(2900)
    ));

    // Cart cleared, but no empty-cart redirect off the confirmation page.
    assert!(h.flow.cart().is_empty());
    assert!(!h.flow.should_redirect_empty_cart());

    // Guest contact/shipping stashed for the next visit.
    assert!(
        h.remember
            .get(keys::GUEST_PREFILL)
            .expect("storage readable")
            .is_some()
    );
}

#[tokio::test]
async fn order_persistence_failure_still_reaches_confirmation() {
    let mut h = harness();
    *h.api.verified_total.borrow_mut() = Decimal::new(2900, 2);
    h.api.fail_create_order.set(true);
    to_payment(&mut h).await;

    let order = h
        .flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect("charge succeeded, record write is best-effort");

    // The customer still lands on confirmation with a valid order id.
    assert_eq!(h.flow.state(), CheckoutState::Complete);
    assert_eq!(h.flow.completed_order().map(|o| o.id), Some(order.id));
    assert!(h.flow.cart().is_empty());
    assert!(h.api.orders_created.borrow().is_empty());
}

#[tokio::test]
async fn promo_validator_failure_fails_closed_and_checkout_proceeds() {
    let mut h = harness();
    *h.api.verified_total.borrow_mut() = Decimal::new(2900, 2);
    h.api.fail_promo.set(true);
    to_payment(&mut h).await;

    let application = h.flow.apply_promo("SAVE10").await;
    assert!(!application.is_applied());
    assert_eq!(application.resolved_discount, Money::zero());

    let order = h
        .flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect("checkout proceeds without the discount");
    assert_eq!(order.discount, Money::zero());
    assert_eq!(order.promo_code, None);
}

#[tokio::test]
async fn fixed_promo_clamps_and_rides_the_charge_request() {
    let mut h = harness();
    *h.api.verified_total.borrow_mut() = Decimal::new(500, 2);
    h.api
        .accept_promo("SAVE50", PromoKind::Fixed, Decimal::from(50u32));
    to_payment(&mut h).await;

    // $50 code against a $24 cart is worth $24, never a negative total.
    let application = h.flow.apply_promo("save50").await;
    assert_eq!(application.resolved_discount, Money::from_cents(2400));

    let order = h
        .flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect("submission succeeds");
    assert_eq!(order.discount, Money::from_cents(2400));
    assert_eq!(order.promo_code.as_deref(), Some("SAVE50"));

    // The code (not the client's discount math) went to the server.
    let charges = h.api.charges.borrow();
    assert_eq!(charges[0].promo_code.as_deref(), Some("SAVE50"));

    // The saved code is spent with the order.
    assert_eq!(
        h.ephemeral.get(keys::PROMO_CODE).expect("storage readable"),
        None
    );
}

#[tokio::test]
async fn availability_check_failure_fails_open_and_contact_advances() {
    let mut h = harness();
    h.flow.cart_mut().add_line(&shirt(), 1, Variant::default());
    h.flow.begin().await;
    h.api.fail_availability.set(true);

    assert!(h.flow.email_available(&email()).await);

    let next = h
        .flow
        .submit_contact(email().as_str(), ContactSubmission::Guest)
        .await
        .expect("contact step advances despite the lookup failure");
    assert_eq!(next, CheckoutState::ShippingAddress);
}

#[tokio::test]
async fn availability_result_is_memoized_per_input() {
    let mut h = harness();
    h.flow.begin().await;

    h.flow.email_available(&email()).await;
    h.flow.email_available(&email()).await;
    assert_eq!(h.api.availability_calls.get(), 1);

    let other = Email::parse("other@example.com").expect("valid email");
    h.flow.email_available(&other).await;
    assert_eq!(h.api.availability_calls.get(), 2);
}

#[tokio::test]
async fn declined_charge_returns_to_payment_with_data_retained() {
    let mut h = harness();
    h.api.decline_charge.set(true);
    to_payment(&mut h).await;

    let err = h
        .flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect_err("charge declined");
    assert!(matches!(err, CheckoutError::Charge(_)));

    // Back to payment, nothing discarded.
    assert_eq!(h.flow.state(), CheckoutState::Payment);
    assert!(!h.flow.cart().is_empty());
    assert_eq!(h.flow.email().map(Email::as_str), Some("jamie@example.com"));

    // Retry succeeds once the decline clears.
    h.api.decline_charge.set(false);
    *h.api.verified_total.borrow_mut() = Decimal::new(2900, 2);
    h.flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect("retry succeeds");
    assert_eq!(h.flow.state(), CheckoutState::Complete);
}

#[tokio::test]
async fn tokenization_failure_returns_to_payment() {
    let mut h = harness();
    h.api.fail_tokenize.set(true);
    to_payment(&mut h).await;

    let err = h
        .flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect_err("tokenization failed");
    assert!(matches!(err, CheckoutError::Tokenization(_)));
    assert_eq!(h.flow.state(), CheckoutState::Payment);
    assert!(h.api.charges.borrow().is_empty());
}

#[tokio::test]
async fn incomplete_card_is_rejected_before_any_network_call() {
    let mut h = harness();
    to_payment(&mut h).await;

    let entry = PaymentEntry::Manual {
        card: CardFields {
            number: "4242424242424242".into(),
            exp_month: 11,
            exp_year: 2030,
            cvc: String::new(),
        },
        completion: CardCompletion {
            number: true,
            expiry: true,
            cvc: false,
        },
    };

    let err = h
        .flow
        .submit_order(entry, SubmitOptions::default())
        .await
        .expect_err("card incomplete");
    assert!(matches!(err, CheckoutError::Validation(_)));
    assert!(h.api.charges.borrow().is_empty());
}

#[tokio::test]
async fn saved_payment_method_skips_completion_checks() {
    let mut h = harness();
    *h.api.verified_total.borrow_mut() = Decimal::new(2900, 2);
    to_payment(&mut h).await;

    let order = h
        .flow
        .submit_order(
            PaymentEntry::Saved {
                payment_method_id: "pm_saved".into(),
            },
            SubmitOptions::default(),
        )
        .await
        .expect("saved method submits with no card fields at all");
    assert_eq!(order.payment_refs.charge_id, "ch_mock");

    let charges = h.api.charges.borrow();
    assert_eq!(charges[0].payment_method_id.as_deref(), Some("pm_saved"));
}

#[tokio::test]
async fn express_path_uses_wallet_details_not_form_state() {
    let mut h = harness();
    *h.api.verified_total.borrow_mut() = Decimal::new(2900, 2);
    h.flow.cart_mut().add_line(&shirt(), 1, Variant::default());
    h.flow.begin().await;

    // Straight from the contact step: the forms were never filled in.
    let intent = h.flow.begin_express().await.expect("intent created");
    let wallet_email = Email::parse("wallet@example.com").expect("valid email");
    let confirmation = WalletConfirmation {
        payment_method_id: "pm_wallet".into(),
        payer_email: wallet_email,
        shipping: address_form().validate().expect("valid address"),
        payment_intent_id: Some(intent.id),
    };

    let order = h
        .flow
        .submit_order(
            PaymentEntry::Express { confirmation },
            SubmitOptions::default(),
        )
        .await
        .expect("express submission succeeds");

    assert_eq!(h.flow.state(), CheckoutState::Complete);
    assert_eq!(order.payment_refs.payment_intent_id, "pi_mock");

    let charges = h.api.charges.borrow();
    assert_eq!(charges[0].customer_email, "wallet@example.com");
    assert_eq!(charges[0].payment_method_id.as_deref(), Some("pm_wallet"));
}

#[tokio::test]
async fn inline_registration_gates_on_password_strength() {
    let mut h = harness();
    h.flow.cart_mut().add_line(&shirt(), 1, Variant::default());
    h.flow.begin().await;

    let err = h
        .flow
        .submit_contact(
            email().as_str(),
            ContactSubmission::Register {
                password: "short".into(),
                remember: true,
            },
        )
        .await
        .expect_err("weak password");
    assert!(matches!(err, CheckoutError::Validation(_)));
    assert_eq!(h.flow.state(), CheckoutState::ContactInfo);

    h.flow
        .submit_contact(
            email().as_str(),
            ContactSubmission::Register {
                password: "sturdy-enough-9".into(),
                remember: true,
            },
        )
        .await
        .expect("registration succeeds");
    assert!(h.flow.session().is_some());
    assert_eq!(h.flow.state(), CheckoutState::ShippingAddress);
}

#[tokio::test]
async fn rejected_login_keeps_the_contact_step() {
    let mut h = harness();
    h.flow.cart_mut().add_line(&shirt(), 1, Variant::default());
    h.flow.begin().await;
    h.api.reject_auth.set(true);
    h.api.email_known.set(true);

    assert!(!h.flow.email_available(&email()).await);

    let err = h
        .flow
        .submit_contact(
            email().as_str(),
            ContactSubmission::Login {
                password: "whatever1".into(),
                remember: false,
            },
        )
        .await
        .expect_err("login rejected");
    assert!(matches!(err, CheckoutError::Auth(_)));
    assert_eq!(h.flow.state(), CheckoutState::ContactInfo);
    assert!(h.flow.session().is_none());
}

#[tokio::test]
async fn authenticated_order_lands_in_persisted_session_history() {
    let mut h = harness();
    *h.api.verified_total.borrow_mut() = Decimal::new(2900, 2);
    h.flow.cart_mut().add_line(&shirt(), 1, Variant::default());
    h.flow.begin().await;

    h.flow
        .submit_contact(
            email().as_str(),
            ContactSubmission::Register {
                password: "sturdy-enough-9".into(),
                remember: true,
            },
        )
        .await
        .expect("registration succeeds");
    h.flow.submit_address(&address_form()).expect("address step");

    let order = h
        .flow
        .submit_order(
            complete_card(),
            SubmitOptions {
                save_card: false,
                save_address: true,
            },
        )
        .await
        .expect("submission succeeds");

    // Address went to the account, deduped list of one.
    assert_eq!(h.api.address_updates.borrow().len(), 1);

    // The re-persisted session in the remember tier carries the order.
    let reread = SessionStore::new(h.remember.clone(), h.ephemeral.clone(), vault());
    let (session, _) = reread.load().expect("session persisted");
    assert_eq!(session.order_history.len(), 1);
    assert_eq!(session.order_history[0].id, order.id);

    // No guest prefill for account holders.
    assert_eq!(
        h.remember
            .get(keys::GUEST_PREFILL)
            .expect("storage readable"),
        None
    );
}

#[tokio::test]
async fn fraud_flag_marks_the_order_for_review() {
    let mut h = harness();
    *h.api.verified_total.borrow_mut() = Decimal::new(2900, 2);
    h.api.flag_fraud.set(true);
    to_payment(&mut h).await;

    let order = h
        .flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect("flagged orders still complete");
    assert_eq!(order.status, marigold_core::OrderStatus::FraudReview);
    assert!(order.fraud_flag.is_some());
}

#[tokio::test]
async fn saved_promo_is_revalidated_when_checkout_loads() {
    let mut h = harness();
    h.api
        .accept_promo("FALL15", PromoKind::Percentage, Decimal::from(15u32));
    h.flow.cart_mut().add_line(&shirt(), 1, Variant::default());

    // A previous page saved the code into the ephemeral tier.
    h.ephemeral
        .set(keys::PROMO_CODE, "FALL15")
        .expect("storage writable");

    h.flow.begin().await;
    let applied = h.flow.applied_promo().expect("revalidated and applied");
    // 15% of 24.00
    assert_eq!(applied.resolved_discount, Money::from_cents(360));
}

#[tokio::test]
async fn guest_prefill_survives_into_the_next_visit() {
    let mut h = harness();
    *h.api.verified_total.borrow_mut() = Decimal::new(2900, 2);
    to_payment(&mut h).await;
    h.flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect("submission succeeds");

    // A later visit over the same storage tiers.
    let cart = CartLedger::load(h.remember.clone());
    let sessions = SessionStore::new(h.remember.clone(), h.ephemeral.clone(), vault());
    let promo = PromoResolver::new(h.api.clone(), h.ephemeral.clone());
    let mut next_visit = CheckoutFlow::new(h.api.clone(), cart, sessions, promo, shipping_config());
    next_visit.begin().await;

    assert_eq!(
        next_visit.email().map(Email::as_str),
        Some("jamie@example.com")
    );
    let prefill = next_visit.prefill_address().expect("stashed address");
    assert_eq!(prefill.zip, "93940");
}

#[tokio::test]
async fn logout_destroys_the_session_in_both_tiers() {
    let mut h = harness();
    h.flow.cart_mut().add_line(&shirt(), 1, Variant::default());
    h.flow.begin().await;
    h.flow
        .submit_contact(
            email().as_str(),
            ContactSubmission::Register {
                password: "sturdy-enough-9".into(),
                remember: true,
            },
        )
        .await
        .expect("registration succeeds");

    h.flow.logout();
    assert!(h.flow.session().is_none());

    let reread = SessionStore::new(h.remember.clone(), h.ephemeral.clone(), vault());
    assert!(reread.load().is_none());
}

#[tokio::test]
async fn removing_a_promo_forgets_the_saved_code() {
    let mut h = harness();
    h.api
        .accept_promo("SAVE5", PromoKind::Fixed, Decimal::from(5u32));
    to_payment(&mut h).await;

    h.flow.apply_promo("SAVE5").await;
    assert!(h.flow.applied_promo().is_some());

    h.flow.remove_promo();
    assert!(h.flow.applied_promo().is_none());
    assert_eq!(
        h.ephemeral.get(keys::PROMO_CODE).expect("storage readable"),
        None
    );
}

#[tokio::test]
async fn submission_from_wrong_state_is_rejected() {
    let mut h = harness();
    h.flow.cart_mut().add_line(&shirt(), 1, Variant::default());
    h.flow.begin().await;

    // Manual payment cannot submit from the contact step.
    let err = h
        .flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect_err("not in payment step");
    assert!(matches!(err, CheckoutError::WrongState { .. }));
}

#[tokio::test]
async fn empty_cart_cannot_submit() {
    let mut h = harness();
    h.flow.begin().await;
    h.flow
        .submit_contact(email().as_str(), ContactSubmission::Guest)
        .await
        .expect("contact step");
    h.flow.submit_address(&address_form()).expect("address step");

    let err = h
        .flow
        .submit_order(complete_card(), SubmitOptions::default())
        .await
        .expect_err("nothing to charge");
    assert!(matches!(err, CheckoutError::EmptyCart));
}
