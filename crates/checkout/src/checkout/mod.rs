//! The checkout orchestrator.
//!
//! Composes the cart ledger, session store, shipping calculator and promo
//! resolver into the multi-step checkout state machine.

mod flow;
mod state;

pub use flow::{
    CardCompletion, CheckoutEffect, CheckoutFlow, CheckoutTotals, ContactSubmission, PaymentEntry,
    SubmitOptions, WalletConfirmation,
};
pub use state::CheckoutState;
