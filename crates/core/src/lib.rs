//! Marigold Core - Shared types library.
//!
//! This crate provides common types used across all Marigold components:
//! - `checkout` - Cart, pricing and checkout orchestration core
//! - collaborator UI crates that render what the core computes
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
