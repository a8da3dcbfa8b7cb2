//! Session model and two-tier encrypted persistence.
//!
//! A logged-in session lives in exactly one of two storage tiers: the
//! remember tier (survives restarts, "keep me signed in") or the ephemeral
//! tier (tab-scoped). Every write enforces tier exclusivity - writing to one
//! tier clears the other - so a stale duplicate session can never survive in
//! the tier that lost.

use serde::{Deserialize, Serialize};

use marigold_core::{Email, UserId};

use crate::address::Address;
use crate::order::Order;
use crate::storage::{SharedStore, keys};
use crate::vault::SessionVault;

/// Customer profile fields carried in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// The authenticated session blob.
///
/// Created on successful login/registration, mutated on address and order
/// updates, destroyed on logout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub profile: Profile,
    /// Bearer token for authenticated endpoints.
    pub auth_token: String,
    pub addresses: Vec<Address>,
    pub order_history: Vec<Order>,
}

/// Guest checkout fields stashed to prefill a future visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestPrefill {
    pub email: Email,
    pub address: Option<Address>,
}

/// Which storage tier holds the live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    /// Survives restarts ("keep me signed in").
    Remember,
    /// Tab-scoped.
    Ephemeral,
}

/// Encrypted session persistence over the two storage tiers.
///
/// All failures here are persistence failures: logged, absorbed, never
/// surfaced. The in-memory session a caller holds stays authoritative.
pub struct SessionStore {
    remember: SharedStore,
    ephemeral: SharedStore,
    vault: SessionVault,
}

impl SessionStore {
    /// Create a store over the two tiers.
    #[must_use]
    pub fn new(remember: SharedStore, ephemeral: SharedStore, vault: SessionVault) -> Self {
        Self {
            remember,
            ephemeral,
            vault,
        }
    }

    fn tier(&self, tier: StorageTier) -> &SharedStore {
        match tier {
            StorageTier::Remember => &self.remember,
            StorageTier::Ephemeral => &self.ephemeral,
        }
    }

    const fn other(tier: StorageTier) -> StorageTier {
        match tier {
            StorageTier::Remember => StorageTier::Ephemeral,
            StorageTier::Ephemeral => StorageTier::Remember,
        }
    }

    /// Persist the session to one tier, clearing the other.
    ///
    /// The clear of the losing tier is part of the write, not an
    /// optimization: both tiers are checked on load, and a session left
    /// behind in the other tier would resurrect stale auth state.
    pub fn write(&self, session: &Session, tier: StorageTier) {
        let sealed = match self.vault.seal(session) {
            Ok(sealed) => sealed,
            Err(e) => {
                tracing::warn!("failed to seal session: {e}");
                return;
            }
        };

        if let Err(e) = self.tier(tier).set(keys::SESSION, &sealed) {
            tracing::warn!("failed to persist session: {e}");
        }
        if let Err(e) = self.tier(Self::other(tier)).remove(keys::SESSION) {
            tracing::warn!("failed to clear stale session tier: {e}");
        }
    }

    /// Load the live session, remember tier first.
    ///
    /// Corrupt or undecryptable blobs read as absent.
    #[must_use]
    pub fn load(&self) -> Option<(Session, StorageTier)> {
        for tier in [StorageTier::Remember, StorageTier::Ephemeral] {
            let stored = match self.tier(tier).get(keys::SESSION) {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::warn!("failed to read session storage: {e}");
                    None
                }
            };
            if let Some(sealed) = stored
                && let Some(session) = self.vault.open::<Session>(&sealed)
            {
                return Some((session, tier));
            }
        }
        None
    }

    /// Destroy the session in both tiers (logout).
    pub fn clear(&self) {
        for tier in [StorageTier::Remember, StorageTier::Ephemeral] {
            if let Err(e) = self.tier(tier).remove(keys::SESSION) {
                tracing::warn!("failed to clear session: {e}");
            }
        }
    }

    /// Stash guest checkout fields for a future visit.
    pub fn write_guest_prefill(&self, prefill: &GuestPrefill) {
        match self.vault.seal(prefill) {
            Ok(sealed) => {
                if let Err(e) = self.remember.set(keys::GUEST_PREFILL, &sealed) {
                    tracing::warn!("failed to stash guest prefill: {e}");
                }
            }
            Err(e) => tracing::warn!("failed to seal guest prefill: {e}"),
        }
    }

    /// Load stashed guest checkout fields.
    #[must_use]
    pub fn load_guest_prefill(&self) -> Option<GuestPrefill> {
        let sealed = self.remember.get(keys::GUEST_PREFILL).ok()??;
        self.vault.open(&sealed)
    }
}
