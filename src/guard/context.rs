//! Swap Context
//!
//! Binds the active account to the generation guard. Switching account
//! changes the id and advances the generation in one step, and `capture()`
//! hands in-flight work both values together so a request is never issued
//! for one account and fenced against another.
//!
//! Created: 2026-10-19

use super::generation::{ContextListener, GenerationGuard, GenerationToken};
use crate::types::AccountId;
use parking_lot::RwLock;
use std::sync::Weak;
use tracing::info;

pub struct SwapContext {
    guard: GenerationGuard,
    account: RwLock<AccountId>,
}

impl SwapContext {
    pub fn new(account: impl Into<AccountId>) -> Self {
        Self {
            guard: GenerationGuard::new(),
            account: RwLock::new(account.into()),
        }
    }

    pub fn guard(&self) -> &GenerationGuard {
        &self.guard
    }

    pub fn account(&self) -> AccountId {
        self.account.read().clone()
    }

    /// Account and generation as seen by an operation being dispatched now
    pub fn capture(&self) -> (AccountId, GenerationToken) {
        // Held across token() so a concurrent switch cannot interleave
        let account = self.account.read();
        (account.clone(), self.guard.token())
    }

    /// Make `account` active and invalidate everything issued for the previous one
    pub fn switch_account(&self, account: impl Into<AccountId>) -> u64 {
        let account = account.into();
        {
            let mut current = self.account.write();
            info!("Active account switched: {} -> {}", *current, account);
            *current = account;
        }
        self.guard.advance()
    }

    /// Leaving the swap screen: same account, new generation
    pub fn leave(&self) -> u64 {
        self.guard.advance()
    }

    pub fn register(&self, listener: Weak<dyn ContextListener>) {
        self.guard.register(listener);
    }
}
