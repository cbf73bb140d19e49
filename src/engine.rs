// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Recharge processing engine.
//!
//! The [`Engine`] is the central component that manages user wallets and
//! drives recharge requests through their lifecycle: a user submits a claim,
//! an administrator approves or rejects it, and approval atomically computes
//! the bonus, credits the balance, and flips the request's terminal state.
//!
//! # Thread Safety
//!
//! Wallets live in a [`DashMap`], so operations on different users proceed
//! in parallel. Each wallet serializes its own mutations behind a mutex,
//! which is what makes racing approvals on one request resolve to exactly
//! one winner and one credit.

use crate::base::{RequestId, UserId};
use crate::notify::{LogNotifier, Notification, Notifier};
use crate::request::{PendingRecharge, RechargeRequest, RequestStatus};
use crate::wallet::{Approval, Wallet};
use crate::RechargeError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Recharge engine managing user wallets and their request stores.
///
/// # Invariants
///
/// - A request's status transitions at most once, to `approved` or
///   `rejected`, and is terminal thereafter.
/// - `points_added + bonus_points` is credited to the owner's balance
///   exactly once, atomically with the transition to `approved`.
/// - The first-deposit bonus flag flips at most once per user and never
///   resets.
/// - Request history is append-only; records are never deleted.
pub struct Engine {
    /// User wallets indexed by user ID.
    wallets: DashMap<UserId, Wallet>,
    /// Allocator for system-wide unique request IDs.
    next_request_id: AtomicU64,
    /// Outbound sink; failures are logged and swallowed.
    notifier: Arc<dyn Notifier>,
}

impl Engine {
    /// Creates a new engine with no users, delivering notifications to the
    /// log.
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(LogNotifier))
    }

    /// Creates a new engine with an injected notification sink.
    pub fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        Engine {
            wallets: DashMap::new(),
            next_request_id: AtomicU64::new(1),
            notifier,
        }
    }

    /// Registers a user with an empty wallet.
    ///
    /// # Errors
    ///
    /// [`RechargeError::DuplicateUser`] if the ID is already registered.
    pub fn register_user(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<(), RechargeError> {
        // Entry API for an atomic check-and-insert.
        match self.wallets.entry(user_id) {
            Entry::Occupied(_) => Err(RechargeError::DuplicateUser),
            Entry::Vacant(entry) => {
                entry.insert(Wallet::new(user_id, name, email));
                info!(user = %user_id, "user registered");
                Ok(())
            }
        }
    }

    /// Records a recharge claim as a new pending request.
    ///
    /// Submission only records intent: no balance mutation occurs until an
    /// administrator approves the request.
    ///
    /// # Errors
    ///
    /// - [`RechargeError::UserNotFound`] - unknown user.
    /// - [`RechargeError::InvalidAmount`] - amount is zero or negative.
    /// - [`RechargeError::EmptyReference`] - UTR is empty or blank.
    pub fn submit_request(
        &self,
        user_id: UserId,
        amount: Decimal,
        utr_id: &str,
    ) -> Result<RechargeRequest, RechargeError> {
        let wallet = self
            .wallets
            .get(&user_id)
            .ok_or(RechargeError::UserNotFound)?;

        let id = RequestId(self.next_request_id.fetch_add(1, Ordering::Relaxed));
        let request = wallet.submit(id, amount, utr_id)?;
        info!(user = %user_id, request = %id, amount = %amount, "recharge submitted");
        Ok(request)
    }

    /// Returns every pending request across all users, annotated with the
    /// owner's display fields and first-time-bonus eligibility.
    ///
    /// Sorted by creation time, then request ID.
    pub fn list_pending(&self) -> Vec<PendingRecharge> {
        let mut pending: Vec<PendingRecharge> = self
            .wallets
            .iter()
            .flat_map(|entry| {
                let wallet = entry.value();
                let user_id = *entry.key();
                let name = wallet.name();
                let email = wallet.email();
                let eligible = !wallet.first_bonus_granted();
                wallet
                    .by_status(RequestStatus::Pending)
                    .into_iter()
                    .map(move |request| PendingRecharge {
                        user_id,
                        name: name.clone(),
                        email: email.clone(),
                        first_time_eligible: eligible,
                        request,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        pending.sort_by_key(|p| (p.request.created_at, p.request.id));
        pending
    }

    /// Approves a pending request and credits the owner's balance.
    ///
    /// The status check, bonus computation, ledger credit, and flag update
    /// are applied as one atomic unit under the wallet's lock. The approval
    /// notification is emitted after the lock is released; once the mutation
    /// commits it stands regardless of delivery.
    ///
    /// # Errors
    ///
    /// - [`RechargeError::UserNotFound`] - unknown user.
    /// - [`RechargeError::RequestNotFound`] - no such request for that user.
    /// - [`RechargeError::AlreadyProcessed`] - request is not pending.
    pub fn approve(&self, user_id: UserId, request_id: RequestId) -> Result<Approval, RechargeError> {
        let approval = {
            let wallet = self
                .wallets
                .get(&user_id)
                .ok_or(RechargeError::UserNotFound)?;
            wallet.approve(request_id)?
        };

        info!(
            user = %user_id,
            request = %request_id,
            points = %approval.points_added,
            bonus = %approval.bonus_points,
            "recharge approved"
        );
        self.emit(Notification {
            user_id,
            request_id,
            title: "Recharge approved".to_string(),
            message: format!(
                "{} points credited ({} bonus) to your wallet",
                approval.points_added + approval.bonus_points,
                approval.bonus_points
            ),
            amount: approval.points_added,
            bonus_points: approval.bonus_points,
        });
        Ok(approval)
    }

    /// Rejects a pending request. The owner's balance is never touched and
    /// the request can never later be approved.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Engine::approve`].
    pub fn reject(&self, user_id: UserId, request_id: RequestId) -> Result<(), RechargeError> {
        let amount = {
            let wallet = self
                .wallets
                .get(&user_id)
                .ok_or(RechargeError::UserNotFound)?;
            wallet.reject(request_id)?;
            wallet
                .find(request_id)
                .map(|r| r.amount)
                .unwrap_or_default()
        };

        info!(user = %user_id, request = %request_id, "recharge rejected");
        self.emit(Notification {
            user_id,
            request_id,
            title: "Recharge rejected".to_string(),
            message: format!("your recharge claim of {amount} was rejected"),
            amount,
            bonus_points: Decimal::ZERO,
        });
        Ok(())
    }

    /// Returns one user's full request history in submission order.
    ///
    /// # Errors
    ///
    /// [`RechargeError::UserNotFound`] if the user does not exist.
    pub fn history(&self, user_id: UserId) -> Result<Vec<RechargeRequest>, RechargeError> {
        self.wallets
            .get(&user_id)
            .map(|wallet| wallet.history())
            .ok_or(RechargeError::UserNotFound)
    }

    /// Retrieves a user's wallet by ID.
    pub fn get_wallet(
        &self,
        user_id: &UserId,
    ) -> Option<dashmap::mapref::one::Ref<'_, UserId, Wallet>> {
        self.wallets.get(user_id)
    }

    /// Returns an iterator over all wallets.
    ///
    /// Useful for generating output reports of wallet states.
    pub fn wallets(
        &self,
    ) -> impl Iterator<Item = dashmap::mapref::multiple::RefMulti<'_, UserId, Wallet>> {
        self.wallets.iter()
    }

    /// Fire-and-forget delivery; a sink failure never rolls back a
    /// committed mutation.
    fn emit(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(notification) {
            warn!(error = %e, "dropping undeliverable recharge notification");
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
