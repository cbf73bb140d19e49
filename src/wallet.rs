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

//! Wallet management.
//!
//! A [`Wallet`] holds one user's spendable balance, the first-deposit bonus
//! flag, and the append-only history of recharge requests. All mutation goes
//! through a single `parking_lot::Mutex`, which serializes the
//! check-then-set on a request's status, the balance read-modify-write, and
//! the first-approval history scan as one atomic unit per user.
//!
//! # Example
//!
//! ```
//! use recharge_engine_rs::{UserId, Wallet};
//! use rust_decimal::Decimal;
//!
//! let wallet = Wallet::new(UserId(1), "Asha", "asha@example.com");
//! assert_eq!(wallet.balance(), Decimal::ZERO);
//! assert!(!wallet.first_bonus_granted());
//! ```

use crate::base::{RequestId, UserId};
use crate::bonus;
use crate::request::{RechargeRequest, RequestStatus};
use crate::RechargeError;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Result of a successful approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Approval {
    /// The claimed amount, credited as points.
    pub points_added: Decimal,
    /// Extra points granted by the bonus policy.
    pub bonus_points: Decimal,
    /// The user's balance after the credit.
    pub new_balance: Decimal,
}

#[derive(Debug)]
struct WalletData {
    user_id: UserId,
    name: String,
    email: String,
    balance: Decimal,
    first_bonus_granted: bool,
    /// Append-only request history in submission order.
    requests: Vec<RechargeRequest>,
}

impl WalletData {
    fn new(user_id: UserId, name: String, email: String) -> Self {
        Self {
            user_id,
            name,
            email,
            balance: Decimal::ZERO,
            first_bonus_granted: false,
            requests: Vec::new(),
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
        debug_assert!(
            self.requests
                .iter()
                .filter(|r| r.status != RequestStatus::Approved)
                .all(|r| r.points_added.is_zero() && r.bonus_points.is_zero()),
            "Invariant violated: non-approved request carries points"
        );
    }

    /// Increases the spendable balance. Recharge credits only ever add.
    fn credit(&mut self, amount: Decimal) -> Result<(), RechargeError> {
        if amount < Decimal::ZERO {
            return Err(RechargeError::InvalidAmount);
        }
        self.balance += amount;
        self.assert_invariants();
        Ok(())
    }

    fn position(&self, request_id: RequestId) -> Result<usize, RechargeError> {
        self.requests
            .iter()
            .position(|r| r.id == request_id)
            .ok_or(RechargeError::RequestNotFound)
    }

    /// True iff no request other than `request_id` has ever been approved.
    ///
    /// Evaluated by scanning the history, not from the durable flag: a first
    /// approval under the lowest bonus tier leaves the flag unset, yet the
    /// next approval must still take the repeat path.
    fn is_first_approval(&self, request_id: RequestId) -> bool {
        !self
            .requests
            .iter()
            .any(|r| r.id != request_id && r.status == RequestStatus::Approved)
    }

    fn approve(&mut self, request_id: RequestId) -> Result<Approval, RechargeError> {
        let index = self.position(request_id)?;
        if self.requests[index].status != RequestStatus::Pending {
            return Err(RechargeError::AlreadyProcessed);
        }

        let first = self.is_first_approval(request_id);
        let amount = self.requests[index].amount;
        let bonus_points = bonus::bonus_points(amount, first);

        // Single atomic unit: status flip, points, ledger credit, flag.
        let request = &mut self.requests[index];
        request.status = RequestStatus::Approved;
        request.points_added = amount;
        request.bonus_points = bonus_points;
        self.credit(amount + bonus_points)?;

        // The durable marker flips only when the first-time path actually
        // granted something.
        if first && bonus_points > Decimal::ZERO {
            self.first_bonus_granted = true;
        }

        self.assert_invariants();
        Ok(Approval {
            points_added: amount,
            bonus_points,
            new_balance: self.balance,
        })
    }

    fn reject(&mut self, request_id: RequestId) -> Result<(), RechargeError> {
        let index = self.position(request_id)?;
        if self.requests[index].status != RequestStatus::Pending {
            return Err(RechargeError::AlreadyProcessed);
        }

        self.requests[index].status = RequestStatus::Rejected;
        self.assert_invariants();
        Ok(())
    }
}

/// A user's wallet: balance ledger plus recharge request store.
#[derive(Debug)]
pub struct Wallet {
    inner: Mutex<WalletData>,
}

impl Wallet {
    const DECIMAL_PRECISION: u32 = 2;

    pub fn new(user_id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(WalletData::new(user_id, name.into(), email.into())),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.inner.lock().user_id
    }

    pub fn name(&self) -> String {
        self.inner.lock().name.clone()
    }

    pub fn email(&self) -> String {
        self.inner.lock().email.clone()
    }

    pub fn balance(&self) -> Decimal {
        self.inner.lock().balance
    }

    /// True once an approval has granted the one-time first-deposit bonus.
    pub fn first_bonus_granted(&self) -> bool {
        self.inner.lock().first_bonus_granted
    }

    /// Appends a new pending request.
    ///
    /// Submission only records intent; the balance is untouched until an
    /// administrator approves the request.
    ///
    /// # Errors
    ///
    /// - [`RechargeError::InvalidAmount`] - amount is zero or negative.
    /// - [`RechargeError::EmptyReference`] - UTR is empty or blank.
    pub fn submit(
        &self,
        id: RequestId,
        amount: Decimal,
        utr_id: &str,
    ) -> Result<RechargeRequest, RechargeError> {
        if amount <= Decimal::ZERO {
            return Err(RechargeError::InvalidAmount);
        }
        if utr_id.trim().is_empty() {
            return Err(RechargeError::EmptyReference);
        }

        let request = RechargeRequest::new(id, amount, utr_id.trim().to_string());
        let mut data = self.inner.lock();
        data.requests.push(request.clone());
        data.assert_invariants();
        Ok(request)
    }

    /// Approves a pending request: flips its status, computes the bonus,
    /// and credits `amount + bonus` to the balance, all under one lock.
    ///
    /// # Errors
    ///
    /// - [`RechargeError::RequestNotFound`] - no such request in this wallet.
    /// - [`RechargeError::AlreadyProcessed`] - request is not pending.
    pub fn approve(&self, request_id: RequestId) -> Result<Approval, RechargeError> {
        self.inner.lock().approve(request_id)
    }

    /// Rejects a pending request. The balance is never touched.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Wallet::approve`].
    pub fn reject(&self, request_id: RequestId) -> Result<(), RechargeError> {
        self.inner.lock().reject(request_id)
    }

    /// Returns a snapshot of the request with the given ID.
    pub fn find(&self, request_id: RequestId) -> Option<RechargeRequest> {
        self.inner
            .lock()
            .requests
            .iter()
            .find(|r| r.id == request_id)
            .cloned()
    }

    /// Returns the full request history in submission order.
    pub fn history(&self) -> Vec<RechargeRequest> {
        self.inner.lock().requests.clone()
    }

    /// Returns snapshots of all requests with the given status.
    pub fn by_status(&self, status: RequestStatus) -> Vec<RechargeRequest> {
        self.inner
            .lock()
            .requests
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }
}

impl Serialize for Wallet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self.inner.lock();
        let mut state = serializer.serialize_struct("Wallet", 5)?;
        state.serialize_field("user", &data.user_id)?;
        state.serialize_field("name", &data.name)?;
        state.serialize_field("balance", &data.balance.round_dp(Wallet::DECIMAL_PRECISION))?;
        state.serialize_field("first_bonus_granted", &data.first_bonus_granted)?;
        state.serialize_field("requests", &data.requests.len())?;
        state.end()
    }
}
