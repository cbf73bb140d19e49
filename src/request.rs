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

//! Recharge request records.
//!
//! Requests follow a state machine:
//! - [`Pending`] → [`Approved`] (via approve)
//! - [`Pending`] → [`Rejected`] (via reject)
//!
//! Both outcomes are terminal. Records are append-only and never deleted.
//!
//! [`Pending`]: RequestStatus::Pending
//! [`Approved`]: RequestStatus::Approved
//! [`Rejected`]: RequestStatus::Rejected

use crate::base::{RequestId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a recharge request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// A user-submitted claim of an out-of-band bank deposit.
///
/// `amount`, `utr_id`, and `created_at` are immutable after creation.
/// `points_added` and `bonus_points` stay zero until approval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RechargeRequest {
    pub id: RequestId,
    pub amount: Decimal,
    /// Opaque bank transaction reference supplied by the user. Verified
    /// manually by an administrator, never against a payment network.
    pub utr_id: String,
    pub status: RequestStatus,
    pub points_added: Decimal,
    pub bonus_points: Decimal,
    pub created_at: DateTime<Utc>,
}

impl RechargeRequest {
    pub(crate) fn new(id: RequestId, amount: Decimal, utr_id: String) -> Self {
        Self {
            id,
            amount,
            utr_id,
            status: RequestStatus::Pending,
            points_added: Decimal::ZERO,
            bonus_points: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// A pending request annotated with its owner, as returned by
/// [`Engine::list_pending`](crate::Engine::list_pending).
///
/// Carries the owner's display fields and first-time-bonus eligibility so an
/// administrator can decide without a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRecharge {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    /// True while the user has never been granted the first-deposit bonus.
    pub first_time_eligible: bool,
    pub request: RechargeRequest,
}
