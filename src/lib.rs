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

//! # Recharge Engine
//!
//! This library implements a wallet recharge engine: users submit manual
//! top-up claims (amount plus a bank transaction reference), an
//! administrator approves or rejects each claim, and approval atomically
//! computes a one-time first-deposit bonus, credits the user's spendable
//! balance, and prevents double credit.
//!
//! ## Core Components
//!
//! - [`Engine`]: Central processor managing user wallets and the request
//!   lifecycle
//! - [`Wallet`]: Per-user balance ledger plus append-only request history
//! - [`bonus`]: Pure bonus policy (tiered first-deposit table, 4.5% after)
//! - [`Notifier`]: Injected sink for approval/rejection notifications
//! - [`RechargeError`]: Failure kinds for validation, lookup, and conflicts
//!
//! ## Example
//!
//! ```
//! use recharge_engine_rs::{Engine, UserId};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! engine.register_user(UserId(1), "Asha", "asha@example.com").unwrap();
//!
//! // User claims a 1000-point bank deposit
//! let request = engine.submit_request(UserId(1), dec!(1000), "UTR123").unwrap();
//!
//! // Admin verifies the bank statement and approves
//! let approval = engine.approve(UserId(1), request.id).unwrap();
//! assert_eq!(approval.bonus_points, dec!(100)); // first-deposit tier
//! assert_eq!(approval.new_balance, dec!(1100));
//! ```
//!
//! ## Thread Safety
//!
//! Wallets are held in a concurrent map and each wallet serializes its own
//! mutations, so racing approvals on the same request resolve to exactly one
//! winner while different users proceed in parallel.

pub mod base;
pub mod bonus;
mod engine;
pub mod error;
pub mod notify;
mod request;
pub mod wallet;

pub use base::{RequestId, UserId};
pub use engine::Engine;
pub use error::RechargeError;
pub use notify::{LogNotifier, Notification, Notifier, NotifyError, QueueNotifier};
pub use request::{PendingRecharge, RechargeRequest, RequestStatus};
pub use wallet::{Approval, Wallet};
