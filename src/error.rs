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

//! Error types for recharge processing.

use thiserror::Error;

/// Recharge processing errors.
///
/// All variants are local, synchronous failures surfaced to the caller;
/// none are retried by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RechargeError {
    /// Claimed amount is zero or negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Bank transaction reference (UTR) is missing or blank
    #[error("missing bank transaction reference")]
    EmptyReference,

    /// Referenced user does not exist
    #[error("user not found")]
    UserNotFound,

    /// User ID is already registered
    #[error("user already registered")]
    DuplicateUser,

    /// Referenced recharge request does not exist for that user
    #[error("recharge request not found")]
    RequestNotFound,

    /// Request already left the pending state
    #[error("request already processed")]
    AlreadyProcessed,
}
