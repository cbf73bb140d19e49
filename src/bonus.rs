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

//! Bonus policy.
//!
//! A pure function from `(amount, is_first_approved_recharge)` to bonus
//! points, independent of any storage:
//!
//! - First approved recharge: tiered by claimed amount.
//!
//!   | Amount      | Bonus |
//!   |-------------|-------|
//!   | < 500       | 0     |
//!   | 500–999     | 50    |
//!   | 1000–1999   | 100   |
//!   | 2000–2999   | 150   |
//!   | 3000–3999   | 200   |
//!   | ≥ 4000      | 250   |
//!
//! - Every later recharge: `floor(amount × 0.045)`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Rate applied to every recharge after the first approved one.
const REPEAT_BONUS_RATE: Decimal = dec!(0.045);

/// First-deposit bonus tiers as `(minimum amount, bonus)` pairs, highest
/// tier first.
const FIRST_DEPOSIT_TIERS: [(Decimal, Decimal); 5] = [
    (dec!(4000), dec!(250)),
    (dec!(3000), dec!(200)),
    (dec!(2000), dec!(150)),
    (dec!(1000), dec!(100)),
    (dec!(500), dec!(50)),
];

/// Computes the bonus points granted when a recharge of `amount` is
/// approved.
///
/// `first_approved_recharge` must reflect whether the user has any other
/// approved request at the time of this approval. The caller is responsible
/// for evaluating that under the same critical section that applies the
/// approval.
pub fn bonus_points(amount: Decimal, first_approved_recharge: bool) -> Decimal {
    if first_approved_recharge {
        first_deposit_bonus(amount)
    } else {
        (amount * REPEAT_BONUS_RATE).floor()
    }
}

fn first_deposit_bonus(amount: Decimal) -> Decimal {
    FIRST_DEPOSIT_TIERS
        .iter()
        .find(|(min, _)| amount >= *min)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(Decimal::ZERO)
}
