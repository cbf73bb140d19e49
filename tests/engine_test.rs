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

//! Engine public API integration tests.

use recharge_engine_rs::{
    Engine, Notification, Notifier, NotifyError, QueueNotifier, RechargeError, RequestId,
    RequestStatus, UserId,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn engine_with_user(user: u32) -> Engine {
    let engine = Engine::new();
    engine
        .register_user(UserId(user), "Asha", "asha@example.com")
        .unwrap();
    engine
}

#[test]
fn register_creates_empty_wallet() {
    let engine = engine_with_user(1);

    let wallet = engine.get_wallet(&UserId(1)).unwrap();
    assert_eq!(wallet.balance(), Decimal::ZERO);
    assert!(!wallet.first_bonus_granted());
    assert!(wallet.history().is_empty());
}

#[test]
fn register_duplicate_user_returns_error() {
    let engine = engine_with_user(1);

    let result = engine.register_user(UserId(1), "Imposter", "x@example.com");
    assert_eq!(result, Err(RechargeError::DuplicateUser));

    // The original wallet is untouched
    assert_eq!(engine.get_wallet(&UserId(1)).unwrap().name(), "Asha");
}

#[test]
fn submit_creates_pending_request() {
    let engine = engine_with_user(1);

    let request = engine
        .submit_request(UserId(1), dec!(1000), "UTR123")
        .unwrap();

    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.points_added, Decimal::ZERO);
    assert_eq!(request.bonus_points, Decimal::ZERO);
    assert_eq!(request.amount, dec!(1000));

    // Submission records intent only
    assert_eq!(engine.get_wallet(&UserId(1)).unwrap().balance(), Decimal::ZERO);
}

#[test]
fn submit_for_unknown_user_returns_error() {
    let engine = Engine::new();
    let result = engine.submit_request(UserId(99), dec!(1000), "UTR123");
    assert_eq!(result, Err(RechargeError::UserNotFound));
}

#[test]
fn submit_invalid_amount_returns_error() {
    let engine = engine_with_user(1);

    assert_eq!(
        engine.submit_request(UserId(1), Decimal::ZERO, "UTR123"),
        Err(RechargeError::InvalidAmount)
    );
    assert_eq!(
        engine.submit_request(UserId(1), dec!(-5), "UTR123"),
        Err(RechargeError::InvalidAmount)
    );
    assert_eq!(
        engine.submit_request(UserId(1), dec!(100), "  "),
        Err(RechargeError::EmptyReference)
    );

    assert!(engine.history(UserId(1)).unwrap().is_empty());
}

#[test]
fn request_ids_are_unique_across_users() {
    let engine = engine_with_user(1);
    engine
        .register_user(UserId(2), "Ben", "ben@example.com")
        .unwrap();

    let r1 = engine.submit_request(UserId(1), dec!(100), "A").unwrap();
    let r2 = engine.submit_request(UserId(2), dec!(100), "B").unwrap();
    let r3 = engine.submit_request(UserId(1), dec!(100), "C").unwrap();

    assert_ne!(r1.id, r2.id);
    assert_ne!(r2.id, r3.id);
    assert_ne!(r1.id, r3.id);
}

#[test]
fn first_approval_grants_tiered_bonus() {
    let engine = engine_with_user(1);
    let request = engine.submit_request(UserId(1), dec!(500), "UTR1").unwrap();

    let approval = engine.approve(UserId(1), request.id).unwrap();

    assert_eq!(approval.points_added, dec!(500));
    assert_eq!(approval.bonus_points, dec!(50));
    assert_eq!(approval.new_balance, dec!(550));

    let wallet = engine.get_wallet(&UserId(1)).unwrap();
    assert_eq!(wallet.balance(), dec!(550));
    assert!(wallet.first_bonus_granted());
}

#[test]
fn first_approval_below_tier_grants_nothing() {
    let engine = engine_with_user(1);
    let request = engine.submit_request(UserId(1), dec!(450), "UTR1").unwrap();

    let approval = engine.approve(UserId(1), request.id).unwrap();

    assert_eq!(approval.bonus_points, Decimal::ZERO);
    assert_eq!(approval.new_balance, dec!(450));
    assert!(!engine.get_wallet(&UserId(1)).unwrap().first_bonus_granted());
}

#[test]
fn second_approval_uses_percentage_bonus() {
    let engine = engine_with_user(1);
    let first = engine.submit_request(UserId(1), dec!(500), "UTR1").unwrap();
    let second = engine.submit_request(UserId(1), dec!(1000), "UTR2").unwrap();

    engine.approve(UserId(1), first.id).unwrap();
    let approval = engine.approve(UserId(1), second.id).unwrap();

    // floor(1000 * 0.045) = 45, not the tiered 100
    assert_eq!(approval.bonus_points, dec!(45));
    assert_eq!(approval.new_balance, dec!(550) + dec!(1045));
}

#[test]
fn approve_twice_returns_conflict_and_credits_once() {
    let engine = engine_with_user(1);
    let request = engine.submit_request(UserId(1), dec!(1000), "UTR1").unwrap();

    engine.approve(UserId(1), request.id).unwrap();
    let result = engine.approve(UserId(1), request.id);

    assert_eq!(result, Err(RechargeError::AlreadyProcessed));
    assert_eq!(engine.get_wallet(&UserId(1)).unwrap().balance(), dec!(1100));
}

#[test]
fn reject_then_approve_returns_conflict() {
    let engine = engine_with_user(1);
    let request = engine.submit_request(UserId(1), dec!(1000), "UTR1").unwrap();

    engine.reject(UserId(1), request.id).unwrap();
    let result = engine.approve(UserId(1), request.id);

    assert_eq!(result, Err(RechargeError::AlreadyProcessed));
    assert_eq!(engine.get_wallet(&UserId(1)).unwrap().balance(), Decimal::ZERO);
}

#[test]
fn reject_never_changes_balance() {
    let engine = engine_with_user(1);
    let funded = engine.submit_request(UserId(1), dec!(2000), "UTR1").unwrap();
    engine.approve(UserId(1), funded.id).unwrap();
    let balance_before = engine.get_wallet(&UserId(1)).unwrap().balance();

    let request = engine.submit_request(UserId(1), dec!(9999), "UTR2").unwrap();
    engine.reject(UserId(1), request.id).unwrap();

    assert_eq!(engine.get_wallet(&UserId(1)).unwrap().balance(), balance_before);
    let rejected = engine.get_wallet(&UserId(1)).unwrap().find(request.id).unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.points_added, Decimal::ZERO);
}

#[test]
fn approve_unknown_user_or_request_returns_not_found() {
    let engine = engine_with_user(1);

    assert_eq!(
        engine.approve(UserId(99), RequestId(1)),
        Err(RechargeError::UserNotFound)
    );
    assert_eq!(
        engine.approve(UserId(1), RequestId(999)),
        Err(RechargeError::RequestNotFound)
    );
    assert_eq!(
        engine.reject(UserId(1), RequestId(999)),
        Err(RechargeError::RequestNotFound)
    );
}

#[test]
fn list_pending_annotates_owner_and_eligibility() {
    let engine = engine_with_user(1);
    engine
        .register_user(UserId(2), "Ben", "ben@example.com")
        .unwrap();

    // User 2 already received the first-deposit bonus
    let prior = engine.submit_request(UserId(2), dec!(500), "UTR0").unwrap();
    engine.approve(UserId(2), prior.id).unwrap();

    engine.submit_request(UserId(1), dec!(1000), "UTR1").unwrap();
    engine.submit_request(UserId(2), dec!(1000), "UTR2").unwrap();

    let pending = engine.list_pending();
    assert_eq!(pending.len(), 2);

    let p1 = pending.iter().find(|p| p.user_id == UserId(1)).unwrap();
    let p2 = pending.iter().find(|p| p.user_id == UserId(2)).unwrap();

    assert_eq!(p1.name, "Asha");
    assert_eq!(p1.email, "asha@example.com");
    assert!(p1.first_time_eligible);
    assert!(!p2.first_time_eligible);
}

#[test]
fn list_pending_excludes_processed_requests() {
    let engine = engine_with_user(1);
    let a = engine.submit_request(UserId(1), dec!(100), "A").unwrap();
    let b = engine.submit_request(UserId(1), dec!(200), "B").unwrap();
    let c = engine.submit_request(UserId(1), dec!(300), "C").unwrap();

    engine.approve(UserId(1), a.id).unwrap();
    engine.reject(UserId(1), b.id).unwrap();

    let pending = engine.list_pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].request.id, c.id);
}

#[test]
fn notifications_are_emitted_for_approval_and_rejection() {
    let sink = Arc::new(QueueNotifier::new());
    let engine = Engine::with_notifier(sink.clone());
    engine
        .register_user(UserId(1), "Asha", "asha@example.com")
        .unwrap();

    let a = engine.submit_request(UserId(1), dec!(1000), "UTR1").unwrap();
    let b = engine.submit_request(UserId(1), dec!(200), "UTR2").unwrap();

    engine.approve(UserId(1), a.id).unwrap();
    engine.reject(UserId(1), b.id).unwrap();

    let delivered = sink.drain();
    assert_eq!(delivered.len(), 2);

    assert_eq!(delivered[0].title, "Recharge approved");
    assert_eq!(delivered[0].user_id, UserId(1));
    assert_eq!(delivered[0].request_id, a.id);
    assert_eq!(delivered[0].amount, dec!(1000));
    assert_eq!(delivered[0].bonus_points, dec!(100));

    assert_eq!(delivered[1].title, "Recharge rejected");
    assert_eq!(delivered[1].request_id, b.id);
    assert_eq!(delivered[1].bonus_points, Decimal::ZERO);
}

/// Sink that fails every delivery.
struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError("sink unavailable".to_string()))
    }
}

#[test]
fn failed_notification_never_rolls_back_the_ledger() {
    let engine = Engine::with_notifier(Arc::new(FailingNotifier));
    engine
        .register_user(UserId(1), "Asha", "asha@example.com")
        .unwrap();

    let a = engine.submit_request(UserId(1), dec!(1000), "UTR1").unwrap();
    let b = engine.submit_request(UserId(1), dec!(200), "UTR2").unwrap();

    // Approval commits even though delivery fails
    let approval = engine.approve(UserId(1), a.id).unwrap();
    assert_eq!(approval.new_balance, dec!(1100));

    // So does rejection, and the balance stays put
    engine.reject(UserId(1), b.id).unwrap();

    let wallet = engine.get_wallet(&UserId(1)).unwrap();
    assert_eq!(wallet.balance(), dec!(1100));
    assert_eq!(wallet.find(a.id).unwrap().status, RequestStatus::Approved);
    assert_eq!(wallet.find(b.id).unwrap().status, RequestStatus::Rejected);
}

/// End-to-end scenario:
///
/// 1. User submits `{amount: 1000, utr: "UTR123"}`
/// 2. The claim appears in the pending list
/// 3. Admin approves it
/// 4. Balance increases by 1000 + 100 (first-deposit tier)
/// 5. History shows the approved record with its points
/// 6. The pending list no longer includes it
#[test]
fn end_to_end_recharge_flow() {
    let engine = engine_with_user(1);

    let request = engine
        .submit_request(UserId(1), dec!(1000), "UTR123")
        .unwrap();

    let pending = engine.list_pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].request.id, request.id);
    assert!(pending[0].first_time_eligible);

    let approval = engine.approve(UserId(1), request.id).unwrap();
    assert_eq!(approval.points_added, dec!(1000));
    assert_eq!(approval.bonus_points, dec!(100));
    assert_eq!(approval.new_balance, dec!(1100));

    let wallet = engine.get_wallet(&UserId(1)).unwrap();
    assert_eq!(wallet.balance(), dec!(1100));
    assert!(wallet.first_bonus_granted());
    drop(wallet);

    let history = engine.history(UserId(1)).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, RequestStatus::Approved);
    assert_eq!(history[0].points_added, dec!(1000));
    assert_eq!(history[0].bonus_points, dec!(100));
    assert_eq!(history[0].utr_id, "UTR123");

    assert!(engine.list_pending().is_empty());
}
