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

//! Outbound notifications.
//!
//! The engine emits one notification per approval or rejection,
//! fire-and-forget: a sink failure is logged and swallowed, never rolling
//! back a committed balance mutation. The sink is an injected capability so
//! callers can wire in any transport.

use crate::base::{RequestId, UserId};
use crossbeam::queue::SegQueue;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Delivery failure reported by a [`Notifier`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// A message addressed to a user about one of their recharge requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub user_id: UserId,
    pub request_id: RequestId,
    pub title: String,
    pub message: String,
    pub amount: Decimal,
    pub bonus_points: Decimal,
}

/// Sink for outbound notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Default sink: logs each delivery and drops it.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            user = %notification.user_id,
            request = %notification.request_id,
            amount = %notification.amount,
            bonus = %notification.bonus_points,
            "{}",
            notification.title
        );
        Ok(())
    }
}

/// In-process sink backed by a lock-free queue.
///
/// Deliveries are appended in emission order and can be drained by whoever
/// owns the other end (tests, the demo server's notification feed).
#[derive(Debug, Default)]
pub struct QueueNotifier {
    queue: SegQueue<Notification>,
}

impl QueueNotifier {
    pub fn new() -> Self {
        Self {
            queue: SegQueue::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Removes and returns all queued notifications in emission order.
    pub fn drain(&self) -> Vec<Notification> {
        let mut drained = Vec::with_capacity(self.queue.len());
        while let Some(notification) = self.queue.pop() {
            drained.push(notification);
        }
        drained
    }
}

impl Notifier for QueueNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.queue.push(notification);
        Ok(())
    }
}
