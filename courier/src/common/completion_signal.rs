/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Notify;
use tracing::{error, trace};

/// Returned by [`CompletionSignal::increment`] once the counter has drained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("completion signal has already drained")]
pub struct SignalSettled;

/// Counts in-flight units of work and wakes waiters when the count drains.
///
/// Reaching zero is terminal: later increments are refused, so exactly one
/// decrement observes the 1 -> 0 transition and wakes every current waiter.
/// Waiters register with the [`Notify`] before reading the counter, so a
/// wake-up between the check and the await cannot be lost.
#[derive(Debug)]
pub struct CompletionSignal {
    in_flight: AtomicUsize,
    drained: Notify,
}

impl CompletionSignal {
    /// Creates a signal holding `initial` units. A signal created with zero
    /// units is already drained.
    pub fn new(initial: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(initial),
            drained: Notify::new(),
        }
    }

    /// Adds one unit and returns the new count.
    pub fn increment(&self) -> Result<usize, SignalSettled> {
        self.in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                (count != 0).then_some(count + 1)
            })
            .map(|previous| previous + 1)
            .map_err(|_| SignalSettled)
    }

    /// Releases one unit and returns the new count.
    ///
    /// Releasing from an already drained signal is refused and logged.
    pub fn decrement(&self) -> usize {
        match self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            }) {
            Ok(1) => {
                trace!("completion signal drained");
                self.drained.notify_waiters();
                0
            }
            Ok(previous) => previous - 1,
            Err(_) => {
                error!("completion signal released more units than it held");
                0
            }
        }
    }

    /// Units currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Whether the counter has drained.
    pub fn is_settled(&self) -> bool {
        self.in_flight() == 0
    }

    /// Waits until the counter drains.
    pub async fn wait(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_settled() {
                return;
            }
            notified.await;
        }
    }

    /// Waits until the counter drains or `timeout` elapses. Returns whether it
    /// drained. Timing out leaves the counter untouched.
    pub async fn await_zero(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }
}
