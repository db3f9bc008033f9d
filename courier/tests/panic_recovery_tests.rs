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
//! Tests for panic capture in message handlers.
//!
//! These tests use `#[tokio::test]` instead of `#[courier_test]` because the
//! `courier_test` macro's panic detection would fail the test when a handler
//! panics on purpose.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use courier::prelude::*;

/// Message whose handler panics with the carried text
#[courier_message]
struct PanicWithMessage {
    message: String,
}

/// Normal message that increments a counter
#[courier_message]
struct IncrementCounter;

struct Volatile;

#[async_trait]
impl Handler<PanicWithMessage> for Volatile {
    async fn handle(&self, context: MessageContext<PanicWithMessage>) -> HandlerResult {
        panic!("{}", context.message().message);
    }

    fn name(&self) -> &'static str {
        "volatile"
    }
}

struct Counter {
    count: Arc<AtomicU32>,
}

#[async_trait]
impl Handler<IncrementCounter> for Counter {
    async fn handle(&self, _context: MessageContext<IncrementCounter>) -> HandlerResult {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn build_bus(count: &Arc<AtomicU32>) -> MessageBus {
    CourierApp::builder()
        .handle::<PanicWithMessage, _>(Volatile)
        .handle::<IncrementCounter, _>(Counter {
            count: Arc::clone(count),
        })
        .with_config(CourierConfig::default())
        .build()
}

/// A panicking handler becomes a failure record and the session still settles.
#[tokio::test]
async fn test_handler_panic_is_recorded_as_failure() -> anyhow::Result<()> {
    let count = Arc::new(AtomicU32::new(0));
    let bus = build_bus(&count);

    let report = bus
        .track(
            |context| async move {
                context.send(PanicWithMessage {
                    message: "index corrupted".to_string(),
                })?;
                context.send(IncrementCounter)?;
                Ok(())
            },
            Duration::from_secs(2),
        )
        .await?;

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(report.executions().len(), 2);
    let failure = report.failure().expect("panic should be recorded");
    assert_eq!(failure.handler(), "volatile");
    assert!(failure.description().contains("index corrupted"));
    assert_eq!(bus.tracker().active_sessions(), 0);
    Ok(())
}

/// The bus keeps dispatching after a handler panicked.
#[tokio::test]
async fn test_bus_continues_after_handler_panic() -> anyhow::Result<()> {
    let count = Arc::new(AtomicU32::new(0));
    let bus = build_bus(&count);

    for round in 0..3 {
        bus.track_activity()
            .send_message_and_wait(PanicWithMessage {
                message: format!("round {round}"),
            })
            .await?;
        bus.track_activity()
            .send_message_and_wait(IncrementCounter)
            .await?;
    }

    assert_eq!(count.load(Ordering::SeqCst), 3);
    Ok(())
}

/// A panic counts as a handler failure when failures are raised.
#[tokio::test]
async fn test_handler_panic_raises_when_requested() -> anyhow::Result<()> {
    let count = Arc::new(AtomicU32::new(0));
    let bus = build_bus(&count);

    let error = bus
        .track_activity()
        .fail_on_handler_errors(true)
        .send_message_and_wait(PanicWithMessage {
            message: "boom".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(error, TrackingError::HandlerFailed { .. }));
    assert_eq!(error.report().failures().len(), 1);
    Ok(())
}
