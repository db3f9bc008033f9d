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

#![forbid(unsafe_code)]
#![warn(missing_docs)]
//! Courier Library
//!
//! An in-process message bus with two delivery modes and activity tracking:
//!
//! *   **send**: point-to-point delivery to exactly one registered handler.
//! *   **publish**: fan-out delivery to zero or more subscribers.
//! *   **tracking**: run an action and wait until every message it caused,
//!     including messages emitted by handlers of those messages, has been
//!     handled, bounded by a deadline.
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! #[courier_message]
//! struct FileAdded(String);
//!
//! let bus = CourierApp::builder()
//!     .handle_fn::<FileAdded, _, _>("indexer", |_context| async { Ok(()) })
//!     .build();
//!
//! let report = bus
//!     .track_activity()
//!     .send_message_and_wait(FileAdded("a.txt".into()))
//!     .await?;
//! assert_eq!(report.sent().count(), 1);
//! ```

/// The bus, its routing table, sessions and tracking.
pub(crate) mod common;

/// Envelopes, contexts, reports and errors.
pub(crate) mod message;
/// Trait definitions used by the bus.
pub(crate) mod traits;

/// Prelude module for convenient imports.
///
/// Re-exports the bus, its contexts, reports and errors, the message macro
/// and `async_trait`.
pub mod prelude {
    pub use async_trait::async_trait;
    pub use courier_macro::courier_message;

    pub use crate::common::{
        ActivityTracker, BehaviorConfig, BusBuilder, CompletionSignal, CourierApp, CourierConfig,
        Dispatched, HandlerFuture, HandlerResult, MessageBus, Route, Router, Session,
        SessionHandle, SignalSettled, TimeoutConfig, TrackedActivity,
    };
    pub use crate::message::{
        BusError, Envelope, EnvelopeId, EnvelopeRecord, ExecutionRecord, HandlerExecutionError,
        Intent, MessageContext, Report, SessionContext, SessionId, TrackingError,
    };
    pub use crate::traits::{CourierMessage, FnHandler, Handler};
}
