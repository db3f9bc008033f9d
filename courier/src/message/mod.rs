//! Envelopes, handler contexts, tracking reports and the error taxonomy.
//!
//! *   [`Envelope`]: a message plus its delivery metadata (id, parent, session,
//!     intent, destination, creation time).
//! *   [`MessageContext`] / [`SessionContext`]: the explicit context handed to
//!     handlers and tracked actions, through which cascades are emitted.
//! *   [`Report`]: what a tracked session observed.
//! *   [`BusError`], [`HandlerExecutionError`], [`TrackingError`].

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

pub use envelope::{Envelope, EnvelopeId, Intent, SessionId};
pub use message_context::{MessageContext, SessionContext};
pub use message_error::{BusError, HandlerExecutionError, TrackingError};
pub use report::{EnvelopeRecord, ExecutionRecord, Report};

/// Defines [`Envelope`] and its identifiers.
mod envelope;
/// Defines [`MessageContext`] and [`SessionContext`].
mod message_context;
/// Defines the bus and tracking errors.
mod message_error;
/// Defines [`Report`] and its records.
mod report;
