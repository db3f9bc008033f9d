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

use std::sync::Arc;
use std::time::Duration;

use derive_new::new;
use thiserror::Error;

use crate::message::{EnvelopeId, Report, SessionId};

/// Errors returned synchronously by `send` and `publish`.
///
/// When the caller is itself a handler, propagating one of these with `?`
/// makes it that handler's failure record.
#[derive(Debug, Error)]
pub enum BusError {
    /// `send` found no handler registered for the message type.
    #[error("no handler registered for {type_name}")]
    NoHandler {
        /// The unroutable message type.
        type_name: &'static str,
    },
    /// `send` found more than one handler registered for the message type.
    #[error("{count} handlers registered for {type_name}; send requires exactly one")]
    AmbiguousHandler {
        /// The message type with competing handlers.
        type_name: &'static str,
        /// How many handlers are registered.
        count: usize,
    },
    /// The session the call would join has already drained.
    #[error("session {session_id} has already settled; {type_name} cannot join it")]
    SessionSettled {
        /// The settled session.
        session_id: SessionId,
        /// The rejected message type.
        type_name: &'static str,
    },
    /// The emitting envelope finished before this call was made, so the new
    /// envelope cannot be attributed to it.
    #[error("parent envelope {parent_id} already completed; {type_name} cannot cascade from it")]
    DetachedCascade {
        /// The completed parent.
        parent_id: EnvelopeId,
        /// The rejected message type.
        type_name: &'static str,
    },
}

/// A handler failure captured while dispatching one envelope.
///
/// This is data in a [`Report`], not an error raised at the tracking boundary.
#[derive(Clone, Debug, Error, new)]
#[error("handler {handler} failed on {type_name} ({envelope_id}): {description}")]
pub struct HandlerExecutionError {
    envelope_id: EnvelopeId,
    handler: Arc<str>,
    type_name: &'static str,
    description: String,
}

impl HandlerExecutionError {
    /// The envelope whose handler failed.
    pub fn envelope_id(&self) -> EnvelopeId {
        self.envelope_id
    }

    /// Name of the failing handler.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// The message type the handler was processing.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The rendered error (including its cause chain) or panic message.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Errors raised to the caller of a tracked activity.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The session did not drain before the deadline. Handlers still running
    /// were not cancelled.
    #[error("tracked session did not settle within {timeout:?}")]
    Timeout {
        /// The deadline that elapsed.
        timeout: Duration,
        /// Everything observed before the deadline.
        report: Box<Report>,
    },
    /// The tracked action itself returned an error.
    #[error("tracked action failed: {source}")]
    Action {
        /// The action's error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        /// Everything observed up to the failure.
        report: Box<Report>,
    },
    /// The session settled, but a handler failed and the caller asked for
    /// failures to be raised.
    #[error("tracked session settled with a handler failure: {failure}")]
    HandlerFailed {
        /// The first failure observed.
        failure: HandlerExecutionError,
        /// The complete report.
        report: Box<Report>,
    },
}

impl TrackingError {
    /// The (possibly partial) report carried by every variant.
    pub fn report(&self) -> &Report {
        match self {
            TrackingError::Timeout { report, .. }
            | TrackingError::Action { report, .. }
            | TrackingError::HandlerFailed { report, .. } => report,
        }
    }

    /// Whether this is a [`TrackingError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, TrackingError::Timeout { .. })
    }
}
