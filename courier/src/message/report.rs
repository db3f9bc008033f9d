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

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use derive_new::new;

use crate::message::{Envelope, EnvelopeId, HandlerExecutionError, Intent, SessionId};
use crate::traits::CourierMessage;

/// One envelope as observed by a session.
#[derive(Clone, Debug)]
pub struct EnvelopeRecord {
    envelope_id: EnvelopeId,
    message_type: TypeId,
    type_name: &'static str,
    intent: Intent,
    parent_id: Option<EnvelopeId>,
    destination: Option<Arc<str>>,
    message: Arc<dyn CourierMessage>,
    created_at: DateTime<Utc>,
}

impl From<&Envelope> for EnvelopeRecord {
    fn from(envelope: &Envelope) -> Self {
        Self {
            envelope_id: envelope.id(),
            message_type: envelope.message_type(),
            type_name: envelope.type_name(),
            intent: envelope.intent(),
            parent_id: envelope.parent_id(),
            destination: envelope.destination().map(Arc::from),
            message: envelope.shared_message(),
            created_at: envelope.created_at(),
        }
    }
}

impl EnvelopeRecord {
    /// The recorded envelope's id.
    pub fn envelope_id(&self) -> EnvelopeId {
        self.envelope_id
    }

    /// `TypeId` of the payload.
    pub fn message_type(&self) -> TypeId {
        self.message_type
    }

    /// Fully qualified payload type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Sent or published.
    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// The envelope whose handler emitted this one.
    pub fn parent_id(&self) -> Option<EnvelopeId> {
        self.parent_id
    }

    /// The handler the envelope was routed to.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// When the envelope was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the payload is an `M`.
    pub fn is<M: CourierMessage>(&self) -> bool {
        self.message_type == TypeId::of::<M>()
    }

    /// The payload as `M`, if that is its type.
    pub fn message_as<M: CourierMessage>(&self) -> Option<&M> {
        self.message.as_ref().as_any().downcast_ref::<M>()
    }
}

/// One handler invocation.
#[derive(Clone, Debug, new)]
pub struct ExecutionRecord {
    envelope_id: EnvelopeId,
    handler: Arc<str>,
    type_name: &'static str,
    succeeded: bool,
}

impl ExecutionRecord {
    /// The envelope handled.
    pub fn envelope_id(&self) -> EnvelopeId {
        self.envelope_id
    }

    /// The handler's registered name.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// The message type handled.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the handler returned `Ok`.
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }
}

/// Everything a session observed.
///
/// Envelopes are listed in admission order, which is a causal order: a child
/// always follows its parent.
#[derive(Clone, Debug)]
pub struct Report {
    session_id: SessionId,
    envelopes: Vec<EnvelopeRecord>,
    executions: Vec<ExecutionRecord>,
    failures: Vec<HandlerExecutionError>,
    elapsed: Duration,
}

impl Report {
    pub(crate) fn new(
        session_id: SessionId,
        envelopes: Vec<EnvelopeRecord>,
        executions: Vec<ExecutionRecord>,
        failures: Vec<HandlerExecutionError>,
        elapsed: Duration,
    ) -> Self {
        Self {
            session_id,
            envelopes,
            executions,
            failures,
            elapsed,
        }
    }

    /// The session this report describes.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Time between the session opening and this report being taken.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Every envelope observed, in admission order.
    pub fn envelopes(&self) -> &[EnvelopeRecord] {
        &self.envelopes
    }

    /// Envelopes put on the bus with `send`.
    pub fn sent(&self) -> impl Iterator<Item = &EnvelopeRecord> {
        self.with_intent(Intent::Send)
    }

    /// Envelopes put on the bus with `publish`.
    pub fn published(&self) -> impl Iterator<Item = &EnvelopeRecord> {
        self.with_intent(Intent::Publish)
    }

    fn with_intent(&self, intent: Intent) -> impl Iterator<Item = &EnvelopeRecord> {
        self.envelopes.iter().filter(move |r| r.intent == intent)
    }

    /// Handler invocations in the order they finished.
    pub fn executions(&self) -> &[ExecutionRecord] {
        &self.executions
    }

    /// The first handler failure observed, if any.
    pub fn failure(&self) -> Option<&HandlerExecutionError> {
        self.failures.first()
    }

    /// Every handler failure observed, first one first.
    pub fn failures(&self) -> &[HandlerExecutionError] {
        &self.failures
    }

    /// Looks up one envelope.
    pub fn find(&self, envelope_id: EnvelopeId) -> Option<&EnvelopeRecord> {
        self.envelopes.iter().find(|r| r.envelope_id == envelope_id)
    }

    /// Envelopes emitted by the handler of `parent_id`.
    pub fn children_of(&self, parent_id: EnvelopeId) -> impl Iterator<Item = &EnvelopeRecord> {
        self.envelopes
            .iter()
            .filter(move |r| r.parent_id == Some(parent_id))
    }

    /// Every payload of type `M`, in admission order.
    pub fn messages_of<M: CourierMessage>(&self) -> Vec<&M> {
        self.envelopes
            .iter()
            .filter_map(EnvelopeRecord::message_as::<M>)
            .collect()
    }

    /// The payload of type `M` if exactly one was observed.
    pub fn single_message<M: CourierMessage>(&self) -> Option<&M> {
        let messages = self.messages_of::<M>();
        if messages.len() == 1 {
            Some(messages[0])
        } else {
            None
        }
    }

    /// Number of ancestors of an envelope (roots have depth 0).
    pub fn depth(&self, envelope_id: EnvelopeId) -> Option<usize> {
        let parents: HashMap<EnvelopeId, Option<EnvelopeId>> = self
            .envelopes
            .iter()
            .map(|r| (r.envelope_id, r.parent_id))
            .collect();
        let mut current = *parents.get(&envelope_id)?;
        let mut depth = 0;
        while let Some(parent) = current {
            depth += 1;
            current = parents.get(&parent).copied().flatten();
        }
        Some(depth)
    }

    /// Depth of the deepest envelope, or `None` for an empty report.
    pub fn max_depth(&self) -> Option<usize> {
        self.envelopes
            .iter()
            .filter_map(|r| self.depth(r.envelope_id))
            .max()
    }
}
