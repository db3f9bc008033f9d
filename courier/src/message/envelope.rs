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
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::traits::CourierMessage;

/// Unique identifier of one envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnvelopeId(Uuid);

impl EnvelopeId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EnvelopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "env-{}", self.0.simple())
    }
}

/// Unique identifier of one tracked session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ses-{}", self.0.simple())
    }
}

/// How an envelope was put on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Point-to-point: exactly one handler.
    Send,
    /// Fan-out: zero or more subscribers.
    Publish,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Send => f.write_str("sent"),
            Intent::Publish => f.write_str("published"),
        }
    }
}

/// A message wrapped with its delivery metadata.
///
/// Envelopes are immutable once built. Roots (`parent_id == None`) come from a
/// call made outside any handler; every other envelope was emitted by the
/// handler of its parent while that parent was still in flight.
#[derive(Clone, Debug)]
pub struct Envelope {
    id: EnvelopeId,
    message: Arc<dyn CourierMessage>,
    message_type: TypeId,
    type_name: &'static str,
    intent: Intent,
    parent_id: Option<EnvelopeId>,
    session_id: SessionId,
    destination: Option<Arc<str>>,
    created_at: DateTime<Utc>,
}

impl Envelope {
    pub(crate) fn new<M: CourierMessage>(
        message: Arc<M>,
        intent: Intent,
        parent_id: Option<EnvelopeId>,
        session_id: SessionId,
        destination: Option<Arc<str>>,
    ) -> Self {
        Self {
            id: EnvelopeId::new(),
            message,
            message_type: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            intent,
            parent_id,
            session_id,
            destination,
            created_at: Utc::now(),
        }
    }

    /// The envelope's unique id.
    pub fn id(&self) -> EnvelopeId {
        self.id
    }

    /// The wrapped payload.
    pub fn message(&self) -> &dyn CourierMessage {
        &*self.message
    }

    pub(crate) fn shared_message(&self) -> Arc<dyn CourierMessage> {
        Arc::clone(&self.message)
    }

    /// The `TypeId` of the concrete payload type.
    pub fn message_type(&self) -> TypeId {
        self.message_type
    }

    /// The fully qualified name of the concrete payload type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the payload was sent or published.
    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// The envelope whose handler emitted this one, if any.
    pub fn parent_id(&self) -> Option<EnvelopeId> {
        self.parent_id
    }

    /// The session this envelope belongs to.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Name of the handler this envelope is routed to. `None` for a publish
    /// nobody subscribed to.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// When the envelope was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the payload as `M` if that is its concrete type.
    pub fn message_as<M: CourierMessage>(&self) -> Option<&M> {
        self.message().as_any().downcast_ref::<M>()
    }
}
