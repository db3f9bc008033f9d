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

use static_assertions::assert_impl_all;

use crate::common::{Dispatched, MessageBus, Session};
use crate::message::{BusError, Envelope, EnvelopeId, Intent, SessionId};
use crate::traits::CourierMessage;

/// The session a piece of code is running under, and the envelope (if any)
/// whose handler is running.
///
/// Tracked actions receive one directly; handlers receive one inside their
/// [`MessageContext`]. Messages emitted through it join the same session and
/// name the current envelope as their parent.
#[derive(Clone, Debug)]
pub struct SessionContext {
    bus: MessageBus,
    session: Arc<Session>,
    parent: Option<EnvelopeId>,
}

impl SessionContext {
    pub(crate) fn new(bus: MessageBus, session: Arc<Session>, parent: Option<EnvelopeId>) -> Self {
        Self {
            bus,
            session,
            parent,
        }
    }

    /// Sends `message` to its single handler within this session.
    pub fn send<M: CourierMessage>(&self, message: M) -> Result<Dispatched, BusError> {
        self.emit(message, Intent::Send)
    }

    /// Publishes `message` to its subscribers within this session.
    pub fn publish<M: CourierMessage>(&self, message: M) -> Result<Dispatched, BusError> {
        self.emit(message, Intent::Publish)
    }

    pub(crate) fn emit<M: CourierMessage>(
        &self,
        message: M,
        intent: Intent,
    ) -> Result<Dispatched, BusError> {
        self.bus.emit_in(&self.session, self.parent, message, intent)
    }

    /// The bus this context dispatches through.
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// The session id.
    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    /// The session itself.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The envelope whose handler this context belongs to.
    pub fn parent_id(&self) -> Option<EnvelopeId> {
        self.parent
    }
}

/// What a handler receives: the message, its envelope, and the session context
/// used to emit cascades.
#[derive(Clone, Debug)]
pub struct MessageContext<M> {
    message: M,
    envelope: Arc<Envelope>,
    session: SessionContext,
}

impl<M> MessageContext<M> {
    pub(crate) fn new(message: M, envelope: Arc<Envelope>, session: SessionContext) -> Self {
        Self {
            message,
            envelope,
            session,
        }
    }

    /// The message being handled.
    pub const fn message(&self) -> &M {
        &self.message
    }

    /// Takes the message out of the context.
    pub fn into_message(self) -> M {
        self.message
    }

    /// The envelope being handled.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// The session context cascades are emitted through.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The bus the message arrived on.
    pub fn bus(&self) -> &MessageBus {
        self.session.bus()
    }

    /// Sends a cascade of this envelope.
    pub fn send<N: CourierMessage>(&self, message: N) -> Result<Dispatched, BusError> {
        self.session.send(message)
    }

    /// Publishes a cascade of this envelope.
    pub fn publish<N: CourierMessage>(&self, message: N) -> Result<Dispatched, BusError> {
        self.session.publish(message)
    }
}

// Handlers run on the multi-threaded runtime and may hold their context across
// await points.
assert_impl_all!(MessageContext<u32>: Send, Sync);
assert_impl_all!(SessionContext: Send, Sync);
