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

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::*;

use crate::common::dispatcher::Dispatcher;
use crate::common::{
    ambient, ActivityTracker, CourierConfig, Dispatched, Router, Session, SessionHandle,
    TrackedActivity,
};
use crate::message::{BusError, EnvelopeId, Intent, Report, SessionContext, TrackingError};
use crate::traits::CourierMessage;

/// The entry point for sending and publishing messages.
///
/// Cheap to clone; every clone shares the routing table and the tracker.
///
/// Called from inside a handler or a tracked action, `send` and `publish`
/// join the surrounding session. Called anywhere else, each call opens a
/// session of its own, reachable through the returned [`Dispatched`].
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    dispatcher: Dispatcher,
    tracker: ActivityTracker,
    config: CourierConfig,
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("routes", &self.inner.dispatcher.router().describe().len())
            .field("active_sessions", &self.inner.tracker.active_sessions())
            .finish()
    }
}

impl MessageBus {
    pub(crate) fn new(router: Router, config: CourierConfig) -> Self {
        Self {
            inner: Arc::new(BusInner {
                dispatcher: Dispatcher::new(router, config.behavior.log_payloads),
                tracker: ActivityTracker::default(),
                config,
            }),
        }
    }

    /// Sends `message` to the single handler registered for its type.
    ///
    /// Fails with [`BusError::NoHandler`] or [`BusError::AmbiguousHandler`]
    /// before anything is admitted.
    pub fn send<M: CourierMessage>(&self, message: M) -> Result<Dispatched, BusError> {
        self.emit(message, Intent::Send)
    }

    /// Publishes `message` to every subscriber of its type. Having no
    /// subscribers is not an error.
    pub fn publish<M: CourierMessage>(&self, message: M) -> Result<Dispatched, BusError> {
        self.emit(message, Intent::Publish)
    }

    fn emit<M: CourierMessage>(&self, message: M, intent: Intent) -> Result<Dispatched, BusError> {
        if let Some(context) = ambient::current().filter(|context| context.bus().same_bus(self)) {
            return context.emit(message, intent);
        }

        let session = self.inner.tracker.open();
        trace!(session = %session.id(), %intent, "Untracked call opened a session");
        let result = self.emit_in(&session, None, message, intent);
        if session.release_root() {
            self.inner.tracker.on_settled(&session);
        }
        result
    }

    pub(crate) fn emit_in<M: CourierMessage>(
        &self,
        session: &Arc<Session>,
        parent: Option<EnvelopeId>,
        message: M,
        intent: Intent,
    ) -> Result<Dispatched, BusError> {
        let deliveries = self
            .inner
            .dispatcher
            .route(message, intent, session, parent)
            .inspect_err(|error| debug!(session = %session.id(), %error, "Message rejected"))?;
        let envelope_ids = deliveries.iter().map(|d| d.envelope.id()).collect();
        Dispatcher::spawn(self.clone(), Arc::clone(session), deliveries);
        Ok(Dispatched::new(
            envelope_ids,
            SessionHandle::new(Arc::clone(session), self.inner.tracker.clone()),
        ))
    }

    /// Runs `action` in a fresh session and waits, for at most `timeout`,
    /// until every envelope it caused has been handled.
    pub async fn track<F, Fut>(&self, action: F, timeout: Duration) -> Result<Report, TrackingError>
    where
        F: FnOnce(SessionContext) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        self.track_activity().timeout(timeout).execute_and_wait(action).await
    }

    /// A tracked activity with the configured defaults.
    pub fn track_activity(&self) -> TrackedActivity<'_> {
        TrackedActivity::new(self)
    }

    /// The routing table.
    pub fn router(&self) -> &Router {
        self.inner.dispatcher.router()
    }

    /// The session registry.
    pub fn tracker(&self) -> &ActivityTracker {
        &self.inner.tracker
    }

    /// The configuration the bus was built with.
    pub fn config(&self) -> &CourierConfig {
        &self.inner.config
    }

    fn same_bus(&self, other: &MessageBus) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
