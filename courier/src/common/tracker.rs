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

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::*;

use crate::common::{ambient, MessageBus, Session};
use crate::message::{Report, SessionContext, SessionId, TrackingError};
use crate::traits::CourierMessage;

/// Keeps every live session and bounds tracked activities by a deadline.
///
/// A session leaves the tracker when it settles, when its tracked activity
/// ends, or when it times out. Handlers that outlive a timeout keep running;
/// their session is simply no longer listed.
#[derive(Clone, Debug, Default)]
pub struct ActivityTracker {
    sessions: Arc<DashMap<SessionId, Arc<Session>>>,
}

impl ActivityTracker {
    pub(crate) fn open(&self) -> Arc<Session> {
        let session = Arc::new(Session::new());
        self.sessions.insert(session.id(), Arc::clone(&session));
        trace!(session = %session.id(), "Session opened");
        session
    }

    pub(crate) fn on_settled(&self, session: &Session) {
        trace!(session = %session.id(), "Session settled");
        self.discard(session.id());
    }

    fn discard(&self, id: SessionId) {
        self.sessions.remove(&id);
    }

    /// Number of sessions that have not settled or been abandoned yet.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// A live session by id.
    pub fn session(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Runs `action` in a fresh session and waits for that session to drain.
    ///
    /// The deadline covers both the action and everything it causes.
    pub(crate) async fn track<F, Fut>(
        &self,
        bus: &MessageBus,
        action: F,
        timeout: Duration,
        fail_on_handler_errors: bool,
    ) -> Result<Report, TrackingError>
    where
        F: FnOnce(SessionContext) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let deadline = Instant::now() + timeout;
        let session = self.open();
        let span = debug_span!("tracked_activity", session = %session.id(), ?timeout);

        async {
            let context = SessionContext::new(bus.clone(), Arc::clone(&session), None);
            // The closure body runs in the session too, not just its future.
            let future = ambient::sync_scope(context.clone(), || action(context.clone()));
            let action = ambient::scope(context, future);

            match tokio::time::timeout_at(deadline, action).await {
                Err(_) => {
                    warn!("Tracked action overran its deadline");
                    self.discard(session.id());
                    session.release_root();
                    return Err(TrackingError::Timeout {
                        timeout,
                        report: Box::new(session.report()),
                    });
                }
                Ok(Err(error)) => {
                    debug!(%error, "Tracked action failed");
                    self.discard(session.id());
                    session.release_root();
                    return Err(TrackingError::Action {
                        source: error.into(),
                        report: Box::new(session.report()),
                    });
                }
                Ok(Ok(())) => {}
            }

            if session.release_root() {
                self.on_settled(&session);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            let settled = session.await_settled(remaining).await;
            self.discard(session.id());

            let report = session.report();
            if !settled {
                warn!(in_flight = session.in_flight(), "Tracked session did not settle");
                return Err(TrackingError::Timeout {
                    timeout,
                    report: Box::new(report),
                });
            }
            debug!(
                envelopes = report.envelopes().len(),
                elapsed = ?report.elapsed(),
                "Tracked session settled"
            );
            match session.failure() {
                Some(failure) if fail_on_handler_errors => Err(TrackingError::HandlerFailed {
                    failure,
                    report: Box::new(report),
                }),
                _ => Ok(report),
            }
        }
        .instrument(span)
        .await
    }
}

/// A handle on the session a message joined.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    session: Arc<Session>,
    tracker: ActivityTracker,
}

impl SessionHandle {
    pub(crate) fn new(session: Arc<Session>, tracker: ActivityTracker) -> Self {
        Self { session, tracker }
    }

    /// The session id.
    pub fn id(&self) -> SessionId {
        self.session.id()
    }

    /// Whether the session has drained.
    pub fn is_settled(&self) -> bool {
        self.session.is_settled()
    }

    /// A snapshot of what the session has observed so far.
    pub fn report(&self) -> Report {
        self.session.report()
    }

    /// Waits for the session to drain and returns its report.
    ///
    /// The session leaves the tracker whether it drained or timed out; handlers
    /// still running keep running.
    pub async fn wait(&self, timeout: Duration) -> Result<Report, TrackingError> {
        let settled = self.session.await_settled(timeout).await;
        self.tracker.discard(self.session.id());
        if settled {
            Ok(self.session.report())
        } else {
            Err(TrackingError::Timeout {
                timeout,
                report: Box::new(self.session.report()),
            })
        }
    }
}

/// Builder for a tracked activity, created by [`MessageBus::track_activity`].
///
/// Defaults come from the bus's [`CourierConfig`](crate::common::CourierConfig).
#[derive(Debug)]
#[must_use = "a tracked activity does nothing until executed"]
pub struct TrackedActivity<'a> {
    bus: &'a MessageBus,
    timeout: Duration,
    fail_on_handler_errors: bool,
}

impl<'a> TrackedActivity<'a> {
    pub(crate) fn new(bus: &'a MessageBus) -> Self {
        let config = bus.config();
        Self {
            bus,
            timeout: config.tracking_timeout(),
            fail_on_handler_errors: config.behavior.fail_on_handler_errors,
        }
    }

    /// Overrides the deadline for the whole activity.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Turns a captured handler failure into [`TrackingError::HandlerFailed`].
    pub fn fail_on_handler_errors(mut self, enabled: bool) -> Self {
        self.fail_on_handler_errors = enabled;
        self
    }

    /// Runs `action` in a fresh session and waits for it to drain.
    pub async fn execute_and_wait<F, Fut>(self, action: F) -> Result<Report, TrackingError>
    where
        F: FnOnce(SessionContext) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        self.bus
            .tracker()
            .track(self.bus, action, self.timeout, self.fail_on_handler_errors)
            .await
    }

    /// Sends `message` in a fresh session and waits for it to drain.
    pub async fn send_message_and_wait<M: CourierMessage>(
        self,
        message: M,
    ) -> Result<Report, TrackingError> {
        self.execute_and_wait(|context| async move {
            context.send(message)?;
            Ok(())
        })
        .await
    }

    /// Publishes `message` in a fresh session and waits for it to drain.
    pub async fn publish_message_and_wait<M: CourierMessage>(
        self,
        message: M,
    ) -> Result<Report, TrackingError> {
        self.execute_and_wait(|context| async move {
            context.publish(message)?;
            Ok(())
        })
        .await
    }
}

