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

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::common::CompletionSignal;
use crate::message::{
    BusError, Envelope, EnvelopeId, EnvelopeRecord, ExecutionRecord, HandlerExecutionError,
    Report, SessionId,
};

/// The tracked unit of work rooted at one trigger, with all of its cascades.
///
/// A session opens holding one unit for the triggering call itself, gains one
/// unit per admitted envelope and loses one per finished envelope. It settles
/// when the count reaches zero and admits nothing afterwards.
///
/// Every counter mutation happens under the session lock together with the log
/// update it belongs to, so the log order is the admission order.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    signal: CompletionSignal,
    root_released: AtomicBool,
    state: Mutex<SessionState>,
    opened_at: Instant,
}

#[derive(Debug, Default)]
struct SessionState {
    log: Vec<EnvelopeRecord>,
    open: HashSet<EnvelopeId>,
    executions: Vec<ExecutionRecord>,
    failures: Vec<HandlerExecutionError>,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            id: SessionId::new(),
            signal: CompletionSignal::new(1),
            root_released: AtomicBool::new(false),
            state: Mutex::new(SessionState::default()),
            opened_at: Instant::now(),
        }
    }

    /// The session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Units still held: open envelopes, plus one until the trigger returns.
    pub fn in_flight(&self) -> usize {
        self.signal.in_flight()
    }

    /// Whether the session has drained.
    pub fn is_settled(&self) -> bool {
        self.signal.is_settled()
    }

    /// Whether `envelope_id` was admitted and has not finished yet.
    pub fn is_open(&self, envelope_id: EnvelopeId) -> bool {
        self.state.lock().open.contains(&envelope_id)
    }

    /// Admits the envelopes produced by one send or publish call.
    ///
    /// Either all of them are logged and counted or none is.
    pub(crate) fn admit(&self, envelopes: &[Arc<Envelope>]) -> Result<(), BusError> {
        let Some(first) = envelopes.first() else {
            return Ok(());
        };
        let mut state = self.state.lock();
        if let Some(parent_id) = first.parent_id() {
            if !state.open.contains(&parent_id) {
                return Err(BusError::DetachedCascade {
                    parent_id,
                    type_name: first.type_name(),
                });
            }
        }
        for envelope in envelopes {
            // An open parent or the unreleased root keeps the count above zero
            // while the lock is held, so only the first increment can fail.
            self.signal
                .increment()
                .map_err(|_| BusError::SessionSettled {
                    session_id: self.id,
                    type_name: envelope.type_name(),
                })?;
            state.open.insert(envelope.id());
            state.log.push(EnvelopeRecord::from(envelope.as_ref()));
            trace!(
                session = %self.id,
                envelope = %envelope.id(),
                intent = %envelope.intent(),
                "Envelope admitted"
            );
        }
        Ok(())
    }

    pub(crate) fn record_execution(
        &self,
        execution: ExecutionRecord,
        failure: Option<HandlerExecutionError>,
    ) {
        let mut state = self.state.lock();
        state.executions.push(execution);
        if let Some(failure) = failure {
            state.failures.push(failure);
        }
    }

    /// Marks an envelope finished. Returns whether the session settled.
    pub(crate) fn complete(&self, envelope_id: EnvelopeId) -> bool {
        let mut state = self.state.lock();
        if !state.open.remove(&envelope_id) {
            warn!(
                session = %self.id,
                envelope = %envelope_id,
                "Envelope completed twice or never admitted"
            );
            return self.signal.is_settled();
        }
        self.signal.decrement() == 0
    }

    /// Releases the unit held by the triggering call. Returns whether the
    /// session settled.
    pub(crate) fn release_root(&self) -> bool {
        let _state = self.state.lock();
        if self.root_released.swap(true, Ordering::SeqCst) {
            warn!(session = %self.id, "Root unit released twice");
            return self.signal.is_settled();
        }
        self.signal.decrement() == 0
    }

    /// Waits for the session to drain. Returns `false` on timeout.
    pub async fn await_settled(&self, timeout: Duration) -> bool {
        self.signal.await_zero(timeout).await
    }

    /// The first handler failure observed so far.
    pub fn failure(&self) -> Option<HandlerExecutionError> {
        self.state.lock().failures.first().cloned()
    }

    /// A snapshot of everything observed so far.
    pub fn report(&self) -> Report {
        let state = self.state.lock();
        Report::new(
            self.id,
            state.log.clone(),
            state.executions.clone(),
            state.failures.clone(),
            self.opened_at.elapsed(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Intent;

    #[derive(Clone, Debug)]
    struct FileAdded(&'static str);

    fn envelope(session: &Session, parent: Option<EnvelopeId>) -> Arc<Envelope> {
        Arc::new(Envelope::new(
            Arc::new(FileAdded("a.txt")),
            Intent::Send,
            parent,
            session.id(),
            Some(Arc::from("file_added")),
        ))
    }

    #[test]
    fn root_unit_keeps_session_open_until_released() {
        let session = Session::new();
        let root = envelope(&session, None);
        session.admit(&[Arc::clone(&root)]).unwrap();
        assert_eq!(session.in_flight(), 2);

        assert!(!session.complete(root.id()));
        assert!(!session.is_settled());
        assert!(session.release_root());
        assert!(session.is_settled());
    }

    #[test]
    fn log_preserves_admission_order() {
        let session = Session::new();
        let parent = envelope(&session, None);
        session.admit(&[Arc::clone(&parent)]).unwrap();
        let children = [
            envelope(&session, Some(parent.id())),
            envelope(&session, Some(parent.id())),
        ];
        session.admit(&children).unwrap();

        let report = session.report();
        let ids: Vec<_> = report.envelopes().iter().map(|r| r.envelope_id()).collect();
        assert_eq!(ids, vec![parent.id(), children[0].id(), children[1].id()]);
        assert_eq!(report.depth(children[1].id()), Some(1));
    }

    #[test]
    fn rejects_cascade_from_completed_parent() {
        let session = Session::new();
        let parent = envelope(&session, None);
        session.admit(&[Arc::clone(&parent)]).unwrap();
        session.complete(parent.id());

        let late = envelope(&session, Some(parent.id()));
        let err = session.admit(&[late]).unwrap_err();
        assert!(matches!(
            err,
            BusError::DetachedCascade { parent_id, .. } if parent_id == parent.id()
        ));
        assert_eq!(session.report().envelopes().len(), 1);
    }

    #[test]
    fn settled_session_admits_nothing() {
        let session = Session::new();
        session.release_root();
        let err = session.admit(&[envelope(&session, None)]).unwrap_err();
        assert!(matches!(err, BusError::SessionSettled { .. }));
    }

    #[test]
    fn double_completion_is_ignored() {
        let session = Session::new();
        let root = envelope(&session, None);
        session.admit(&[Arc::clone(&root)]).unwrap();
        session.complete(root.id());
        session.complete(root.id());
        session.release_root();
        session.release_root();
        assert_eq!(session.in_flight(), 0);
    }
}
