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

use std::any::{Any, TypeId};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::*;

use crate::common::router::{Destination, Router};
use crate::common::{ambient, MessageBus, Session, SessionHandle};
use crate::message::{
    BusError, Envelope, EnvelopeId, ExecutionRecord, HandlerExecutionError, Intent,
    SessionContext,
};
use crate::traits::CourierMessage;

/// One envelope paired with the destination it will be handed to. A publish
/// with no subscribers yields a single delivery without a destination.
#[derive(Debug)]
pub(crate) struct Delivery {
    pub(crate) envelope: Arc<Envelope>,
    pub(crate) destination: Option<Destination>,
}

/// How the dispatch of one envelope ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    Handled,
    Failed,
    Unrouted,
}

/// Turns messages into admitted envelopes and runs their handlers.
#[derive(Debug)]
pub(crate) struct Dispatcher {
    router: Router,
    log_payloads: bool,
}

impl Dispatcher {
    pub(crate) fn new(router: Router, log_payloads: bool) -> Self {
        Self {
            router,
            log_payloads,
        }
    }

    pub(crate) fn router(&self) -> &Router {
        &self.router
    }

    /// Resolves destinations, builds one envelope per destination and admits
    /// them all to `session`. Nothing is admitted when resolution fails.
    pub(crate) fn route<M: CourierMessage>(
        &self,
        message: M,
        intent: Intent,
        session: &Session,
        parent: Option<EnvelopeId>,
    ) -> Result<Vec<Delivery>, BusError> {
        let type_name = std::any::type_name::<M>();
        let destinations = self.router.resolve(TypeId::of::<M>(), type_name, intent)?;
        let message = Arc::new(message);
        let deliver = |destination: Option<Destination>| Delivery {
            envelope: Arc::new(Envelope::new(
                Arc::clone(&message),
                intent,
                parent,
                session.id(),
                destination.as_ref().map(|d| Arc::clone(&d.name)),
            )),
            destination,
        };
        let deliveries: Vec<Delivery> = if destinations.is_empty() {
            vec![deliver(None)]
        } else {
            destinations.into_iter().map(|d| deliver(Some(d))).collect()
        };

        let envelopes: Vec<Arc<Envelope>> =
            deliveries.iter().map(|d| Arc::clone(&d.envelope)).collect();
        session.admit(&envelopes)?;
        if self.log_payloads {
            debug!(
                session = %session.id(),
                %intent,
                payload = ?deliveries[0].envelope.message(),
                "Message admitted"
            );
        }
        Ok(deliveries)
    }

    /// Runs the deliveries of one call, in order, on a single spawned task.
    pub(crate) fn spawn(bus: MessageBus, session: Arc<Session>, deliveries: Vec<Delivery>) {
        tokio::spawn(
            async move {
                for delivery in deliveries {
                    let outcome = Self::dispatch(&bus, &session, delivery).await;
                    trace!(?outcome, "Delivery finished");
                }
            }
            .in_current_span(),
        );
    }

    #[instrument(
        skip_all,
        fields(
            session = %session.id(),
            envelope = %delivery.envelope.id(),
            message = delivery.envelope.type_name()
        )
    )]
    async fn dispatch(
        bus: &MessageBus,
        session: &Arc<Session>,
        delivery: Delivery,
    ) -> DispatchOutcome {
        let Delivery {
            envelope,
            destination,
        } = delivery;
        let envelope_id = envelope.id();

        let outcome = match destination {
            None => {
                trace!("Published with no subscribers");
                DispatchOutcome::Unrouted
            }
            Some(destination) => {
                let context =
                    SessionContext::new(bus.clone(), Arc::clone(session), Some(envelope_id));
                let invocation = destination.handler.invoke(Arc::clone(&envelope), context.clone());
                let result =
                    ambient::scope(context, AssertUnwindSafe(invocation).catch_unwind()).await;
                let description = match result {
                    Ok(Ok(())) => None,
                    Ok(Err(error)) => Some(format!("{error:#}")),
                    Err(payload) => Some(panic_message(payload.as_ref())),
                };
                let succeeded = description.is_none();
                let failure = description.map(|description| {
                    warn!(handler = %destination.name, %description, "Handler failed");
                    HandlerExecutionError::new(
                        envelope_id,
                        Arc::clone(&destination.name),
                        envelope.type_name(),
                        description,
                    )
                });
                session.record_execution(
                    ExecutionRecord::new(
                        envelope_id,
                        Arc::clone(&destination.name),
                        envelope.type_name(),
                        succeeded,
                    ),
                    failure,
                );
                if succeeded {
                    DispatchOutcome::Handled
                } else {
                    DispatchOutcome::Failed
                }
            }
        };

        if session.complete(envelope_id) {
            bus.tracker().on_settled(session);
        }
        outcome
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}

/// What a successful `send` or `publish` returns.
///
/// Handlers run in the background; use [`Dispatched::session`] to wait for
/// the session the message joined.
#[derive(Clone, Debug)]
pub struct Dispatched {
    envelope_ids: Vec<EnvelopeId>,
    session: SessionHandle,
}

impl Dispatched {
    pub(crate) fn new(envelope_ids: Vec<EnvelopeId>, session: SessionHandle) -> Self {
        Self {
            envelope_ids,
            session,
        }
    }

    /// Envelopes created by the call, one per destination.
    pub fn envelope_ids(&self) -> &[EnvelopeId] {
        &self.envelope_ids
    }

    /// The session the envelopes joined.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_rendered() {
        let borrowed: Box<dyn Any + Send> = Box::new("disk full");
        let owned: Box<dyn Any + Send> = Box::new(String::from("index corrupt"));
        let opaque: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(borrowed.as_ref()), "handler panicked: disk full");
        assert_eq!(panic_message(owned.as_ref()), "handler panicked: index corrupt");
        assert_eq!(panic_message(opaque.as_ref()), "handler panicked");
    }
}
