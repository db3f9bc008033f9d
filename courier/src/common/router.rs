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
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::common::types::ErasedHandler;
use crate::message::{BusError, Intent};
use crate::traits::CourierMessage;

/// A named handler a message type resolves to.
#[derive(Clone)]
pub(crate) struct Destination {
    pub(crate) name: Arc<str>,
    pub(crate) handler: Arc<dyn ErasedHandler>,
}

impl Destination {
    pub(crate) fn new(name: &str, handler: Arc<dyn ErasedHandler>) -> Self {
        Self {
            name: Arc::from(name),
            handler,
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination").field("name", &self.name).finish()
    }
}

/// One registered route, as reported by [`Router::describe`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Fully qualified message type name.
    pub type_name: &'static str,
    /// `Send` for handlers, `Publish` for subscribers.
    pub intent: Intent,
    /// The handler's registered name.
    pub handler: String,
}

/// Resolves a message type and intent to its destinations.
///
/// Built once by [`BusBuilder`](crate::common::BusBuilder) and read-only after
/// the bus exists, so lookups take no lock. Matching is by exact concrete type.
#[derive(Debug, Default)]
pub struct Router {
    handlers: HashMap<TypeId, Vec<Destination>>,
    subscribers: HashMap<TypeId, Vec<Destination>>,
    type_names: HashMap<TypeId, &'static str>,
}

impl Router {
    pub(crate) fn register(
        &mut self,
        intent: Intent,
        message_type: TypeId,
        type_name: &'static str,
        destination: Destination,
    ) {
        trace!(
            message_type = type_name,
            handler = %destination.name,
            %intent,
            "Registering destination"
        );
        self.type_names.insert(message_type, type_name);
        self.table_mut(intent)
            .entry(message_type)
            .or_default()
            .push(destination);
    }

    /// Destinations for a message: exactly one for `Send`, every subscriber in
    /// registration order (possibly none) for `Publish`.
    pub(crate) fn resolve(
        &self,
        message_type: TypeId,
        type_name: &'static str,
        intent: Intent,
    ) -> Result<Vec<Destination>, BusError> {
        let registered = self
            .table(intent)
            .get(&message_type)
            .map(Vec::as_slice)
            .unwrap_or_default();
        match intent {
            Intent::Publish => Ok(registered.to_vec()),
            Intent::Send => match registered {
                [] => Err(BusError::NoHandler { type_name }),
                [only] => Ok(vec![only.clone()]),
                _ => Err(BusError::AmbiguousHandler {
                    type_name,
                    count: registered.len(),
                }),
            },
        }
    }

    /// Number of `send` handlers registered for `M`.
    pub fn handler_count<M: CourierMessage>(&self) -> usize {
        self.count(Intent::Send, TypeId::of::<M>())
    }

    /// Number of subscribers registered for `M`.
    pub fn subscriber_count<M: CourierMessage>(&self) -> usize {
        self.count(Intent::Publish, TypeId::of::<M>())
    }

    /// Every registered route, handlers first.
    pub fn describe(&self) -> Vec<Route> {
        [Intent::Send, Intent::Publish]
            .into_iter()
            .flat_map(move |intent| {
                self.table(intent).iter().flat_map(move |(message_type, destinations)| {
                    let type_name = self
                        .type_names
                        .get(message_type)
                        .copied()
                        .unwrap_or("<unknown>");
                    destinations.iter().map(move |destination| Route {
                        type_name,
                        intent,
                        handler: destination.name.to_string(),
                    })
                })
            })
            .collect()
    }

    fn count(&self, intent: Intent, message_type: TypeId) -> usize {
        self.table(intent).get(&message_type).map_or(0, Vec::len)
    }

    fn table(&self, intent: Intent) -> &HashMap<TypeId, Vec<Destination>> {
        match intent {
            Intent::Send => &self.handlers,
            Intent::Publish => &self.subscribers,
        }
    }

    fn table_mut(&mut self, intent: Intent) -> &mut HashMap<TypeId, Vec<Destination>> {
        match intent {
            Intent::Send => &mut self.handlers,
            Intent::Publish => &mut self.subscribers,
        }
    }
}
