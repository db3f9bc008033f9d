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
use std::future::Future;
use std::sync::Arc;

use tracing::*;

use crate::common::router::Destination;
use crate::common::types::TypedHandler;
use crate::common::{CourierConfig, HandlerResult, MessageBus, Router};
use crate::message::{Intent, MessageContext};
use crate::traits::{CourierMessage, FnHandler, Handler};

/// Entry point for assembling a message bus.
#[derive(Default, Debug, Clone)]
pub struct CourierApp;

impl CourierApp {
    /// Starts registering handlers and subscribers.
    pub fn builder() -> BusBuilder {
        BusBuilder::default()
    }
}

/// Collects routes, then freezes them into a [`MessageBus`].
///
/// Registering more than one handler for a type is allowed here; `send`
/// reports the conflict when it resolves that type.
#[derive(Debug, Default)]
#[must_use = "call build() to obtain a MessageBus"]
pub struct BusBuilder {
    router: Router,
    config: Option<CourierConfig>,
}

impl BusBuilder {
    /// Registers the `send` handler for `M`.
    pub fn handle<M, H>(self, handler: H) -> Self
    where
        M: CourierMessage,
        H: Handler<M>,
    {
        self.register::<M, H>(Intent::Send, handler.name(), handler)
    }

    /// Registers a closure as the `send` handler for `M`.
    pub fn handle_fn<M, F, Fut>(self, name: &str, f: F) -> Self
    where
        M: CourierMessage,
        F: Fn(MessageContext<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register::<M, _>(Intent::Send, name, FnHandler::new(f))
    }

    /// Adds a subscriber for `M`.
    pub fn subscribe<M, H>(self, handler: H) -> Self
    where
        M: CourierMessage,
        H: Handler<M>,
    {
        self.register::<M, H>(Intent::Publish, handler.name(), handler)
    }

    /// Adds a closure as a subscriber for `M`.
    pub fn subscribe_fn<M, F, Fut>(self, name: &str, f: F) -> Self
    where
        M: CourierMessage,
        F: Fn(MessageContext<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.register::<M, _>(Intent::Publish, name, FnHandler::new(f))
    }

    /// Uses `config` instead of the one loaded from disk.
    pub fn with_config(mut self, config: CourierConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Freezes the routing table and creates the bus.
    pub fn build(self) -> MessageBus {
        let config = self.config.unwrap_or_else(CourierConfig::load);
        for route in self.router.describe() {
            debug!(
                message_type = route.type_name,
                intent = %route.intent,
                handler = %route.handler,
                "Route registered"
            );
        }
        MessageBus::new(self.router, config)
    }

    fn register<M, H>(mut self, intent: Intent, name: &str, handler: H) -> Self
    where
        M: CourierMessage,
        H: Handler<M>,
    {
        let destination = Destination::new(name, Arc::new(TypedHandler::<M, H>::new(handler)));
        self.router
            .register(intent, TypeId::of::<M>(), std::any::type_name::<M>(), destination);
        self
    }
}
