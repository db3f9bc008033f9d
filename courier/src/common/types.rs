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

//! Type aliases and the type-erased handler shape stored in the routing table.

use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::anyhow;
use futures::future::BoxFuture;

use crate::message::{Envelope, MessageContext, SessionContext};
use crate::traits::{downcast_clone, CourierMessage, Handler};

/// What a handler returns. Errors become the envelope's failure record.
pub type HandlerResult = anyhow::Result<()>;

/// A boxed, `Send` handler future.
pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

/// A handler with its message type erased, invoked with the shared envelope.
pub(crate) trait ErasedHandler: Send + Sync {
    fn invoke(&self, envelope: Arc<Envelope>, context: SessionContext) -> HandlerFuture;
}

/// Restores the message type erased by [`ErasedHandler`].
pub(crate) struct TypedHandler<M, H> {
    handler: Arc<H>,
    _message: PhantomData<fn() -> M>,
}

impl<M, H> TypedHandler<M, H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            _message: PhantomData,
        }
    }
}

impl<M, H> ErasedHandler for TypedHandler<M, H>
where
    M: CourierMessage,
    H: Handler<M>,
{
    fn invoke(&self, envelope: Arc<Envelope>, context: SessionContext) -> HandlerFuture {
        let handler = Arc::clone(&self.handler);
        Box::pin(async move {
            let message = downcast_clone::<M>(envelope.message()).ok_or_else(|| {
                anyhow!(
                    "envelope {} carries {}, handler expects {}",
                    envelope.id(),
                    envelope.type_name(),
                    std::any::type_name::<M>()
                )
            })?;
            handler
                .handle(MessageContext::new(message, envelope, context))
                .await
        })
    }
}
