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

use async_trait::async_trait;

use crate::common::HandlerResult;
use crate::message::MessageContext;
use crate::traits::CourierMessage;

/// Processes messages of type `M`.
///
/// A handler receives an owned copy of the message inside a [`MessageContext`].
/// It may emit further messages through the context (or any `MessageBus`
/// clone); those become cascades of the envelope being handled. Returning an
/// error records a failure for that envelope without affecting any other.
///
/// ```rust,ignore
/// struct FileAddedHandler;
///
/// #[async_trait]
/// impl Handler<FileAdded> for FileAddedHandler {
///     async fn handle(&self, context: MessageContext<FileAdded>) -> HandlerResult {
///         context.publish(FileIndexed(context.message().0.clone()))?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<M: CourierMessage>: Send + Sync + 'static {
    /// Handles one message.
    async fn handle(&self, context: MessageContext<M>) -> HandlerResult;

    /// Name the handler is registered under. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Adapts an async closure into a [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<M, F, Fut> Handler<M> for FnHandler<F>
where
    M: CourierMessage,
    F: Fn(MessageContext<M>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, context: MessageContext<M>) -> HandlerResult {
        (self.f)(context).await
    }
}
