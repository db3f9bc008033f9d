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

use crate::message::SessionContext;

tokio::task_local! {
    static AMBIENT: SessionContext;
}

/// The session context of the handler currently running on this task, if any.
///
/// Lets code that only holds a [`MessageBus`](crate::common::MessageBus) join
/// the surrounding session. Tasks spawned from a handler do not inherit it.
pub(crate) fn current() -> Option<SessionContext> {
    AMBIENT.try_with(Clone::clone).ok()
}

/// Runs `future` with `context` as the ambient session context.
pub(crate) async fn scope<F: Future>(context: SessionContext, future: F) -> F::Output {
    AMBIENT.scope(context, future).await
}

/// Calls `f` synchronously with `context` as the ambient session context.
pub(crate) fn sync_scope<R>(context: SessionContext, f: impl FnOnce() -> R) -> R {
    AMBIENT.sync_scope(context, f)
}
