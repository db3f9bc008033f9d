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

pub use completion_signal::{CompletionSignal, SignalSettled};
pub use config::{BehaviorConfig, CourierConfig, TimeoutConfig};
pub use courier::{BusBuilder, CourierApp};
pub use dispatcher::Dispatched;
pub use message_bus::MessageBus;
pub use router::{Route, Router};
pub use session::Session;
pub use tracker::{ActivityTracker, SessionHandle, TrackedActivity};
pub use types::{HandlerFuture, HandlerResult};

mod types;

mod ambient;
mod completion_signal;
mod config;
mod courier;
mod dispatcher;
mod message_bus;
mod router;
mod session;
mod tracker;
