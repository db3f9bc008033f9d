//! Core traits of the Courier bus.
//!
//! *   [`CourierMessage`]: marker trait for every routable message type.
//! *   [`Handler`]: processes one message type; registered for `send` or as a
//!     `publish` subscriber.

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

pub use courier_message::CourierMessage;
pub(crate) use courier_message::downcast_clone;
pub use handler::{FnHandler, Handler};

/// Defines the [`CourierMessage`] marker trait.
mod courier_message;
/// Defines the [`Handler`] trait and its closure adapter.
mod handler;
