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

use std::any::Any;
use std::fmt::Debug;

use dyn_clone::DynClone;

/// A marker trait for types that can travel through the Courier bus.
///
/// Messages are routed by their concrete [`TypeId`](std::any::TypeId), shared
/// behind an `Arc` between the session log and every handler they are routed to,
/// and cloned out for each handler invocation. That requires
/// `Any + Send + Sync + Debug` plus [`DynClone`] so a clone can be taken without
/// knowing the concrete type.
///
/// A blanket implementation covers every qualifying type, so deriving `Clone`
/// and `Debug` (or using [`courier_message`](courier_macro::courier_message))
/// is all a message type needs.
pub trait CourierMessage: DynClone + Any + Send + Sync + Debug {
    /// Returns the message as a dynamic [`Any`] reference for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the fully qualified name of the concrete message type.
    fn type_name(&self) -> &'static str;
}

dyn_clone::clone_trait_object!(CourierMessage);

impl<T> CourierMessage for T
where
    T: Any + Send + Sync + Debug + DynClone + 'static,
{
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Takes an owned copy of a shared payload if it holds an `M`.
pub(crate) fn downcast_clone<M: CourierMessage>(message: &dyn CourierMessage) -> Option<M> {
    message.as_any().downcast_ref::<M>().map(dyn_clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct FileAdded(String);

    #[derive(Clone, Debug)]
    struct FileRemoved;

    #[test]
    fn downcast_clone_matches_only_the_concrete_type() {
        let boxed: Box<dyn CourierMessage> = Box::new(FileAdded("a.txt".into()));

        assert_eq!(
            downcast_clone::<FileAdded>(boxed.as_ref()),
            Some(FileAdded("a.txt".into()))
        );
        assert!(downcast_clone::<FileRemoved>(boxed.as_ref()).is_none());
        assert!(boxed.as_ref().type_name().ends_with("FileAdded"));
    }
}
