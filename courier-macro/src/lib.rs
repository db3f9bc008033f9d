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

#![forbid(unsafe_code)]

//! Courier Macro Library
//!
//! Procedural macros for the Courier message bus.
//!
//! # Message Macro
//!
//! The [`courier_message`] macro turns a plain type into something the bus can
//! route with `send` or `publish`:
//!
//! ```ignore
//! #[courier_message]
//! pub struct FileAdded {
//!     pub file_name: String,
//! }
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// Derives what a type needs to travel through the Courier bus.
///
/// Messages are routed by their concrete type, shared between concurrently
/// running handlers and handed to each handler as an owned clone, so they must
/// be `Clone + Debug + Send + Sync + 'static`.
///
/// ```ignore
/// use courier_macro::courier_message;
///
/// #[courier_message]
/// pub struct FileAddedViaPublish(pub String);
/// ```
///
/// This expands to:
/// - `#[derive(Clone, Debug)]` (only the traits not already present)
/// - A compile-time assertion that the type is `Send + Sync + 'static`
#[proc_macro_attribute]
pub fn courier_message(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let derives = {
        let mut traits = Vec::new();
        if !has_derive(&input, "Clone") {
            traits.push(quote!(Clone));
        }
        if !has_derive(&input, "Debug") {
            traits.push(quote!(Debug));
        }
        if traits.is_empty() {
            quote!()
        } else {
            quote!(#[derive(#(#traits),*)])
        }
    };

    let assert_ident = quote::format_ident!("_AssertCourierMessage_{}", name);

    let expanded = quote! {
        #derives
        #input

        // Routing shares one payload across tasks, so reject non-thread-safe
        // message types where they are declared.
        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
