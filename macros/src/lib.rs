//! Derive macros for the todo store
//!
//! This crate provides procedural macros that remove boilerplate from
//! reducer-based features.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates helpers for action enums (commands/events)
//! - `#[derive(State)]` - Generates revision accessors for state structs
//!
//! # Example
//!
//! ```ignore
//! use todo_store_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TodoAction {
//!     #[command]
//!     AddTodo { title: String },
//!
//!     #[event]
//!     TodoAdded { id: String, title: String },
//! }
//!
//! // Generated methods:
//! assert!(TodoAction::AddTodo { title: "test".into() }.is_command());
//! assert!(TodoAction::TodoAdded { id: "1".into(), title: "test".into() }.is_event());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Variant};

/// Derive macro for Action enums
///
/// Generates helper methods for action enums:
/// - `is_command()` - Returns true if this variant is a command
/// - `is_event()` - Returns true if this variant is an event
/// - `event_type()` - Returns the versioned event type name (e.g. `"TodoAdded.v1"`)
///
/// # Attributes
///
/// - `#[command]` - Mark a variant as a command
/// - `#[event]` - Mark a variant as an event
///
/// # Errors
///
/// This macro produces a compile error if:
/// - Applied to a non-enum type
/// - A variant has both `#[command]` and `#[event]` attributes
#[proc_macro_derive(Action, attributes(command, event))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut command_variants = Vec::new();
    let mut event_variants = Vec::new();

    for variant in &data_enum.variants {
        let is_command = has_attribute(&variant.attrs, "command");
        let is_event = has_attribute(&variant.attrs, "event");

        if is_command && is_event {
            return syn::Error::new_spanned(variant, "Variant cannot be both #[command] and #[event]")
                .to_compile_error()
                .into();
        }

        if is_command {
            command_variants.push(variant);
        }

        if is_event {
            event_variants.push(variant);
        }
    }

    let is_command_arms = command_variants.iter().map(|variant| {
        let pattern = variant_pattern(variant);
        quote! { #pattern => true, }
    });

    let is_event_arms = event_variants.iter().map(|variant| {
        let pattern = variant_pattern(variant);
        quote! { #pattern => true, }
    });

    let event_type_arms = event_variants.iter().map(|variant| {
        let pattern = variant_pattern(variant);
        let type_name = format!("{}.v1", variant.ident);
        quote! { #pattern => #type_name, }
    });

    let expanded = quote! {
        impl #name {
            /// Returns true if this action is a command
            #[must_use]
            pub const fn is_command(&self) -> bool {
                match self {
                    #(#is_command_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action is an event
            #[must_use]
            pub const fn is_event(&self) -> bool {
                match self {
                    #(#is_event_arms)*
                    _ => false,
                }
            }

            /// Returns the event type name for logging and serialization
            ///
            /// Only events have type names. Commands return "unknown".
            #[must_use]
            pub const fn event_type(&self) -> &'static str {
                match self {
                    #(#event_type_arms)*
                    _ => "unknown",
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Derive macro for State structs
///
/// For a field marked `#[revision]` (an unsigned integer counting applied
/// changes) this generates:
/// - `revision()` - Returns the current revision
/// - `bump_revision()` - Advances the revision by one (wrapping)
///
/// Structs without a `#[revision]` field get no extra items.
///
/// # Errors
///
/// This macro produces a compile error if:
/// - Applied to a non-struct type
/// - More than one field is marked `#[revision]`
///
/// # Example
///
/// ```ignore
/// use todo_store_macros::State;
///
/// #[derive(State, Clone, Debug, Default)]
/// struct TodoState {
///     pub todos: Vec<Todo>,
///     #[revision]
///     revision: u64,
/// }
/// ```
#[proc_macro_derive(State, attributes(revision))]
pub fn derive_state(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Struct(data_struct) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(State)] can only be used on structs")
            .to_compile_error()
            .into();
    };

    let mut revision_fields = data_struct
        .fields
        .iter()
        .filter(|field| has_attribute(&field.attrs, "revision"));

    let Some(field) = revision_fields.next() else {
        return TokenStream::new();
    };

    if let Some(extra) = revision_fields.next() {
        return syn::Error::new_spanned(extra, "Only one field can be marked #[revision]")
            .to_compile_error()
            .into();
    }

    let Some(field_name) = field.ident.as_ref() else {
        return syn::Error::new_spanned(field, "#[revision] requires a named field")
            .to_compile_error()
            .into();
    };
    let field_ty = &field.ty;

    let expanded = quote! {
        impl #name {
            /// Number of changes applied to this state so far
            #[must_use]
            pub const fn revision(&self) -> #field_ty {
                self.#field_name
            }

            /// Record that one more change has been applied
            pub fn bump_revision(&mut self) {
                self.#field_name = self.#field_name.wrapping_add(1);
            }
        }
    };

    TokenStream::from(expanded)
}

/// Match pattern covering every shape of `variant`
fn variant_pattern(variant: &Variant) -> proc_macro2::TokenStream {
    let ident = &variant.ident;
    match &variant.fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
