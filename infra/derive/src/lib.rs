#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the contract layer.
//! This crate provides attribute macros that remove the boilerplate of declaring contract
//! types and contract-aware error enums.
//!
//! ## Usage
//! Consumers normally reach these macros through the `lazycontract` crate, which re-exports
//! them; the generated code refers to `::lazycontract` paths.
//!
//! See each macro’s docstring for examples; they are `ignore`d to avoid compiling in this crate.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemStruct, parse_macro_input};

/// Attribute macro that turns a unit struct into a contract type.
///
/// # Injected Behaviors
///
/// * **Storage**: The struct gains a single private `Record` holding the validated field values.
/// * **Registration**: Implements `lazycontract::Contract`; the function given as
///   `schema = ...` is called exactly once, on first use, and its result is cached for the
///   lifetime of the process (a failure is cached too and reported on every access).
/// * **Derives**: `Clone`, `PartialEq` (structural equality over declared fields) and a
///   `Debug` impl that renders `TypeName { field: value, .. }`.
/// * **Serde**: `Serialize` through `Contract::to_map` and `Deserialize` through
///   `Contract::from_value`.
///
/// # Errors
/// Emits a compile-time error if the struct is not a unit struct, is generic, or the
/// `schema` argument is missing or duplicated.
///
/// # Example
///
/// ```rust,ignore
/// use lazycontract::prelude::*;
///
/// #[contract(schema = person_schema)]
/// pub struct Person;
///
/// fn person_schema() -> Result<Schema, ContractError> {
///     Schema::builder()
///         .name("Person")
///         .field("name", Property::builder(Text).required(true))
///         .build()
/// }
/// ```
#[proc_macro_attribute]
pub fn contract(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::contract::expand_contract(args.into(), input).into()
}

/// Attribute macro for defining error enums with optional context.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants holding a concrete
///   `source: T` (or a field marked `#[source]`/`#[from]`). Optional sources such as
///   `Option<Box<dyn Error + Send + Sync>>` are carried as causes without a conversion.
/// * **Internal Fallback**: Provides `From<&str>` and `From<String>` if an `Internal`
///   variant is present.
/// * **Formatting**: Emits a module-local `format_context` helper for display strings.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants only.
/// 2. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 3. Variants with a source must also carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use lazycontract_derive::contract_error;
/// use std::borrow::Cow;
///
/// #[contract_error]
/// pub enum LoadError {
///     #[error("Serde error{}: {source}", format_context(.context))]
///     Serde { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn parse(raw: &str) -> Result<serde_json::Value, LoadError> {
///     serde_json::from_str(raw).context("Parsing contract document")
/// }
/// ```
#[proc_macro_attribute]
pub fn contract_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
