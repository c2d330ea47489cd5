use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::{Expr, Fields, ItemStruct, Meta, Path};

/// Expands the `#[contract]` attribute macro.
///
/// The unit struct becomes a handle around a `Record`; the schema function named by
/// `schema = ...` runs once, the first time the type is used.
pub fn expand_contract(args: TokenStream, input: ItemStruct) -> TokenStream {
    let schema_fn = match parse_schema_path(args) {
        Ok(path) => path,
        Err(err) => return err,
    };
    if !matches!(input.fields, Fields::Unit) {
        return syn::Error::new_spanned(
            &input.ident,
            "contract can only be applied to unit structs; declare fields in the schema function",
        )
        .to_compile_error();
    }
    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "contract types cannot be generic")
            .to_compile_error();
    }

    let name = &input.ident;
    let vis = &input.vis;
    let attrs = &input.attrs;

    quote! {
        #(#attrs)*
        #[derive(Clone, PartialEq)]
        #vis struct #name {
            record: ::lazycontract::Record,
        }

        #[automatically_derived]
        impl ::lazycontract::Contract for #name {
            fn schema() -> ::core::result::Result<
                ::std::sync::Arc<::lazycontract::Schema>,
                ::lazycontract::ContractError,
            > {
                static SCHEMA: ::lazycontract::SchemaCell = ::lazycontract::SchemaCell::new();
                SCHEMA.get_or_register(#schema_fn)
            }

            fn from_record(record: ::lazycontract::Record) -> Self {
                Self { record }
            }

            fn record(&self) -> &::lazycontract::Record {
                &self.record
            }

            fn record_mut(&mut self) -> &mut ::lazycontract::Record {
                &mut self.record
            }
        }

        #[automatically_derived]
        impl ::core::fmt::Debug for #name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Debug::fmt(&self.record, f)
            }
        }

        #[automatically_derived]
        impl ::lazycontract::serde::Serialize for #name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::lazycontract::serde::Serializer,
            {
                ::lazycontract::serde::Serialize::serialize(&self.record, serializer)
            }
        }

        #[automatically_derived]
        impl<'de> ::lazycontract::serde::Deserialize<'de> for #name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::lazycontract::serde::Deserializer<'de>,
            {
                let document =
                    <::lazycontract::Value as ::lazycontract::serde::Deserialize>::deserialize(deserializer)?;
                <Self as ::lazycontract::Contract>::from_value(document)
                    .map_err(<D::Error as ::lazycontract::serde::de::Error>::custom)
            }
        }
    }
}

fn parse_schema_path(args: TokenStream) -> Result<Path, TokenStream> {
    let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
    let metas = parser.parse2(args).map_err(|err| err.to_compile_error())?;

    let mut schema = None;
    for meta in metas {
        let Meta::NameValue(name_value) = meta else {
            return Err(syn::Error::new_spanned(meta, "Expected `schema = path::to::fn`")
                .to_compile_error());
        };
        if !name_value.path.is_ident("schema") {
            return Err(syn::Error::new_spanned(
                name_value.path,
                "Only `schema = path::to::fn` is supported",
            )
            .to_compile_error());
        }
        if schema.is_some() {
            return Err(syn::Error::new_spanned(name_value, "Duplicate `schema` argument")
                .to_compile_error());
        }
        let Expr::Path(expr) = name_value.value else {
            return Err(syn::Error::new_spanned(
                name_value.value,
                "`schema` must name a function returning Result<Schema, ContractError>",
            )
            .to_compile_error());
        };
        schema = Some(expr.path);
    }

    schema.ok_or_else(|| {
        syn::Error::new(proc_macro2::Span::call_site(), "Missing `schema = path::to::fn` argument")
            .to_compile_error()
    })
}
