//! `#[derive(Contract)]` expansion.
//!
//! A record gets four impls: `Contract` describes its shape to the schema
//! compiler, `StructView` and `Reflect` hand the encoder borrowed members,
//! and `FromValue` rebuilds it from what the binder produced. An unbound
//! record is rebuilt member by member, so it is only missing if one of its
//! members is.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Data, DeriveInput, Fields};

use crate::parse::ContractField;

/// Expands `#[derive(Contract)]`.
pub fn expand_contract(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let fields = named_fields(&input)?;

    let name = &input.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let (kept, skipped): (Vec<_>, Vec<_>) = fields.iter().partition(|f| !f.attrs.skip);

    let descriptors = kept.iter().map(|field| describe_field(field));

    let bindings: Vec<String> = kept.iter().map(|f| f.binding()).collect();
    let idents: Vec<_> = kept.iter().map(|f| &f.ident).collect();
    let skipped_idents = skipped.iter().map(|f| &f.ident);

    Ok(quote! {
        impl #impl_generics ::kanon_core::Contract for #name #ty_generics #where_clause {
            fn describe() -> ::kanon_core::TypeDesc {
                ::kanon_core::TypeDesc::record(#type_name, vec![#(#descriptors),*])
            }
        }

        impl #impl_generics ::kanon_core::StructView for #name #ty_generics #where_clause {
            fn field(&self, binding: &str) -> Option<&dyn ::kanon_core::Reflect> {
                match binding {
                    #(#bindings => Some(&self.#idents),)*
                    _ => None,
                }
            }

            fn fields(&self) -> Vec<(&str, &dyn ::kanon_core::Reflect)> {
                vec![#((#bindings, &self.#idents as &dyn ::kanon_core::Reflect)),*]
            }
        }

        impl #impl_generics ::kanon_core::Reflect for #name #ty_generics #where_clause {
            fn reflect(&self) -> ::kanon_core::View<'_> {
                ::kanon_core::View::Struct(self)
            }
        }

        impl #impl_generics ::kanon_core::FromValue for #name #ty_generics #where_clause {
            fn from_value(
                value: ::kanon_core::Value,
            ) -> ::core::result::Result<Self, ::kanon_core::ValueError> {
                let mut members = ::kanon_core::from_value::into_members(value)?;
                Ok(Self {
                    #(#idents: ::kanon_core::from_value::take_member(&mut members, #bindings)?,)*
                    #(#skipped_idents: ::core::default::Default::default(),)*
                })
            }

            fn from_absent() -> ::core::result::Result<Self, ::kanon_core::ValueError> {
                Self::from_value(::kanon_core::Value::Null)
            }
        }
    })
}

fn named_fields(input: &DeriveInput) -> syn::Result<Vec<ContractField>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().map(ContractField::from_field).collect(),
            other => Err(syn::Error::new(
                other.span(),
                "Contract can only be derived for structs with named fields",
            )),
        },
        _ => Err(syn::Error::new(
            input.ident.span(),
            "Contract can only be derived for structs",
        )),
    }
}

fn describe_field(field: &ContractField) -> TokenStream {
    let ty = &field.ty;
    let binding = field.binding();
    let attrs = &field.attrs;

    let mut calls = Vec::new();
    if let Some(wire) = &attrs.wire {
        calls.push(quote! { .wire(#wire) });
    }
    if attrs.omit_empty {
        calls.push(quote! { .omit_empty() });
    }
    if let Some(rules) = &attrs.rules {
        calls.push(quote! { .rules(#rules) });
    }
    if let Some(default) = &attrs.default {
        calls.push(quote! { .default_literal(#default) });
    }
    if let Some(layout) = &attrs.layout {
        calls.push(quote! { .layout(#layout) });
    }
    if let Some(spec) = &attrs.spec {
        calls.push(quote! { .spec(#spec) });
    }
    for (name, value) in &attrs.extra {
        calls.push(quote! { .annotate(#name, #value) });
    }

    quote! {
        ::kanon_core::FieldDesc::of::<#ty>(#binding) #(#calls)*
    }
}
