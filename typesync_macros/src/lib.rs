//! Procedural macros for typesync
//!
//! This crate provides the `TypeSync` derive macro, which describes a struct
//! or a unit-only enum so it can be added to a `typesync::ModelRegistry`.
//!
//! ```ignore
//! #[derive(Serialize, TypeSync)]
//! #[serde(rename_all = "camelCase")]
//! pub struct User {
//!     /// Login name
//!     pub user_name: String,
//!     pub role: Role,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{
    parse_macro_input, Attribute, Data, DataEnum, DeriveInput, Expr, Fields, FieldsNamed, Lit,
    LitStr, Meta,
};

/// Derive `TypeSyncModel` for structs with named fields and `TypeSyncEnum`
/// for enums whose variants carry no data.
///
/// `#[typesync(name = "...")]` overrides the exported name.
#[proc_macro_derive(TypeSync, attributes(typesync))]
pub fn derive_type_sync(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => expand_model(&input, fields),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                "TypeSync only supports structs with named fields",
            )),
        },
        Data::Enum(data) => expand_enum(&input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "TypeSync does not support unions",
        )),
    };

    expanded
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_model(input: &DeriveInput, fields: &FieldsNamed) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let name = exported_name(input)?;
    let attributes = attribute_strings(&input.attrs);

    let descriptors = fields.named.iter().map(|field| {
        let field_name = field
            .ident
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let rust_type = field.ty.to_token_stream().to_string();
        let docs = doc_lines(&field.attrs);
        let attributes = attribute_strings(&field.attrs);

        quote! {
            ::typesync::models::FieldDescriptor {
                name: #field_name.to_string(),
                rust_type: #rust_type.to_string(),
                docs: vec![#(#docs.to_string()),*],
                attributes: vec![#(#attributes.to_string()),*],
            }
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::typesync::models::TypeSyncModel for #ident #ty_generics #where_clause {
            fn describe() -> ::typesync::models::ModelDescriptor {
                ::typesync::models::ModelDescriptor {
                    name: #name.to_string(),
                    module_path: ::std::module_path!().to_string(),
                    attributes: vec![#(#attributes.to_string()),*],
                    fields: vec![#(#descriptors),*],
                }
            }
        }
    })
}

fn expand_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    if let Some(variant) = data
        .variants
        .iter()
        .find(|variant| !matches!(variant.fields, Fields::Unit))
    {
        return Err(syn::Error::new_spanned(
            variant,
            "TypeSync only supports enums whose variants carry no data",
        ));
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let name = exported_name(input)?;
    let attributes = attribute_strings(&input.attrs);

    let variants = data.variants.iter().map(|variant| {
        let variant_name = variant.ident.to_string();
        let attributes = attribute_strings(&variant.attrs);
        quote! {
            (#variant_name.to_string(), vec![#(#attributes.to_string()),*])
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::typesync::models::TypeSyncEnum for #ident #ty_generics #where_clause {
            fn describe() -> ::typesync::models::EnumDescriptor {
                ::typesync::models::EnumDescriptor {
                    name: #name.to_string(),
                    attributes: vec![#(#attributes.to_string()),*],
                    variants: vec![#(#variants),*],
                }
            }
        }
    })
}

/// The type name, or the value of `#[typesync(name = "...")]`
fn exported_name(input: &DeriveInput) -> syn::Result<String> {
    let mut name = input.ident.to_string();

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("typesync")) {
        if matches!(attr.meta, Meta::Path(_)) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = value.value();
                Ok(())
            } else {
                Err(meta.error("unsupported typesync attribute, expected `name`"))
            }
        })?;
    }

    Ok(name)
}

/// Contents of `///` comments
fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) if nv.path.is_ident("doc") => match &nv.value {
                Expr::Lit(expr) => match &expr.lit {
                    Lit::Str(text) => Some(text.value()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// Non-doc attributes rendered without `#[ ]`
fn attribute_strings(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("doc"))
        .map(|attr| attr.meta.to_token_stream().to_string())
        .collect()
}
