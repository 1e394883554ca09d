extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use std::collections::HashSet;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DeriveInput, Fields, GenericArgument,
    PathArguments, Type, WherePredicate,
};

/// Attributes parsed from `#[chunk(...)]` annotations on fields and variants
///
/// # Fields
///
/// * `rename` - Key written instead of the Rust identifier
/// * `skip` - Whether to leave this field out of the encoding
#[derive(Debug, Clone, Default)]
struct ChunkAttributes {
    rename: Option<String>,
    skip: bool,
}

/// Extract and parse `#[chunk(...)]` attribute values
///
/// # Supported Attributes
///
/// * `#[chunk(rename = "name")]` - Use the given string as the map key or variant name
/// * `#[chunk(skip)]` - Do not encode this field
///
/// Attributes can be combined: `#[chunk(rename = "id", skip)]`
fn get_chunk_attributes(attrs: &[Attribute]) -> syn::Result<ChunkAttributes> {
    let mut parsed = ChunkAttributes::default();
    for attr in attrs {
        if !attr.path().is_ident("chunk") {
            continue;
        }
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<syn::Ident>()?;
                if ident == "rename" {
                    input.parse::<syn::Token![=]>()?;
                    let lit_str = input.parse::<syn::LitStr>()?;
                    parsed.rename = Some(lit_str.value());
                } else if ident == "skip" {
                    parsed.skip = true;
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Unknown attribute: {}", ident),
                    ));
                }

                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

/// Extract the inner type `T` from `Option<T>`
///
/// Returns `None` if the type is not an `Option`.
fn extract_inner_type_from_option(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner_ty)) => Some(inner_ty),
        _ => None,
    }
}

/// Code that pushes encoded `(key, value)` chunk pairs for a set of named fields onto
/// `entries`. `access` maps a field identifier to an expression referencing the field.
fn named_entries(
    fields: &syn::FieldsNamed,
    access: impl Fn(&syn::Ident) -> TokenStream2,
    bounds: &mut Vec<WherePredicate>,
) -> syn::Result<Vec<TokenStream2>> {
    let mut pushes = Vec::new();
    let mut used_keys = HashSet::new();
    for f in &fields.named {
        let Some(ident) = f.ident.as_ref() else {
            continue;
        };
        let attrs = get_chunk_attributes(&f.attrs)?;
        if attrs.skip {
            continue;
        }
        let key = attrs.rename.unwrap_or_else(|| ident.to_string());
        if !used_keys.insert(key.clone()) {
            return Err(syn::Error::new_spanned(
                f,
                format!("Key \"{}\" is used by more than one field", key),
            ));
        }
        let field = access(ident);
        if let Some(inner) = extract_inner_type_from_option(&f.ty) {
            bounds.push(parse_quote!(#inner: canonical_chunk::Encoder));
            pushes.push(quote! {
                if let ::std::option::Option::Some(val) = #field {
                    entries.push((
                        canonical_chunk::to_chunk(#key)?,
                        canonical_chunk::to_chunk(val)?,
                    ));
                }
            });
        } else {
            let ty = &f.ty;
            bounds.push(parse_quote!(#ty: canonical_chunk::Encoder));
            pushes.push(quote! {
                entries.push((
                    canonical_chunk::to_chunk(#key)?,
                    canonical_chunk::to_chunk(#field)?,
                ));
            });
        }
    }
    Ok(pushes)
}

/// Code that pushes one encoded chunk per unnamed field onto `members`.
fn unnamed_members(
    fields: &syn::FieldsUnnamed,
    access: impl Fn(usize) -> TokenStream2,
    bounds: &mut Vec<WherePredicate>,
) -> syn::Result<Vec<TokenStream2>> {
    let mut pushes = Vec::new();
    for (i, f) in fields.unnamed.iter().enumerate() {
        if get_chunk_attributes(&f.attrs)?.skip {
            continue;
        }
        let ty = &f.ty;
        bounds.push(parse_quote!(#ty: canonical_chunk::Encoder));
        let field = access(i);
        pushes.push(quote! {
            members.push(canonical_chunk::to_chunk(#field)?);
        });
    }
    Ok(pushes)
}

fn expand_struct(
    data: &syn::DataStruct,
    bounds: &mut Vec<WherePredicate>,
) -> syn::Result<TokenStream2> {
    Ok(match &data.fields {
        Fields::Named(fields) => {
            let pushes = named_entries(fields, |ident| quote!(&self.#ident), bounds)?;
            quote! {
                #[allow(unused_mut)]
                let mut entries = ::std::vec::Vec::new();
                #(#pushes)*
                canonical_chunk::write_ordered_map(writer, entries)
            }
        }
        Fields::Unnamed(fields) => {
            let pushes = unnamed_members(
                fields,
                |i| {
                    let index = syn::Index::from(i);
                    quote!(&self.#index)
                },
                bounds,
            )?;
            quote! {
                #[allow(unused_mut)]
                let mut members = ::std::vec::Vec::new();
                #(#pushes)*
                canonical_chunk::write_ordered_sequence(writer, members)
            }
        }
        Fields::Unit => quote! {
            canonical_chunk::write_ordered_sequence(writer, ::std::vec::Vec::new())
        },
    })
}

fn expand_enum(
    data: &syn::DataEnum,
    bounds: &mut Vec<WherePredicate>,
) -> syn::Result<TokenStream2> {
    let mut arms = Vec::new();
    let mut used_names = HashSet::new();
    for variant in &data.variants {
        let ident = &variant.ident;
        let attrs = get_chunk_attributes(&variant.attrs)?;
        let name = attrs.rename.unwrap_or_else(|| ident.to_string());
        if !used_names.insert(name.clone()) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("Name \"{}\" is used by more than one variant", name),
            ));
        }
        let arm = match &variant.fields {
            Fields::Unit => quote! {
                Self::#ident => canonical_chunk::Encoder::encode(#name, writer),
            },
            Fields::Unnamed(fields) => {
                let bindings: Vec<_> = (0..fields.unnamed.len())
                    .map(|i| format_ident!("field_{}", i))
                    .collect();
                let pushes = unnamed_members(
                    fields,
                    |i| {
                        let binding = &bindings[i];
                        quote!(#binding)
                    },
                    bounds,
                )?;
                quote! {
                    #[allow(unused_variables)]
                    Self::#ident(#(#bindings),*) => {
                        #[allow(unused_mut)]
                        let mut members = ::std::vec::Vec::new();
                        #(#pushes)*
                        let mut payload = canonical_chunk::BytesMut::new();
                        canonical_chunk::write_ordered_sequence(&mut payload, members)?;
                        canonical_chunk::write_ordered_map(
                            writer,
                            ::std::vec![(canonical_chunk::to_chunk(#name)?, payload.freeze())],
                        )
                    }
                }
            }
            Fields::Named(fields) => {
                let field_idents: Vec<_> =
                    fields.named.iter().filter_map(|f| f.ident.as_ref()).collect();
                let pushes = named_entries(fields, |ident| quote!(#ident), bounds)?;
                quote! {
                    #[allow(unused_variables)]
                    Self::#ident { #(#field_idents),* } => {
                        #[allow(unused_mut)]
                        let mut entries = ::std::vec::Vec::new();
                        #(#pushes)*
                        let mut payload = canonical_chunk::BytesMut::new();
                        canonical_chunk::write_ordered_map(&mut payload, entries)?;
                        canonical_chunk::write_ordered_map(
                            writer,
                            ::std::vec![(canonical_chunk::to_chunk(#name)?, payload.freeze())],
                        )
                    }
                }
            }
        };
        arms.push(arm);
    }
    if arms.is_empty() {
        return Ok(quote! {
            let _ = writer;
            match *self {}
        });
    }
    Ok(quote! {
        match self {
            #(#arms)*
        }
    })
}

/// Derive macro for implementing the `Encoder` trait
///
/// - Named structs encode as an Ordered Map from field name (Text) to field value, in
///   declaration order. `Option` fields are left out when `None`.
/// - Tuple structs encode as an Ordered Sequence of their fields.
/// - Unit structs encode as an empty Ordered Sequence.
/// - Enum unit variants encode as the variant name (Text). Other variants encode as a
///   one-entry Ordered Map from the variant name to their fields, written as a struct
///   of the same shape would be.
///
/// # Supported Attributes
///
/// * `#[chunk(rename = "name")]` - Use another key for a field or name for a variant
/// * `#[chunk(skip)]` - Skip a field during encoding
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(Encode)]
/// struct User {
///     #[chunk(rename = "user_id")]
///     id: u64,
///     nickname: Option<String>,
///     #[chunk(skip)]
///     cached: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Encode, attributes(chunk))]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let mut bounds = Vec::new();

    let body = match &input.data {
        Data::Struct(s) => expand_struct(s, &mut bounds),
        Data::Enum(e) => expand_enum(e, &mut bounds),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Encode cannot be derived for unions",
        )),
    };
    let body = match body {
        Ok(body) => body,
        Err(e) => return e.to_compile_error().into(),
    };

    let mut generics = input.generics.clone();
    if !input.generics.params.is_empty() {
        generics.make_where_clause().predicates.extend(bounds);
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics canonical_chunk::Encoder for #name #ty_generics #where_clause {
            fn encode(&self, writer: &mut canonical_chunk::BytesMut) -> canonical_chunk::Result<()> {
                #body
            }
        }
    }
    .into()
}
