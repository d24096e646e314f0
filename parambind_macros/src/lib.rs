use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Expr, ExprLit, Fields, Ident, Lit, LitStr, Meta, Type,
    Visibility,
};

enum Role {
    /// `#[param("...")]` or bare `#[param]`
    Value(String),
    /// `#[param(flatten)]`
    Flatten,
    /// no `#[param]`
    Skipped,
}

struct FieldDef {
    ident: Ident,
    ty: Type,
    role: Role,
    regexp: Option<String>,
    err: Option<String>,
    exported: bool,
}

impl FieldDef {
    /// Bound fields: annotated and not `-`
    fn is_bound(&self) -> bool {
        matches!(&self.role, Role::Value(tag) if tag.trim() != "-")
    }

    /// Sub-key name for nested addressing: `<name:...>` or the field name.
    fn wire_name(&self) -> String {
        if let Role::Value(tag) = &self.role {
            if let Some(name) = tag_name(tag) {
                return name;
            }
        }
        self.ident.to_string()
    }
}

/// Value of the `<name:...>` token, if any.
fn tag_name(tag: &str) -> Option<String> {
    let mut rest = tag;
    while let Some(open) = rest.find('<') {
        rest = &rest[open + 1..];
        let close = rest.find('>')?;
        let token = &rest[..close];
        if let Some((key, value)) = token.split_once(':') {
            if key.trim() == "name" && !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }
        rest = &rest[close + 1..];
    }
    None
}

fn string_arg(attr: &syn::Attribute) -> syn::Result<String> {
    match &attr.meta {
        Meta::NameValue(nv) => match &nv.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(s), ..
            }) => Ok(s.value()),
            other => Err(syn::Error::new_spanned(other, "expected a string literal")),
        },
        _ => attr.parse_args::<LitStr>().map(|s| s.value()),
    }
}

fn parse_field(field: &syn::Field) -> syn::Result<FieldDef> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "Bindable requires named fields"))?;
    let mut role = Role::Skipped;
    let mut regexp = None;
    let mut err = None;

    for attr in &field.attrs {
        if attr.path().is_ident("param") {
            role = match &attr.meta {
                Meta::Path(_) => Role::Value(String::new()),
                Meta::List(list) => {
                    if let Ok(lit) = list.parse_args::<LitStr>() {
                        Role::Value(lit.value())
                    } else {
                        let flag: Ident = list.parse_args()?;
                        if flag != "flatten" {
                            return Err(syn::Error::new(
                                flag.span(),
                                "expected a tag string or `flatten`",
                            ));
                        }
                        Role::Flatten
                    }
                }
                Meta::NameValue(_) => Role::Value(string_arg(attr)?),
            };
        } else if attr.path().is_ident("regexp") {
            regexp = Some(string_arg(attr)?);
        } else if attr.path().is_ident("err") {
            err = Some(string_arg(attr)?);
        }
    }

    Ok(FieldDef {
        ident,
        ty: field.ty.clone(),
        role,
        regexp,
        err,
        exported: matches!(field.vis, Visibility::Public(_)),
    })
}

fn opt_str(value: &Option<String>) -> TokenStream2 {
    match value {
        Some(s) => quote! { ::core::option::Option::Some(#s) },
        None => quote! { ::core::option::Option::None },
    }
}

/// Derive `Bindable` and `FromWire` for a record with named fields.
///
/// Field attributes:
/// - `#[param("<in:query> <required> ...")]`: the binding tag
/// - `#[param(flatten)]`: splice in a sub-record's fields
/// - `#[regexp("...")]`: full-match pattern
/// - `#[err("...")]`: custom error text
#[proc_macro_derive(Bindable, attributes(param, regexp, err))]
pub fn derive_bindable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .map(parse_field)
                .collect::<syn::Result<Vec<_>>>()?,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Bindable can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Bindable can only be derived for structs",
            ))
        }
    };

    let shapes = fields.iter().map(|f| {
        let fname = f.ident.to_string();
        let ty = &f.ty;
        let (tag, kind) = match &f.role {
            Role::Value(tag) if f.is_bound() => (
                quote! { ::core::option::Option::Some(#tag) },
                quote! { ::parambind::FieldKind::Value(<#ty as ::parambind::FromWire>::wire_kind()) },
            ),
            Role::Value(tag) => (
                quote! { ::core::option::Option::Some(#tag) },
                quote! { ::parambind::FieldKind::Skipped },
            ),
            Role::Flatten => (
                quote! { ::core::option::Option::None },
                quote! { ::parambind::FieldKind::Flatten(<#ty as ::parambind::Bindable>::record_shape) },
            ),
            Role::Skipped => (
                quote! { ::core::option::Option::None },
                quote! { ::parambind::FieldKind::Skipped },
            ),
        };
        let regexp = opt_str(&f.regexp);
        let err = opt_str(&f.err);
        let exported = f.exported;
        quote! {
            ::parambind::FieldShape {
                name: #fname,
                tag: #tag,
                regexp: #regexp,
                err: #err,
                exported: #exported,
                kind: #kind,
            }
        }
    });

    let mut mut_arms = Vec::new();
    let mut ref_arms = Vec::new();
    let mut handle_pushes = Vec::new();
    let mut keyed_binds = Vec::new();
    let mut examples = Vec::new();

    for (index, f) in fields.iter().enumerate() {
        let ident = &f.ident;
        let ty = &f.ty;
        match &f.role {
            Role::Flatten => {
                mut_arms.push(quote! {
                    [#index, rest @ ..] => ::parambind::Bindable::field_mut(&mut self.#ident, rest),
                });
                ref_arms.push(quote! {
                    [#index, rest @ ..] => ::parambind::Bindable::field_ref(&self.#ident, rest),
                });
                handle_pushes.push(quote! {
                    handles.extend(::parambind::Bindable::field_handles(&mut self.#ident));
                });
                keyed_binds.push(quote! {
                    if let ::core::option::Option::Some(value) =
                        <#ty as ::parambind::FromWire>::from_keyed(src, key, conv)?
                    {
                        out.#ident = value;
                    }
                });
            }
            Role::Value(_) if f.is_bound() => {
                let wire = f.wire_name();
                mut_arms.push(quote! {
                    [#index] => ::core::option::Option::Some(&mut self.#ident),
                });
                ref_arms.push(quote! {
                    [#index] => ::core::option::Option::Some(&self.#ident),
                });
                handle_pushes.push(quote! {
                    handles.push(&mut self.#ident);
                });
                keyed_binds.push(quote! {
                    ::parambind::__private::bind_record_field(src, key, #wire, conv, &mut out.#ident)?;
                });
                examples.push(quote! {
                    map.insert(
                        ::std::string::String::from(#wire),
                        ::parambind::FromWire::example(&self.#ident),
                    );
                });
            }
            _ => {}
        }
    }

    let expanded = quote! {
        impl #impl_generics ::parambind::Bindable for #name #ty_generics #where_clause {
            fn record_shape() -> ::parambind::RecordShape {
                ::parambind::RecordShape {
                    type_name: #type_name,
                    fields: ::std::vec![#(#shapes),*],
                }
            }

            fn field_mut(
                &mut self,
                path: &[usize],
            ) -> ::core::option::Option<&mut dyn ::parambind::FieldValue> {
                match path {
                    #(#mut_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_ref(
                &self,
                path: &[usize],
            ) -> ::core::option::Option<&dyn ::parambind::FieldValue> {
                match path {
                    #(#ref_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_handles(&mut self) -> ::std::vec::Vec<&mut dyn ::parambind::FieldValue> {
                let mut handles: ::std::vec::Vec<&mut dyn ::parambind::FieldValue> =
                    ::std::vec::Vec::new();
                #(#handle_pushes)*
                handles
            }
        }

        impl #impl_generics ::parambind::FromWire for #name #ty_generics #where_clause {
            fn wire_kind() -> ::parambind::WireKind {
                ::parambind::WireKind::Record(#type_name)
            }

            #[allow(unused_variables, unused_mut)]
            fn from_keyed(
                src: &::parambind::KeySource<'_>,
                key: &str,
                conv: ::parambind::Conversion,
            ) -> ::core::result::Result<
                ::core::option::Option<Self>,
                ::parambind::ConvertError,
            > {
                if !src.has_children(key) {
                    return ::core::result::Result::Ok(::core::option::Option::None);
                }
                let mut out = <Self as ::core::default::Default>::default();
                #(#keyed_binds)*
                ::core::result::Result::Ok(::core::option::Option::Some(out))
            }

            fn inspect(&self) -> ::parambind::Inspect<'_> {
                ::parambind::Inspect::Opaque { zero: false }
            }

            #[allow(unused_mut)]
            fn example(&self) -> ::parambind::__private::Value {
                let mut map = ::parambind::__private::Map::new();
                #(#examples)*
                ::parambind::__private::Value::Object(map)
            }
        }
    };
    Ok(expanded)
}
