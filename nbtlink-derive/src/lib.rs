//! # nbtlink Derive Macros
//!
//! Provides `#[derive(Linked)]`, which implements `nbtlink::link::Linked` by
//! emitting a member table (`Layout`) with one set of accessor functions per
//! bound member.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Fields, GenericArgument, LitStr, Path, PathArguments, Type,
    Visibility, parse_macro_input,
};

/// Derives `Linked` for a struct with named fields.
///
/// Container attributes: `#[nbtlink(auto)]` (bind every `pub` member),
/// `#[nbtlink(inherit)]` (flatten `base` members), `#[nbtlink(factory = "path")]`
/// (constructor used for absent instances, `Default::default` otherwise).
///
/// Member attributes: `field`, `composite`, `base`, `skip`, `key = "..."`.
#[proc_macro_derive(Linked, attributes(nbtlink))]
pub fn derive_linked(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(e) => e.to_compile_error().into(),
    }
}

// --- Attribute Model ---

#[derive(Default)]
struct ContainerAttrs {
    auto: bool,
    inherit: bool,
    factory: Option<Path>,
}

#[derive(Clone, Copy, PartialEq)]
enum RoleAttr {
    Auto,
    Field,
    Composite,
    Base,
}

struct MemberAttrs {
    role: RoleAttr,
    skip: bool,
    key: Option<String>,
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("nbtlink") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("auto") {
                out.auto = true;
                return Ok(());
            }
            if meta.path.is_ident("inherit") {
                out.inherit = true;
                return Ok(());
            }
            if meta.path.is_ident("factory") {
                let s: LitStr = meta.value()?.parse()?;
                out.factory = Some(s.parse()?);
                return Ok(());
            }
            Err(meta.error(
                "Unknown nbtlink container attribute. Supported: auto, inherit, factory",
            ))
        })?;
    }
    Ok(out)
}

fn parse_member_attrs(attrs: &[Attribute]) -> syn::Result<MemberAttrs> {
    let mut out = MemberAttrs {
        role: RoleAttr::Auto,
        skip: false,
        key: None,
    };
    for attr in attrs {
        if !attr.path().is_ident("nbtlink") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let role = if meta.path.is_ident("field") {
                RoleAttr::Field
            } else if meta.path.is_ident("composite") {
                RoleAttr::Composite
            } else if meta.path.is_ident("base") {
                RoleAttr::Base
            } else if meta.path.is_ident("skip") {
                out.skip = true;
                return Ok(());
            } else if meta.path.is_ident("key") {
                let s: LitStr = meta.value()?.parse()?;
                out.key = Some(s.value());
                return Ok(());
            } else {
                return Err(meta.error(
                    "Unknown nbtlink member attribute. Supported: field, composite, base, skip, key",
                ));
            };
            if out.role != RoleAttr::Auto {
                return Err(meta.error("A member can only have one of field, composite, base"));
            }
            out.role = role;
            Ok(())
        })?;
    }
    Ok(out)
}

/// `Option<U>` → `U`, matched on the last path segment.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

// --- Generator ---

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Linked cannot be derived for generic types; build a Linker by hand instead",
        ));
    }

    let fields = match &input.data {
        Data::Struct(ds) => match &ds.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    name.span(),
                    "Linked only supports structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new(name.span(), "Linked only supports structs")),
    };

    let container = parse_container_attrs(&input.attrs)?;
    let mut members = Vec::new();

    for field in fields {
        let attrs = parse_member_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        members.push(generate_member(name, ident, &field.ty, &field.vis, &attrs)?);
    }

    let mode = if container.auto {
        quote! { nbtlink::link::LinkMode::Automatic }
    } else {
        quote! { nbtlink::link::LinkMode::Manual }
    };
    let inherit = container.inherit;
    let factory = match &container.factory {
        Some(path) => quote! { #path() },
        None => quote! { ::core::default::Default::default() },
    };

    Ok(quote! {
        impl nbtlink::link::Linked for #name {
            fn layout() -> nbtlink::link::Layout {
                nbtlink::link::Layout {
                    type_name: nbtlink::rt::type_name::<#name>(),
                    type_id: nbtlink::rt::TypeId::of::<#name>(),
                    mode: #mode,
                    inherit: #inherit,
                    members: ::std::vec![#(#members),*],
                }
            }

            fn create() -> Self {
                #factory
            }
        }
    })
}

fn generate_member(
    host: &syn::Ident,
    ident: &syn::Ident,
    ty: &Type,
    vis: &Visibility,
    attrs: &MemberAttrs,
) -> syn::Result<proc_macro2::TokenStream> {
    let member_name = ident.to_string();
    let key = attrs.key.clone().unwrap_or_else(|| member_name.clone());
    let public = matches!(vis, Visibility::Public(_));
    let inner = option_inner(ty);
    let optional = inner.is_some();
    let target = inner.unwrap_or(ty);

    if optional && attrs.role == RoleAttr::Base {
        return Err(syn::Error::new_spanned(ty, "A base member cannot be optional"));
    }

    let role = match attrs.role {
        RoleAttr::Auto => quote! { nbtlink::link::Role::Auto },
        RoleAttr::Field => quote! { nbtlink::link::Role::Field },
        RoleAttr::Composite => quote! { nbtlink::link::Role::Composite },
        RoleAttr::Base => quote! { nbtlink::link::Role::Base },
    };

    let get_fn = format_ident!("__nbtlink_get_{}", ident);
    let get_mut_fn = format_ident!("__nbtlink_get_mut_{}", ident);
    let fill_fn = format_ident!("__nbtlink_fill_{}", ident);

    let accessors = if optional {
        quote! {
            fn #get_fn(any: &dyn nbtlink::rt::Any) -> Option<&dyn nbtlink::rt::Any> {
                any.downcast_ref::<#host>()
                    .and_then(|host| host.#ident.as_ref())
                    .map(|member| member as &dyn nbtlink::rt::Any)
            }
            fn #get_mut_fn(any: &mut dyn nbtlink::rt::Any) -> Option<&mut dyn nbtlink::rt::Any> {
                any.downcast_mut::<#host>()
                    .and_then(|host| host.#ident.as_mut())
                    .map(|member| member as &mut dyn nbtlink::rt::Any)
            }
            fn #fill_fn(any: &mut dyn nbtlink::rt::Any, value: Box<dyn nbtlink::rt::Any>) -> bool {
                match (any.downcast_mut::<#host>(), value.downcast::<#target>()) {
                    (Some(host), Ok(value)) => {
                        host.#ident = Some(*value);
                        true
                    }
                    _ => false,
                }
            }
        }
    } else {
        quote! {
            fn #get_fn(any: &dyn nbtlink::rt::Any) -> Option<&dyn nbtlink::rt::Any> {
                any.downcast_ref::<#host>().map(|host| &host.#ident as &dyn nbtlink::rt::Any)
            }
            fn #get_mut_fn(any: &mut dyn nbtlink::rt::Any) -> Option<&mut dyn nbtlink::rt::Any> {
                any.downcast_mut::<#host>()
                    .map(|host| &mut host.#ident as &mut dyn nbtlink::rt::Any)
            }
        }
    };

    let fill = if optional {
        quote! { Some(#fill_fn) }
    } else {
        quote! { None }
    };
    let layout = if attrs.role == RoleAttr::Base {
        quote! { Some(<#target as nbtlink::link::Linked>::layout) }
    } else {
        quote! { None }
    };

    Ok(quote! {
        {
            #accessors
            nbtlink::link::Member {
                name: #member_name,
                key: #key,
                role: #role,
                public: #public,
                optional: #optional,
                type_id: nbtlink::rt::TypeId::of::<#target>(),
                type_name: nbtlink::rt::type_name::<#target>(),
                get: #get_fn,
                get_mut: #get_mut_fn,
                fill: #fill,
                layout: #layout,
            }
        }
    })
}
