use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote, quote_spanned, ToTokens};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, Type};

pub fn expand_derive_from_service_config(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let setters = config_setters(input)?;
    Ok(quote! {
        impl crate::config::FromServiceConfig for #name {
            fn from_config(
                config: &crate::config::ServiceConfig,
            ) -> Result<Self, crate::Error> {
                let mut base = Self::default();
                for key in config.parameters() {
                    match key.as_str() {
                        #setters
                        _ => log::warn!(
                            "unknown configuration parameter for {}: {}={:?}",
                            stringify!(#name),
                            key,
                            config.get_parameter(key)
                        ),
                    }
                }
                Ok(base)
            }
        }
    })
}

/// One match arm per field that isn't annotated with #[service_config(skip)]
fn config_setters(input: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => {
                return Ok(quote! {});
            }
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "FromServiceConfig requires named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "FromServiceConfig can only be derived for structs",
            ))
        }
    };

    let mut arms = Vec::new();
    for field in fields.iter().filter(|f| !skip_field(f)) {
        arms.push(generate_setter(field)?);
    }
    if arms.is_empty() {
        return Ok(quote! {});
    }
    Ok(quote! { #(#arms),* , })
}

fn skip_field(field: &Field) -> bool {
    field.attrs.iter().any(|attr| {
        attr.path().is_ident("service_config")
            && attr
                .parse_args::<Ident>()
                .map(|arg| arg == "skip")
                .unwrap_or(false)
    })
}

fn generate_setter(field: &Field) -> syn::Result<TokenStream> {
    let name = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
    let key = name.to_string();
    let (get_fn, conversion) = get_param_fn_ident(&field.ty)?;

    let assignment = match conversion {
        Conversion::None => quote_spanned! { field.span() => base.#name = val? },
        Conversion::Cast(ty) => quote_spanned! { field.span() => base.#name = val? as #ty },
        Conversion::Checked(ty) => quote_spanned! { field.span() =>
            base.#name = <#ty as ::std::convert::TryFrom<i64>>::try_from(val?).map_err(|_| {
                crate::Error::InvalidConfigurationValue(format!(
                    "{}.{} is out of range for {}: {:?}",
                    config.handler(),
                    #key,
                    stringify!(#ty),
                    config.get_parameter(#key)
                ))
            })?
        },
    };

    Ok(quote_spanned! {
        field.span() => #key => {
            if let Some(val) = config.#get_fn(#key) {
                #assignment
            }
        }
    })
}

/// How the value returned by the parameter getter becomes the field's type
enum Conversion<'a> {
    None,
    Cast(&'a Type),
    /// integers are range checked so e.g. a negative size is an error instead of wrapping
    Checked(&'a Type),
}

fn get_param_fn_ident(ty: &Type) -> syn::Result<(Ident, Conversion<'_>)> {
    let type_str = ty.to_token_stream().to_string();
    match type_str.as_ref() {
        "String" => Ok((format_ident!("get_parameter_as_string"), Conversion::None)),
        "bool" => Ok((format_ident!("get_parameter_as_bool"), Conversion::None)),
        "f32" | "f64" => Ok((format_ident!("get_parameter_as_f64"), Conversion::Cast(ty))),
        "u8" | "u16" | "u32" | "u64" | "usize" | "i8" | "i16" | "i32" | "i64" | "isize" => {
            Ok((format_ident!("get_parameter_as_i64"), Conversion::Checked(ty)))
        }
        _ => Err(syn::Error::new(
            ty.span(),
            format!("FromServiceConfig doesn't support fields of type {}", type_str),
        )),
    }
}
