use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, LitStr, Type};

/// Derive macro for transform option declarations.
///
/// Generates two methods on the annotated struct:
///
/// - `config_params() -> Vec<ConfigParam>`: option declarations (`describe_config`).
/// - `from_config(&ConfigValues) -> Result<Self, PluginError>`: reads typed values.
///
/// The struct must implement `Default` (defaults are used for non-required options).
/// The option name defaults to the field name with `_` replaced by `-`.
///
/// # Example
///
/// ```ignore
/// #[derive(ConfigParams, Default)]
/// pub struct MyConfig {
///     #[param(importance = "high", required, description = "Field to rewrite")]
///     pub target_field: String,
///
///     #[param(name = "max.depth", importance = "low", description = "Depth limit")]
///     pub max_depth: u64,
/// }
/// ```
///
/// Supported field types: `bool`, `i64`, `u64`, `String`.
#[proc_macro_derive(ConfigParams, attributes(param))]
pub fn derive_config_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

/// Parsed `#[param(...)]` attribute of one field.
struct ParamAttr {
    name: String,
    importance: TokenStream2,
    description: String,
    required: bool,
}

fn parse_param_attr(field_name: &Ident, field: &syn::Field) -> Result<ParamAttr, syn::Error> {
    let mut name: Option<String> = None;
    let mut importance: Option<String> = None;
    let mut description: Option<String> = None;
    let mut required = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("param") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
            } else if meta.path.is_ident("importance") {
                let value: LitStr = meta.value()?.parse()?;
                importance = Some(value.value());
            } else if meta.path.is_ident("description") {
                let value: LitStr = meta.value()?.parse()?;
                description = Some(value.value());
            } else if meta.path.is_ident("required") {
                required = true;
            } else {
                return Err(meta.error("unknown param attribute"));
            }
            Ok(())
        })?;
    }

    let description = description.ok_or_else(|| {
        syn::Error::new_spanned(field_name, "missing #[param(description = \"...\")]")
    })?;

    let importance = match importance.as_deref().unwrap_or("medium") {
        "high" => quote! { restruct_api::config::Importance::High },
        "medium" => quote! { restruct_api::config::Importance::Medium },
        "low" => quote! { restruct_api::config::Importance::Low },
        other => {
            return Err(syn::Error::new_spanned(
                field_name,
                format!("unknown importance '{other}' (expected 'high', 'medium' or 'low')"),
            ))
        }
    };

    Ok(ParamAttr {
        name: name.unwrap_or_else(|| field_name.to_string().replace('_', "-")),
        importance,
        description,
        required,
    })
}

/// Per-type code fragments: declared type, `ParamValue` variant, getter, and
/// the conversion from getter output to the field type.
struct TypeMapping {
    param_type: TokenStream2,
    variant: TokenStream2,
    getter: TokenStream2,
    to_field: TokenStream2,
    to_param: TokenStream2,
}

fn type_mapping(ty_name: &str) -> Option<TypeMapping> {
    let m = match ty_name {
        "bool" => TypeMapping {
            param_type: quote! { Bool },
            variant: quote! { Bool },
            getter: quote! { get_bool },
            to_field: quote! {},
            to_param: quote! {},
        },
        "i64" => TypeMapping {
            param_type: quote! { I64 },
            variant: quote! { I64 },
            getter: quote! { get_i64 },
            to_field: quote! {},
            to_param: quote! {},
        },
        "u64" => TypeMapping {
            param_type: quote! { U64 },
            variant: quote! { U64 },
            getter: quote! { get_u64 },
            to_field: quote! {},
            to_param: quote! {},
        },
        "String" => TypeMapping {
            param_type: quote! { Str },
            variant: quote! { Str },
            getter: quote! { get_str },
            to_field: quote! { .to_string() },
            to_param: quote! { .clone() },
        },
        _ => return None,
    };
    Some(m)
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "ConfigParams only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "ConfigParams only supports structs",
            ))
        }
    };

    let mut config_param_tokens = Vec::new();
    let mut from_config_tokens = Vec::new();

    for field in fields {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_ty = &field.ty;
        let attr = parse_param_attr(field_name, field)?;

        let ty_name = type_ident_name(field_ty).ok_or_else(|| {
            syn::Error::new_spanned(field_ty, "unsupported type for ConfigParams")
        })?;
        let TypeMapping {
            param_type,
            variant,
            getter,
            to_field,
            to_param,
        } = type_mapping(&ty_name).ok_or_else(|| {
            syn::Error::new_spanned(
                field_ty,
                format!("unsupported type '{ty_name}' (expected bool, i64, u64, String)"),
            )
        })?;

        let option_name = &attr.name;
        let importance = &attr.importance;
        let description = &attr.description;
        let required = attr.required;

        let default_value = if required {
            quote! { None }
        } else {
            quote! {
                Some(restruct_api::config::ParamValue::#variant(__defaults.#field_name #to_param))
            }
        };

        config_param_tokens.push(quote! {
            restruct_api::config::ConfigParam {
                name: #option_name.to_string(),
                param_type: restruct_api::config::ParamType::#param_type,
                importance: #importance,
                required: #required,
                default: #default_value,
                description: #description.to_string(),
            }
        });

        from_config_tokens.push(if required {
            quote! {
                result.#field_name = __config.#getter(#option_name)
                    .ok_or_else(|| restruct_api::error::PluginError::invalid_option(
                        #option_name,
                        "missing required option",
                    ))? #to_field;
            }
        } else {
            quote! {
                if let Some(v) = __config.#getter(#option_name) {
                    result.#field_name = v #to_field;
                }
            }
        });
    }

    let expanded = quote! {
        impl #name {
            pub fn config_params() -> Vec<restruct_api::config::ConfigParam> {
                let __defaults = Self::default();
                vec![
                    #(#config_param_tokens),*
                ]
            }

            pub fn from_config(
                __config: &restruct_api::config::ConfigValues,
            ) -> Result<Self, restruct_api::error::PluginError> {
                let mut result = Self::default();
                #(#from_config_tokens)*
                Ok(result)
            }
        }
    };

    Ok(TokenStream::from(expanded))
}

/// Extract the last path segment ident name from a type (e.g. `u64`, `String`).
fn type_ident_name(ty: &Type) -> Option<String> {
    if let Type::Path(type_path) = ty {
        type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string())
    } else {
        None
    }
}
