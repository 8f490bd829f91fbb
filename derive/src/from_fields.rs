use std::collections::BTreeMap;

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Error, ExprClosure, Field, Fields, GenericArgument, Ident, LitInt, Pat,
    PathArguments, Result, Token, Type,
    parse::{Parse, ParseStream},
    spanned::Spanned,
};

/// Primitives accepted by `FromFields` receiver methods.
const PRIMITIVES: [&str; 11] = [
    "u8", "u16", "u32", "u64", "i8", "i16", "i32", "i64", "f32", "f64", "str",
];

pub(crate) fn expand_from_fields(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new(
            input.span(),
            "`FromFields` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new(
            input.span(),
            "`FromFields` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(FieldMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    // Grouped by receiver method, keyed by field number within each group.
    let mut field_methods: BTreeMap<String, Vec<(u8, TokenStream2)>> = BTreeMap::new();
    let mut time_method: Option<TokenStream2> = None;

    for field in fields {
        let assignment = field.assignment();

        match field.identifier {
            FieldIdentifier::Number(number) => {
                let value: u8 = number.base10_parse()?;
                let cases = field_methods.entry(field.primitive.clone()).or_default();

                if cases.iter().any(|(n, _)| *n == value) {
                    Err(Error::new(number.span(), "Field identifiers must be unique."))?
                }

                cases.push((value, assignment));
            }
            FieldIdentifier::Time => {
                if field.primitive != "u8" {
                    Err(Error::new(field.span, "The time offset is a `u8`."))?
                }

                if time_method.replace(assignment).is_some() {
                    Err(Error::new(field.span, "Field identifiers must be unique."))?
                }
            }
        }
    }

    let field_methods = field_methods.into_iter().map(|(primitive, cases)| {
        let cases = cases
            .into_iter()
            .map(|(number, assignment)| quote! { #number => { #assignment } });

        let method = format_ident!("add_{}", primitive);
        let value_type = value_type(&primitive);

        quote! {
            fn #method(&mut self, field: u8, value: #value_type) {
                match field {
                    #(#cases)*
                    _ => {}
                };
            }
        }
    });

    let time_method = time_method.map(|assignment| {
        quote! {
            fn add_time_offset(&mut self, value: u8) {
                #assignment;
            }
        }
    });

    let name = &input.ident;

    let expanded = quote! {
        impl FromFields for #name {
            #(#field_methods)*
            #time_method
        }
    };

    Ok(expanded.into())
}

fn value_type(primitive: &str) -> TokenStream2 {
    if primitive == "str" {
        quote! { &str }
    } else {
        let ident = format_ident!("{}", primitive);
        quote! { #ident }
    }
}

#[derive(Debug)]
struct FieldMetadata {
    name: Ident,
    /// Receiver method suffix, one of [`PRIMITIVES`].
    primitive: String,
    /// Whether the struct field stores an owned `String`.
    owned_string: bool,
    identifier: FieldIdentifier,
    handler: Option<(Type, ExprClosure)>,
    span: Span,
}

#[derive(Debug)]
enum FieldIdentifier {
    Number(LitInt),
    Time,
}

impl FieldMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(name) = field.ident.clone() else {
            Err(Error::new_spanned(field, "Field must be named."))?
        };

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("field")) else {
            return Ok(None);
        };

        let span = attr.span();

        let FieldAttribute {
            identifier,
            handler,
        } = attr.meta.require_list()?.parse_args()?;

        let primitive_type = if let Some(handler) = &handler {
            let Some(parameter) = handler.inputs.iter().nth(1) else {
                Err(Error::new_spanned(
                    handler,
                    "Handler closure must have two parameters.",
                ))?
            };

            let Pat::Type(pat_type) = parameter else {
                Err(Error::new_spanned(
                    parameter,
                    "Handler closure's second parameter must be annotated with the expected primitive type.",
                ))?
            };

            (*pat_type.ty).clone()
        } else {
            option_inner(&field.ty)?
        };

        let (primitive, owned_string) = primitive_name(&primitive_type)?;

        let handler = handler.map(|h| (field.ty.clone(), h));

        Ok(Some(Self {
            name,
            primitive,
            owned_string,
            identifier,
            handler,
            span,
        }))
    }

    fn assignment(&self) -> TokenStream2 {
        let name = &self.name;

        if let Some((field_type, handler)) = &self.handler {
            let body = &handler.body;
            let acc = handler.inputs.iter().nth(0);
            let val = handler.inputs.iter().nth(1);

            quote! {
                (|#acc: &mut #field_type, #val| {#body})(&mut self.#name, value)
            }
        } else if self.owned_string {
            quote! { self.#name = Some(value.to_owned()) }
        } else {
            quote! { self.#name = Some(value) }
        }
    }
}

/// Extract `T` from a field of type `Option<T>`.
fn option_inner(ty: &Type) -> Result<Type> {
    let Type::Path(path) = ty else {
        Err(Error::new_spanned(ty, "Field must have a type annotation."))?
    };

    let Some(segment) = path.path.segments.last() else {
        Err(Error::new_spanned(
            &path.path.segments,
            "Field must have a type annotation.",
        ))?
    };

    if segment.ident != "Option" {
        Err(Error::new_spanned(
            &segment.ident,
            "Field without a handler must have type `Option<T>`.",
        ))?
    }

    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        Err(Error::new_spanned(
            &segment.arguments,
            "Field of type `Option<T>` must have a generic parameter.",
        ))?
    };

    let Some(GenericArgument::Type(inner_type)) = arguments.args.first() else {
        Err(Error::new_spanned(
            &arguments.args,
            "Generic argument of a field of type `Option<T>` must be a type.",
        ))?
    };

    Ok(inner_type.clone())
}

/// Map a primitive type to its receiver method suffix. `String` and `&str`
/// both receive through `add_str`.
fn primitive_name(ty: &Type) -> Result<(String, bool)> {
    let (ident, owned_string) = match ty {
        Type::Reference(reference) => match &*reference.elem {
            Type::Path(path) if path.path.is_ident("str") => ("str".to_owned(), false),
            _ => Err(Error::new_spanned(ty, "Only `&str` may be received by reference."))?,
        },
        Type::Path(path) if path.path.is_ident("String") => ("str".to_owned(), true),
        Type::Path(path) => match path.path.get_ident() {
            Some(ident) if ident != "str" => (ident.to_string(), false),
            _ => Err(Error::new_spanned(ty, "Expected a primitive type."))?,
        },
        _ => Err(Error::new_spanned(ty, "Expected a primitive type."))?,
    };

    if !PRIMITIVES.contains(&ident.as_str()) {
        Err(Error::new_spanned(
            ty,
            "Field primitive must be an integer, a float, `String` or `&str`.",
        ))?
    }

    Ok((ident, owned_string))
}

#[derive(Debug)]
struct FieldAttribute {
    identifier: FieldIdentifier,
    handler: Option<ExprClosure>,
}

impl Parse for FieldAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let identifier = if let Ok(ident) = input.parse::<Ident>() {
            if ident == "time" {
                FieldIdentifier::Time
            } else {
                Err(Error::new_spanned(
                    ident,
                    "Field identifier must be an integer literal or `time`.",
                ))?
            }
        } else {
            FieldIdentifier::Number(input.parse::<LitInt>()?)
        };

        let handler = if !input.is_empty() {
            input.parse::<Token![,]>()?;
            Some(input.parse::<ExprClosure>()?)
        } else {
            None
        };

        Ok(Self {
            identifier,
            handler,
        })
    }
}
