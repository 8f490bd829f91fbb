use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, Ident, LitInt, Result, Token, Type,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
};

pub(crate) fn expand_from_records(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        Err(Error::new_spanned(
            input,
            "`FromRecords` may only be derived on structs.",
        ))?
    };

    let Fields::Named(fields) = &data.fields else {
        Err(Error::new_spanned(
            input,
            "`FromRecords` may only be derived on structs with named fields.",
        ))?
    };

    let fields = fields
        .named
        .iter()
        .map(RecordMetadata::parse)
        .map(Result::transpose)
        .flatten() // Skip fields without an attribute.
        .collect::<Result<Vec<_>>>()?;

    let mut seen: Vec<u16> = Vec::new();

    for field in &fields {
        for number in &field.numbers {
            let value: u16 = number.base10_parse()?;

            if seen.contains(&value) {
                Err(Error::new(number.span(), "Record numbers must be unique."))?
            }

            seen.push(value);
        }
    }

    let cases = fields.iter().map(|field| {
        let RecordMetadata {
            name,
            numbers,
            is_vec,
        } = field;

        let assignment = if *is_vec {
            quote! {
                self.#name.push(Default::default());
                self.#name.last_mut().map(|r| r as &mut dyn FromFields)
            }
        } else {
            quote! {
                Some(self.#name.insert(Default::default()) as &mut dyn FromFields)
            }
        };

        quote! { #(#numbers)|* => { #assignment } }
    });

    let name = &input.ident;

    let expanded = quote! {
        impl FromRecords for #name {
            fn add_record(&mut self, id: u16) -> Option<&mut dyn FromFields> {
                match id {
                    #(#cases)*
                    _ => None,
                }
            }
        }
    };

    Ok(expanded.into())
}

#[derive(Debug)]
struct RecordMetadata {
    name: Ident,
    numbers: Vec<LitInt>,
    is_vec: bool,
}

impl RecordMetadata {
    fn parse(field: &Field) -> Result<Option<Self>> {
        let Some(name) = field.ident.clone() else {
            Err(Error::new_spanned(field, "Field must be named."))?
        };

        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("record")) else {
            return Ok(None);
        };

        let RecordAttribute { numbers } = attr.meta.require_list()?.parse_args()?;

        let Type::Path(path) = &field.ty else {
            Err(Error::new_spanned(
                &field.ty,
                "Field must have a type annotation.",
            ))?
        };

        let Some(segment) = path.path.segments.last() else {
            Err(Error::new_spanned(
                &path.path.segments,
                "Field must have an `Option<T>` or `Vec<T>` type.",
            ))?
        };

        let is_vec = if segment.ident == "Option" {
            false
        } else if segment.ident == "Vec" {
            true
        } else {
            Err(Error::new_spanned(
                &segment.ident,
                "Field must have an `Option<T>` or `Vec<T>` type.",
            ))?
        };

        Ok(Some(Self {
            name,
            numbers,
            is_vec,
        }))
    }
}

/// One or more global message numbers, separated by commas.
#[derive(Debug)]
struct RecordAttribute {
    numbers: Vec<LitInt>,
}

impl Parse for RecordAttribute {
    fn parse(input: ParseStream) -> Result<Self> {
        let numbers = Punctuated::<LitInt, Token![,]>::parse_separated_nonempty(input)?;
        Ok(Self {
            numbers: numbers.into_iter().collect(),
        })
    }
}
