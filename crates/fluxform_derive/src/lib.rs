use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(FormModel, attributes(form))]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let fluxform = fluxform_path();
    let mut key_methods = Vec::new();
    let mut declarations = Vec::new();

    for field in named_fields {
        let options = match FieldOptions::parse(&field) {
            Ok(options) => options,
            Err(error) => return error.to_compile_error().into(),
        };
        let Some(field_ident) = field.ident else {
            continue;
        };
        let key = options
            .rename
            .unwrap_or_else(|| field_ident.to_string().trim_start_matches("r#").to_string());
        let kind = if options.composite {
            quote!(#fluxform::form::FieldKind::Composite)
        } else {
            quote!(#fluxform::form::FieldKind::Scalar)
        };

        key_methods.push(quote! {
            pub fn #field_ident(&self) -> #fluxform::form::FieldKey {
                #fluxform::form::FieldKey::from(#key)
            }
        });
        declarations.push(quote! {
            #fluxform::form::FieldDecl {
                key: #fluxform::form::FieldKey::from(#key),
                kind: #kind,
            }
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#key_methods)*
        }

        impl #fluxform::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn declarations() -> ::std::vec::Vec<#fluxform::form::FieldDecl> {
                ::std::vec![#(#declarations),*]
            }
        }
    }
    .into()
}

#[derive(Default)]
struct FieldOptions {
    composite: bool,
    rename: Option<String>,
}

impl FieldOptions {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("form")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("composite") {
                    options.composite = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    options.rename = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("expected `composite` or `rename = \"...\"`"))
                }
            })?;
        }
        Ok(options)
    }
}

fn fluxform_path() -> TokenStream2 {
    match crate_name("fluxform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::fluxform),
    }
}
