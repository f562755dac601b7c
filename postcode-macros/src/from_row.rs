use proc_macro::TokenStream;
use quote::quote;
use syn::{token::{Brace, Paren}, *};
use crate::error;

pub fn from_row(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput { attrs: _, vis: _, ident, mut generics, data } = input;
    let Data::Struct(data) = data else {
        error!("only struct are currently supported")
    };

    let mut head = quote! {};
    let mut matches = quote! {};
    let mut output = quote! {};

    match data.fields {
        Fields::Unnamed(FieldsUnnamed { unnamed, .. }) => {
            head = quote! { let mut iter = row.into_iter(); };
            let body = (0..unnamed.len())
                .map(|_|quote! { iter.try_next()?.decode()?, });
            Paren::default().surround(&mut output, |e|e.extend(body));
        },
        Fields::Named(FieldsNamed { named, .. }) => {
            let idents = named
                .iter()
                .filter_map(|e|e.ident.as_ref())
                .map(|e|(e.to_string(),e))
                .collect::<Vec<_>>();
            head = idents
                .iter()
                .map(|(name,id)|quote! {
                    let mut #id = Err(::postcode::DecodeError::ColumnNotFound(#name.into()));
                })
                .collect();
            let arms = idents
                .iter()
                .map(|(name,id)| quote! { #name => #id = Ok(col.decode()?), });
            matches = quote! {
                for column in row {
                    let col = column?;
                    match col.name() {
                        #(#arms)*
                        _ => {}
                    }
                }
            };
            let body = idents
                .iter()
                .map(|(_,id)|quote! { #id: #id?, });
            Brace::default().surround(&mut output, |e|e.extend(body));
        }
        Fields::Unit => {}
    };

    for ty in generics.type_params_mut() {
        ty.bounds.push(syn::parse_quote!(::postcode::Decode));
    }

    let (g1, g2, g3) = generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #g1 ::postcode::FromRow for #ident #g2 #g3 {
            fn from_row(row: ::postcode::Row) -> Result<Self, ::postcode::DecodeError> {
                #head
                #matches
                Ok(Self #output)
            }
        }
    }.into())
}
