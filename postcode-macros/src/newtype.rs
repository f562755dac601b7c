use proc_macro::TokenStream;
use quote::quote;
use syn::*;
use crate::error;

/// Returns the single field of a newtype struct.
fn field(data: Data) -> Result<Field> {
    let fields = match data {
        Data::Struct(st) => st.fields,
        Data::Enum(_) => error!("enum is not yet supported"),
        Data::Union(_) => error!("union is not supported"),
    };

    match fields {
        Fields::Unnamed(FieldsUnnamed { unnamed, .. }) if unnamed.len() == 1 => {
            Ok(unnamed.into_iter().next().unwrap())
        }
        Fields::Named(FieldsNamed { named, .. }) if named.len() == 1 => {
            Ok(named.into_iter().next().unwrap())
        }
        _ => error!("only one field struct is supported"),
    }
}

pub fn decode(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput { attrs: _, vis: _, ident, mut generics, data } = input;
    let Field { ident: name, ty, .. } = field(data)?;

    let q1 = match name {
        Some(name) => quote! { Ok(Self { #name: col.decode()? }) },
        None => quote! { Ok(Self(col.decode()?)) },
    };

    for ty in generics.type_params_mut() {
        ty.bounds.push(syn::parse_quote!(::postcode::Decode));
    }

    let (g1, g2, g3) = generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #g1 ::postcode::postgres::PgType for #ident #g2 #g3 {
            const OID: ::postcode::postgres::Oid = <#ty as ::postcode::postgres::PgType>::OID;

            fn accepts(oid: ::postcode::postgres::Oid) -> bool {
                <#ty as ::postcode::postgres::PgType>::accepts(oid)
            }
        }

        #[automatically_derived]
        impl #g1 ::postcode::Decode for #ident #g2 #g3 {
            fn decode(col: ::postcode::row::Column) -> Result<Self, ::postcode::DecodeError> {
                #q1
            }
        }
    }.into())
}

pub fn encode(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput { attrs: _, vis: _, ident, generics, data } = input;
    let Field { ident: name, ty, .. } = field(data)?;

    let access = match name {
        Some(name) => quote! { self.#name },
        None => quote! { self.0 },
    };

    let mut impl_generics = generics.clone();
    impl_generics.params.insert(0, syn::parse_quote!('__q));
    impl_generics
        .make_where_clause()
        .predicates
        .push(syn::parse_quote!(#ty: ::postcode::Encode<'__q>));

    let (g1, _, g3) = impl_generics.split_for_impl();
    let (_, g2, _) = generics.split_for_impl();

    Ok(quote! {
        #[automatically_derived]
        impl #g1 ::postcode::Encode<'__q> for #ident #g2 #g3 {
            fn encode(
                self,
                ty: &::postcode::ParamType,
            ) -> Result<::postcode::Encoded<'__q>, ::postcode::EncodeError> {
                ::postcode::Encode::encode(#access, ty)
            }
        }
    }.into())
}
