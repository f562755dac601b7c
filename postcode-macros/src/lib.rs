//! Derive macros for `postcode`.
use proc_macro::TokenStream;
use syn::DeriveInput;

mod from_row;
mod newtype;

macro_rules! error {
    ($($tt:tt)*) => {
        return Err(syn::Error::new(proc_macro::Span::call_site().into(), format!($($tt)*)))
    };
}

pub(crate) use error;

/// Derive `FromRow`.
///
/// Named fields are matched by column name, tuple fields by column position.
#[proc_macro_derive(FromRow)]
pub fn from_row(input: TokenStream) -> TokenStream {
    match from_row::from_row(syn::parse_macro_input!(input as DeriveInput)) {
        Ok(ok) => ok,
        Err(err) => err.into_compile_error().into(),
    }
}

/// Derive `PgType` and `Decode` for single field struct, delegating to the field.
#[proc_macro_derive(Decode)]
pub fn decode(input: TokenStream) -> TokenStream {
    match newtype::decode(syn::parse_macro_input!(input as DeriveInput)) {
        Ok(ok) => ok,
        Err(err) => err.into_compile_error().into(),
    }
}

/// Derive `Encode` for single field struct, delegating to the field.
///
/// Deriving `Encode` alone does not implement `PgType`, derive `Decode` or implement it
/// manually to bind the type with `Params::push`.
#[proc_macro_derive(Encode)]
pub fn encode(input: TokenStream) -> TokenStream {
    match newtype::encode(syn::parse_macro_input!(input as DeriveInput)) {
        Ok(ok) => ok,
        Err(err) => err.into_compile_error().into(),
    }
}
