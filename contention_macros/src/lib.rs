use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemStruct, parse_macro_input};

extern crate proc_macro;

/// Turns a plain struct into a `Record`.
///
/// Adds the serde, `Debug`, `Clone` and `PartialEq` derives every record needs
/// and implements the `Record` marker trait, which must be in scope at the
/// call site.
#[proc_macro_attribute]
pub fn record(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(item as ItemStruct);
    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let expanded = quote! {
        #[derive(
            serde::Serialize,
            serde::Deserialize,
            std::fmt::Debug,
            std::clone::Clone,
            std::cmp::PartialEq
        )]
        #ast

        impl #impl_generics Record for #ident #ty_generics #where_clause {}
    };

    TokenStream::from(expanded)
}
