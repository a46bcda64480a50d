use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

mod backend;
use backend::{generate_op_impl, kernel_prefix, parse_ops_attribute};

/// Implements the per-operation traits of `deferral_core::backends::ops` for
/// a backend struct.
///
/// Each listed op `Op` is bound to a kernel type named `<Prefix>Op`, where
/// the prefix is the struct name without its `Backend` suffix. Without a
/// `#[backend_ops(ops = [...])]` attribute every known op is implemented.
#[proc_macro_derive(BackendOps, attributes(backend_ops))]
pub fn derive_backend_ops(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let backend_name = &input.ident; // e.g., CpuBackend
    let ops = match parse_ops_attribute(&input.attrs) {
        Ok(ops) => ops,
        Err(err) => return err.to_compile_error().into(),
    };
    let prefix = kernel_prefix(backend_name);

    let implementations: Vec<_> = ops
        .iter()
        .map(|op_type| generate_op_impl(backend_name, &prefix, op_type))
        .collect();

    let expanded = quote! {
        #(#implementations)*
    };

    TokenStream::from(expanded)
}
