use quote::{format_ident, quote};
use syn::{Attribute, Expr, ExprArray, ExprLit, Lit, LitStr, parse::Parse};

pub const KNOWN_OPS: &[&str] = &[
    "Neg",
    "Abs",
    "Exp",
    "Log",
    "Sin",
    "Cos",
    "Tanh",
    "Relu",
    "Frac",
    "Exp2",
    "Log2",
    "Log10",
    "Log1p",
    "Tan",
    "Asin",
    "Acos",
    "Atan",
    "Sinh",
    "Cosh",
    "Asinh",
    "Acosh",
    "Atanh",
    "Add",
    "Subtract",
    "Multiply",
    "Divide",
    "TruncDivide",
    "Remainder",
    "Pow",
    "Maximum",
    "Minimum",
    "Sum",
    "Matmul",
];

pub fn parse_ops_attribute(attrs: &[Attribute]) -> syn::Result<Vec<LitStr>> {
    for attr in attrs {
        if !attr.path().is_ident("backend_ops") {
            continue;
        }
        let mut ops_result = None;
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("ops") {
                return Err(meta.error("expected `ops = [...]`"));
            }
            match Expr::parse(meta.value()?)? {
                Expr::Array(array) => {
                    ops_result = Some(parse_string_array(&array)?);
                    Ok(())
                }
                other => Err(syn::Error::new_spanned(other, "expected an array of op names")),
            }
        })?;
        if let Some(ops) = ops_result {
            return Ok(ops);
        }
    }

    // Default: all known operations
    Ok(KNOWN_OPS
        .iter()
        .map(|op| LitStr::new(op, proc_macro2::Span::call_site()))
        .collect())
}

fn parse_string_array(array: &ExprArray) -> syn::Result<Vec<LitStr>> {
    array
        .elems
        .iter()
        .map(|elem| match elem {
            Expr::Lit(ExprLit {
                lit: Lit::Str(lit_str),
                ..
            }) if KNOWN_OPS.contains(&lit_str.value().as_str()) => Ok(lit_str.clone()),
            Expr::Lit(ExprLit {
                lit: Lit::Str(lit_str),
                ..
            }) => Err(syn::Error::new_spanned(
                lit_str,
                format!("unknown operation `{}`", lit_str.value()),
            )),
            other => Err(syn::Error::new_spanned(other, "op names must be string literals")),
        })
        .collect()
}

pub fn kernel_prefix(backend_name: &syn::Ident) -> String {
    let name = backend_name.to_string();
    name.strip_suffix("Backend").unwrap_or(&name).to_string()
}

pub fn generate_op_impl(
    backend_name: &syn::Ident,
    prefix: &str,
    op_type: &LitStr,
) -> proc_macro2::TokenStream {
    let op_ident = format_ident!("{}", op_type.value(), span = op_type.span());
    let kernel_ident = format_ident!("{}{}", prefix, op_type.value(), span = op_type.span());

    quote! {
        impl ::deferral_core::backends::ops::#op_ident for #backend_name {
            type #op_ident = #kernel_ident;
        }
    }
}
