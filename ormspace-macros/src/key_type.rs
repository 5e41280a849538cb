use crate::derive_utils::apply_derives;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, parse_macro_input};

/// #[key_type] 宏实现
/// 仅支持内部为 `String` 的单字段 tuple struct，为键的新类型包装：
/// - 合并/追加派生：Default, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord
/// - 提供 new(value)、as_str、Display、FromStr、AsRef<str>、与 String 的互转
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[key_type] takes no arguments",
        )
        .to_compile_error()
        .into();
    }
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[key_type] only on struct")
                .to_compile_error()
                .into();
        }
    };

    match &st.fields {
        syn::Fields::Unnamed(f) if f.unnamed.len() == 1 => {
            let inner = &f.unnamed[0].ty;
            let is_string = matches!(inner, syn::Type::Path(p)
                if p.qself.is_none() && p.path.segments.last().is_some_and(|s| s.ident == "String"));
            if !is_string {
                return syn::Error::new(inner.span(), "#[key_type] requires a `String` field")
                    .to_compile_error()
                    .into();
            }
        }
        _ => {
            return syn::Error::new(
                st.span(),
                "#[key_type] supports only tuple struct, e.g., struct Key(String);",
            )
            .to_compile_error()
            .into();
        }
    }

    if !st.generics.params.is_empty() {
        return syn::Error::new(st.generics.span(), "#[key_type] does not support generics")
            .to_compile_error()
            .into();
    }

    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Default),
        syn::parse_quote!(Clone),
        syn::parse_quote!(Debug),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(Eq),
        syn::parse_quote!(Hash),
        syn::parse_quote!(PartialOrd),
        syn::parse_quote!(Ord),
    ];
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;

    let out = quote! {
        #st

        impl #ident {
            pub fn new(value: ::std::string::String) -> Self { Self(value) }

            pub fn as_str(&self) -> &str { &self.0 }
        }

        impl ::std::str::FromStr for #ident {
            type Err = ::std::convert::Infallible;
            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                ::std::result::Result::Ok(Self(s.to_string()))
            }
        }

        impl ::std::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::AsRef<str> for #ident {
            fn as_ref(&self) -> &str { &self.0 }
        }

        impl ::core::convert::From<#ident> for ::std::string::String {
            fn from(value: #ident) -> Self { value.0 }
        }

        impl ::core::convert::From<::std::string::String> for #ident {
            fn from(value: ::std::string::String) -> Self { Self(value) }
        }

        impl ::core::convert::From<&str> for #ident {
            fn from(value: &str) -> Self { Self(value.to_string()) }
        }
    };

    TokenStream::from(out)
}
