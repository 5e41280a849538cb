use crate::derive_utils::{apply_derives, reject_container_serde};
use crate::field_utils::{
    Shape, float_shape, inject_managed_fields, is_resolvable, serde_field, trimming_attrs,
    type_label,
};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Expr, Ident, Item, ItemStruct, LitStr, Path, Result, Token, parse::Parse, parse::ParseStream,
    parse_macro_input,
};

/// #[entity] 宏实现
/// - 注入字段：`key: Option<String>`（最前，空值序列化为 null）与 `extra`（最后，收集未声明字段）
/// - 合并 derive：Debug（可关闭）、Default、Serialize、Deserialize
/// - 生成 `::ormspace_domain::entity::Entity` 实现（配置、字段描述、key/extra 访问）
/// - `String` / `Option<String>` 字段（含 `key`）反序列化时裁剪首尾空白
/// - 默认生成 Display（`key=None name="x"` 形式）；`display = false` 时由用户实现
/// - `ord = true` 时生成按归一化显示字符串比较的 `PartialOrd`（需自行提供 `PartialEq`）
/// - 支持参数：
///   `singular = "..."`, `plural = "..."`, `table = "..."`,
///   `extra_dependents = ["..."]`, `exist_query = ["..."]`, `groups = ["..."]`,
///   `fetch_query = path::to_fn`, `search = method`, `display = bool`, `debug = bool`,
///   `ord = bool`
/// - `fetch_query` 指向的函数在注册时调用，不得访问本变体的变体级方法
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EntityAttrConfig);
    let input = parse_macro_input!(item as Item);

    let st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity] only on struct")
                .to_compile_error()
                .into();
        }
    };

    match expand_struct(cfg, st) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

struct DeclaredField {
    ident: Ident,
    name: String,
    skip_serializing: bool,
    float: Option<Shape>,
    type_label: String,
    resolvable: bool,
    ty: syn::Type,
}

fn expand_struct(cfg: EntityAttrConfig, mut st: ItemStruct) -> Result<TokenStream2> {
    if let Some(lt) = st.generics.lifetimes().next() {
        return Err(syn::Error::new(
            lt.span(),
            "#[entity] does not support lifetime parameters; entities own their data",
        ));
    }
    reject_container_serde(&st.attrs, &["rename_all", "transparent"])?;

    let params: Vec<Ident> = st
        .generics
        .type_params()
        .map(|p| p.ident.clone())
        .chain(st.generics.const_params().map(|p| p.ident.clone()))
        .collect();

    let struct_span = st.span();
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return Err(syn::Error::new(
                struct_span,
                "only supports named-field struct",
            ));
        }
    };

    // 记录声明字段（注入前），保持声明顺序
    let mut declared: Vec<DeclaredField> = Vec::new();
    for f in fields_named.named.iter_mut() {
        let Some(ident) = f.ident.clone() else {
            continue;
        };
        let Some(serde) = serde_field(f) else {
            continue;
        };
        if !serde.skip_deserializing && !serde.custom_deserialize {
            let trimming = trimming_attrs(&f.ty, serde.has_default);
            f.attrs.extend(trimming);
        }
        declared.push(DeclaredField {
            ident,
            name: serde.name,
            skip_serializing: serde.skip_serializing,
            float: float_shape(&f.ty),
            type_label: type_label(&f.ty),
            resolvable: is_resolvable(&f.ty, &params),
            ty: f.ty.clone(),
        });
    }

    if let Some(list) = &cfg.exist_query {
        for lit in list {
            let name = lit.value();
            if name != "key" && !declared.iter().any(|f| f.name == name) {
                return Err(syn::Error::new(
                    lit.span(),
                    format!("exist_query field `{name}` is not a field of this entity"),
                ));
            }
        }
    }

    inject_managed_fields(
        fields_named,
        vec![syn::parse_quote! {
            #[serde(
                default,
                serialize_with = "::ormspace_domain::keys::serialize_key",
                deserialize_with = "::ormspace_domain::text::deserialize_trimmed_opt"
            )]
            key: ::std::option::Option<::std::string::String>
        }],
        vec![syn::parse_quote! {
            #[serde(flatten)]
            extra: ::ormspace_domain::__private::serde_json::Map<
                ::std::string::String,
                ::ormspace_domain::__private::serde_json::Value,
            >
        }],
    )?;

    let mut required: Vec<Path> = vec![
        syn::parse_quote!(Default),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if cfg.derive_debug.unwrap_or(true) {
        required.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;
    let name_lit = LitStr::new(&ident.to_string(), ident.span());
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    let config_body = config_tokens(&cfg);

    let descriptors = declared.iter().map(|f| {
        let name = LitStr::new(&f.name, f.ident.span());
        let label = LitStr::new(&f.type_label, f.ident.span());
        let ty = &f.ty;
        if f.resolvable {
            quote! { ::ormspace_domain::field::FieldDescriptor::resolved::<#ty>(#name, #label) }
        } else {
            quote! { ::ormspace_domain::field::FieldDescriptor::unresolved(#name, #label) }
        }
    });

    // NaN/无穷：serde_json 不报错而是写成 null
    let finite_checks: Vec<TokenStream2> = declared
        .iter()
        .filter(|f| !f.skip_serializing)
        .filter_map(|f| {
            let field_ident = &f.ident;
            let name = LitStr::new(&f.name, f.ident.span());
            let non_finite = match f.float? {
                Shape::Plain => quote! { !self.#field_ident.is_finite() },
                Shape::Optional => quote! { self.#field_ident.is_some_and(|v| !v.is_finite()) },
                Shape::List => quote! { self.#field_ident.iter().any(|v| !v.is_finite()) },
            };
            Some(quote! {
                if #non_finite {
                    return ::std::option::Option::Some(#name);
                }
            })
        })
        .collect();

    let probes = declared.iter().filter(|f| !f.skip_serializing).map(|f| {
        let field_ident = &f.ident;
        let name = LitStr::new(&f.name, f.ident.span());
        quote! {
            if ::ormspace_domain::__private::serde_json::to_value(&self.#field_ident).is_err() {
                return ::std::option::Option::Some(#name);
            }
        }
    });

    let ord_impl = if cfg.ord.unwrap_or(false) {
        quote! {
            impl #impl_generics ::std::cmp::PartialOrd for #ident #ty_generics #where_clause {
                fn partial_cmp(&self, other: &Self) -> ::std::option::Option<::std::cmp::Ordering> {
                    ::std::option::Option::Some(
                        <Self as ::ormspace_domain::entity::Entity>::display_cmp(self, other),
                    )
                }
            }
        }
    } else {
        quote! {}
    };

    let search_fn = cfg.search.as_ref().map(|method| {
        quote! {
            fn search_field(&self) -> ::std::option::Option<::std::string::String> {
                ::std::option::Option::Some(::std::convert::Into::into(self.#method()))
            }
        }
    });

    let display_impl = if cfg.display.unwrap_or(true) {
        let writes = declared.iter().map(|f| {
            let field_ident = &f.ident;
            let fmt = LitStr::new(&format!(" {}={{:?}}", f.name), f.ident.span());
            quote! { ::std::write!(f, #fmt, self.#field_ident)?; }
        });
        quote! {
            impl #impl_generics ::std::fmt::Display for #ident #ty_generics #where_clause {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    ::std::write!(f, "key={:?}", self.key)?;
                    #( #writes )*
                    ::std::result::Result::Ok(())
                }
            }
        }
    } else {
        quote! {}
    };

    Ok(quote! {
        #st

        impl #impl_generics ::ormspace_domain::entity::Entity for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name_lit;

            fn config() -> ::ormspace_domain::config::EntityConfig {
                #config_body
            }

            fn fields() -> ::std::vec::Vec<::ormspace_domain::field::FieldDescriptor> {
                ::std::vec![
                    ::ormspace_domain::field::FieldDescriptor::resolved::<
                        ::std::option::Option<::std::string::String>,
                    >("key", "Option<String>"),
                    #( #descriptors, )*
                ]
            }

            fn key_slot(&self) -> &::std::option::Option<::std::string::String> { &self.key }

            fn key_slot_mut(&mut self) -> &mut ::std::option::Option<::std::string::String> {
                &mut self.key
            }

            fn extra(&self) -> &::ormspace_domain::__private::serde_json::Map<
                ::std::string::String,
                ::ormspace_domain::__private::serde_json::Value,
            > {
                &self.extra
            }

            fn extra_mut(&mut self) -> &mut ::ormspace_domain::__private::serde_json::Map<
                ::std::string::String,
                ::ormspace_domain::__private::serde_json::Value,
            > {
                &mut self.extra
            }

            #search_fn

            fn unserializable_field(&self) -> ::std::option::Option<&'static str> {
                #( #finite_checks )*
                #( #probes )*
                ::std::option::Option::None
            }

            fn non_finite_field(&self) -> ::std::option::Option<&'static str> {
                #( #finite_checks )*
                ::std::option::Option::None
            }
        }

        #display_impl

        #ord_impl
    })
}

fn config_tokens(cfg: &EntityAttrConfig) -> TokenStream2 {
    let mut setters: Vec<TokenStream2> = Vec::new();

    if let Some(lit) = &cfg.singular {
        setters.push(quote! { .singular(#lit) });
    }
    if let Some(lit) = &cfg.plural {
        setters.push(quote! { .plural(#lit) });
    }
    if let Some(lit) = &cfg.table {
        setters.push(quote! { .table(#lit) });
    }
    if let Some(list) = &cfg.extra_dependents {
        setters.push(quote! { .extra_dependents(::std::vec![#(#list),*]) });
    }
    if let Some(list) = &cfg.exist_query {
        setters.push(quote! { .exist_query(::std::vec![#(#list),*]) });
    }
    if let Some(list) = &cfg.groups {
        setters.push(quote! { .model_groups(::std::vec![#(#list),*]) });
    }
    if let Some(path) = &cfg.fetch_query {
        setters.push(quote! { .fetch_query(#path()) });
    }

    quote! {
        ::ormspace_domain::config::EntityConfig::builder()
            #( #setters )*
            .build()
    }
}

// -------- parsing --------

#[derive(Default)]
struct EntityAttrConfig {
    singular: Option<LitStr>,
    plural: Option<LitStr>,
    table: Option<LitStr>,
    extra_dependents: Option<Vec<LitStr>>,
    exist_query: Option<Vec<LitStr>>,
    groups: Option<Vec<LitStr>>,
    fetch_query: Option<Path>,
    search: Option<Ident>,
    display: Option<bool>,
    derive_debug: Option<bool>,
    ord: Option<bool>,
}

impl Parse for EntityAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = Self::default();

        if input.is_empty() {
            return Ok(cfg);
        }

        let elems: Punctuated<EntityAttrElem, Token![,]> =
            Punctuated::<EntityAttrElem, Token![,]>::parse_terminated(input)?;

        for elem in elems.into_iter() {
            let key = elem.key.to_string();
            let duplicate = || {
                syn::Error::new(
                    elem.key.span(),
                    format!("duplicate key '{key}' in attribute"),
                )
            };
            match key.as_str() {
                "singular" => set_once(&mut cfg.singular, lit_str(&elem.value)?, duplicate)?,
                "plural" => set_once(&mut cfg.plural, lit_str(&elem.value)?, duplicate)?,
                "table" => set_once(&mut cfg.table, lit_str(&elem.value)?, duplicate)?,
                "extra_dependents" => {
                    set_once(&mut cfg.extra_dependents, lit_str_list(&elem.value)?, duplicate)?
                }
                "exist_query" => {
                    set_once(&mut cfg.exist_query, lit_str_list(&elem.value)?, duplicate)?
                }
                "groups" => set_once(&mut cfg.groups, lit_str_list(&elem.value)?, duplicate)?,
                "fetch_query" => set_once(&mut cfg.fetch_query, path(&elem.value)?, duplicate)?,
                "search" => set_once(&mut cfg.search, ident(&elem.value)?, duplicate)?,
                "display" => set_once(&mut cfg.display, lit_bool(&elem.value)?, duplicate)?,
                "debug" => set_once(&mut cfg.derive_debug, lit_bool(&elem.value)?, duplicate)?,
                "ord" => set_once(&mut cfg.ord, lit_bool(&elem.value)?, duplicate)?,
                _ => {
                    return Err(syn::Error::new(
                        elem.key.span(),
                        "unknown key in attribute; expected 'singular' | 'plural' | 'table' | \
                         'extra_dependents' | 'exist_query' | 'groups' | 'fetch_query' | \
                         'search' | 'display' | 'debug' | 'ord'",
                    ));
                }
            }
        }

        Ok(cfg)
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, duplicate: impl Fn() -> syn::Error) -> Result<()> {
    if slot.is_some() {
        return Err(duplicate());
    }
    *slot = Some(value);
    Ok(())
}

fn lit_str(expr: &Expr) -> Result<LitStr> {
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) => Ok(lit.clone()),
        other => Err(syn::Error::new(other.span(), "expected string literal")),
    }
}

fn lit_str_list(expr: &Expr) -> Result<Vec<LitStr>> {
    match expr {
        Expr::Array(array) => array.elems.iter().map(lit_str).collect(),
        other => Err(syn::Error::new(
            other.span(),
            "expected array of string literals, e.g. [\"a\", \"b\"]",
        )),
    }
}

fn lit_bool(expr: &Expr) -> Result<bool> {
    match expr {
        Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Bool(b),
            ..
        }) => Ok(b.value()),
        other => Err(syn::Error::new(other.span(), "expected boolean literal")),
    }
}

fn path(expr: &Expr) -> Result<Path> {
    match expr {
        Expr::Path(p) => Ok(p.path.clone()),
        other => Err(syn::Error::new(other.span(), "expected function path")),
    }
}

fn ident(expr: &Expr) -> Result<Ident> {
    match expr {
        Expr::Path(p) => p
            .path
            .get_ident()
            .cloned()
            .ok_or_else(|| syn::Error::new(p.span(), "expected method name")),
        other => Err(syn::Error::new(other.span(), "expected method name")),
    }
}

struct EntityAttrElem {
    key: Ident,
    value: Expr,
}

impl Parse for EntityAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: Expr = input.parse()?;
        Ok(Self { key, value })
    }
}
