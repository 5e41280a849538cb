use proc_macro2::{TokenStream as TokenStream2, TokenTree};
use quote::ToTokens;
use syn::spanned::Spanned;
use syn::{
    Attribute, Field, FieldsNamed, GenericArgument, Ident, LitStr, PathArguments, PathSegment,
    Token, Type, punctuated::Punctuated,
};

fn field_named<'a>(named: &'a Punctuated<Field, Token![,]>, name: &str) -> Option<&'a Field> {
    named
        .iter()
        .find(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
}

/// 注入由宏管理的字段
/// - leading: 置于最前（按给定顺序）
/// - trailing: 置于最后
/// - 用户已声明同名字段时报错，避免绕过宏对该字段的约束
pub(crate) fn inject_managed_fields(
    fields_named: &mut FieldsNamed,
    leading: Vec<Field>,
    trailing: Vec<Field>,
) -> syn::Result<()> {
    for managed in leading.iter().chain(trailing.iter()) {
        let Some(ident) = managed.ident.as_ref() else {
            continue;
        };
        if let Some(existing) = field_named(&fields_named.named, &ident.to_string()) {
            return Err(syn::Error::new(
                existing.span(),
                format!("field `{ident}` is managed by #[entity]; remove it from the struct"),
            ));
        }
    }

    let old_named = fields_named.named.clone();
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();
    new_named.extend(leading);
    new_named.extend(old_named);
    new_named.extend(trailing);

    fields_named.named = new_named;
    Ok(())
}

/// 字段的 serde 视图
pub(crate) struct SerdeField {
    /// 序列化名：优先 `#[serde(rename = "...")]`，否则为字段标识符
    pub(crate) name: String,
    /// 标注了 `skip` / `skip_serializing`
    pub(crate) skip_serializing: bool,
    /// 标注了 `skip` / `skip_deserializing`
    pub(crate) skip_deserializing: bool,
    /// 已有 `with` / `deserialize_with`
    pub(crate) custom_deserialize: bool,
    /// 已有字段级 `default`
    pub(crate) has_default: bool,
}

pub(crate) fn serde_field(field: &Field) -> Option<SerdeField> {
    let ident = field.ident.as_ref()?;
    let mut rename: Option<String> = None;
    let mut skip_serializing = false;
    let mut skip_deserializing = false;
    let mut custom_deserialize = false;
    let mut has_default = false;

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("serde")) {
        // 解析失败交给 serde 自身报告
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                skip_serializing = true;
            }
            if meta.path.is_ident("skip") || meta.path.is_ident("skip_deserializing") {
                skip_deserializing = true;
            }
            if meta.path.is_ident("with") || meta.path.is_ident("deserialize_with") {
                custom_deserialize = true;
            }
            if meta.path.is_ident("default") {
                has_default = true;
            }
            if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                let lit: LitStr = meta.value()?.parse()?;
                rename = Some(lit.value());
            } else if meta.input.peek(Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                meta.parse_nested_meta(|inner| {
                    if inner.input.peek(Token![=]) {
                        let _: syn::Expr = inner.value()?.parse()?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        });
    }

    let name = rename.unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
    Some(SerdeField {
        name,
        skip_serializing,
        skip_deserializing,
        custom_deserialize,
        has_default,
    })
}

/// 标量字段的容器形状
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// `T`
    Plain,
    /// `Option<T>`
    Optional,
    /// `Vec<T>`
    List,
}

fn last_segment(ty: &Type) -> Option<&PathSegment> {
    match ty {
        Type::Path(p) if p.qself.is_none() => p.path.segments.last(),
        _ => None,
    }
}

/// 识别 `T` / `Option<T>` / `Vec<T>`，返回形状与 `T` 的末段标识（`T` 本身不带泛型参数）
pub(crate) fn scalar_shape(ty: &Type) -> Option<(Shape, &Ident)> {
    let seg = last_segment(ty)?;
    match &seg.arguments {
        PathArguments::None => Some((Shape::Plain, &seg.ident)),
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => {
            let shape = if seg.ident == "Option" {
                Shape::Optional
            } else if seg.ident == "Vec" {
                Shape::List
            } else {
                return None;
            };
            match args.args.first()? {
                GenericArgument::Type(inner) => {
                    let inner = last_segment(inner)?;
                    matches!(inner.arguments, PathArguments::None).then_some((shape, &inner.ident))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// `f32`/`f64` 及其 `Option`/`Vec` 形状
pub(crate) fn float_shape(ty: &Type) -> Option<Shape> {
    scalar_shape(ty)
        .filter(|(_, ident)| *ident == "f32" || *ident == "f64")
        .map(|(shape, _)| shape)
}

/// `String` / `Option<String>` 字段反序列化时裁剪首尾空白
pub(crate) fn trimming_attrs(ty: &Type, has_default: bool) -> Vec<Attribute> {
    match scalar_shape(ty) {
        Some((Shape::Plain, ident)) if ident == "String" => vec![syn::parse_quote! {
            #[serde(deserialize_with = "::ormspace_domain::text::deserialize_trimmed")]
        }],
        Some((Shape::Optional, ident)) if ident == "String" => {
            let mut attrs: Vec<Attribute> = vec![syn::parse_quote! {
                #[serde(deserialize_with = "::ormspace_domain::text::deserialize_trimmed_opt")]
            }];
            // 自定义 deserialize_with 后缺省不再视为 None
            if !has_default {
                attrs.push(syn::parse_quote!(#[serde(default)]));
            }
            attrs
        }
        _ => Vec::new(),
    }
}

/// 类型是否能在编译期确定 `TypeId`：
/// 引用了结构体泛型参数、生命周期、`impl`/`_` 的类型视为无法确定
pub(crate) fn is_resolvable(ty: &Type, params: &[Ident]) -> bool {
    !depends_on(ty.to_token_stream(), params)
}

fn depends_on(tokens: TokenStream2, params: &[Ident]) -> bool {
    tokens.into_iter().any(|tt| match tt {
        TokenTree::Ident(i) => i == "impl" || i == "_" || params.iter().any(|p| *p == i),
        TokenTree::Punct(p) => p.as_char() == '\'',
        TokenTree::Group(g) => depends_on(g.stream(), params),
        TokenTree::Literal(_) => false,
    })
}

/// 类型的紧凑书写形式，例如 `HashMap<String, Key>`
pub(crate) fn type_label(ty: &Type) -> String {
    let raw = ty.to_token_stream().to_string();
    let mut out = String::with_capacity(raw.len());
    let chars: Vec<char> = raw.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if *c != ' ' {
            out.push(*c);
            continue;
        }
        let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
        let next = chars.get(i + 1).copied();
        match (prev, next) {
            (_, Some(',')) | (_, Some('>')) | (_, Some('<')) | (Some('<'), _) => {}
            (Some(':'), _) | (_, Some(':')) => {}
            (Some('&'), _) => {}
            _ => out.push(' '),
        }
    }
    out
}
