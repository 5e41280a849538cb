use quote::ToTokens;
use syn::spanned::Spanned;
use syn::{Attribute, Path, Token, punctuated::Punctuated};

// 归一化 derive 的 key：只看最后一段，避免 Serialize/serde::Serialize 重复
fn derive_key(p: &Path) -> String {
    match p.segments.last() {
        Some(last) => last.ident.to_string(),
        None => p.to_token_stream().to_string(),
    }
}

/// 合并 derive：required 在前，已有的去重后追加；其余属性保持原顺序
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<Path>) {
    let mut retained = Vec::new();
    let mut merged: Vec<Path> = Vec::new();
    let mut seen = std::collections::HashSet::<String>::new();

    for p in required {
        if seen.insert(derive_key(&p)) {
            merged.push(p);
        }
    }

    for attr in attrs.drain(..) {
        if !attr.path().is_ident("derive") {
            retained.push(attr);
            continue;
        }
        match attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated) {
            Ok(list) => {
                for p in list {
                    if seen.insert(derive_key(&p)) {
                        merged.push(p);
                    }
                }
            }
            Err(_) => retained.push(attr),
        }
    }

    let derive: Attribute = syn::parse_quote!(#[derive(#(#merged),*)]);
    *attrs = std::iter::once(derive).chain(retained).collect();
}

/// 拒绝会改变字段序列化名的容器级 serde 参数
pub(crate) fn reject_container_serde(attrs: &[Attribute], keys: &[&str]) -> syn::Result<()> {
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let mut found: Option<String> = None;
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(key) = keys.iter().find(|k| meta.path.is_ident(**k)) {
                found = Some((*key).to_string());
            }
            if meta.input.peek(Token![=]) {
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

        if let Some(key) = found {
            return Err(syn::Error::new(
                attr.span(),
                format!("#[entity] does not support #[serde({key})]; rename fields individually"),
            ));
        }
    }
    Ok(())
}
