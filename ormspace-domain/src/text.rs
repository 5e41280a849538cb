//! 文本归一化
//!
//! 为搜索字符串与默认排序提供统一的、与大小写和重音无关的比较形式，
//! 以及实体字符串字段在反序列化时的首尾空白裁剪。
//!
use heck::ToSnakeCase;
use serde::{Deserialize, Deserializer};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// 归一化为小写比较形式
///
/// NFKD 分解后去除组合附加符号，转为小写，去除首尾空白并将连续空白折叠为单个空格。
///
/// ```
/// use ormspace_domain::text::normalize_lower;
///
/// assert_eq!(normalize_lower("  Crème   Brûlée "), "creme brulee");
/// ```
pub fn normalize_lower(value: &str) -> String {
    let folded: String = value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 由类型名生成 slug（`InvoiceItem` -> `invoice_item`）
pub fn slug(type_name: &str) -> String {
    type_name.to_snake_case()
}

/// 反序列化 `String` 并去除首尾空白（`#[entity]` 为 `String` 字段自动挂载）
pub fn deserialize_trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(trim_owned)
}

/// `Option<String>` 版本；`None` 保持不变
pub fn deserialize_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|v| v.map(trim_owned))
}

fn trim_owned(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_string()
    }
}
