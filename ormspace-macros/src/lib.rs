//! ormspace 过程宏
//!
//! - `#[entity]`：将具名字段结构体声明为实体变体
//! - `#[key_type]`：为 `String` 新类型生成键类型所需的派生与转换
//!
use proc_macro::TokenStream;

mod derive_utils;
mod entity;
mod field_utils;
mod key_type;

/// 实体宏
/// - 注入 `key`（最前）与 `extra`（最后）字段，并合并 Debug/Default/Serialize/Deserialize 派生
/// - 自动实现 `::ormspace_domain::entity::Entity`
/// - 参数见 `ormspace_domain` 文档，例如 `#[entity(singular = "Bill", search = search_text)]`
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item)
}

/// 键类型宏
/// 用于 `struct Key(String);` 形式的新类型，生成 Display、FromStr、AsRef 与 String 互转
#[proc_macro_attribute]
pub fn key_type(attr: TokenStream, item: TokenStream) -> TokenStream {
    key_type::expand(attr, item)
}
