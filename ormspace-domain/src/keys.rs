//! 键（Key）类型
//!
//! `Key` 指向表不固定的记录，`TableKey` 额外携带目标表名（`<table>.<key>`）。
//! 两者只是字符串的新类型包装，键字符串的解析与校验由外部工具负责。
//!
use ormspace_macros::key_type;
use serde::Serializer;

/// 普通引用键
#[key_type]
pub struct Key(String);

/// 带表名的引用键，形如 `Invoice.abc123`
#[key_type]
pub struct TableKey(String);

impl TableKey {
    /// 由表名与键拼接
    pub fn compose(table: &str, key: &str) -> Self {
        Self(format!("{table}.{key}"))
    }
}

/// 实体 `key` 字段的序列化：空串与缺省都输出为 `null`
pub fn serialize_key<S>(key: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match key.as_deref() {
        Some(k) if !k.is_empty() => serializer.serialize_some(k),
        _ => serializer.serialize_none(),
    }
}
