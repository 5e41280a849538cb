//! 实体层统一错误定义
//!
//! 覆盖标识（key）生命周期、字段分类与序列化三类最小必要集合，
//! 便于持久化层统一转换为 `EntityError`。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EntityError {
    // --- 标识 ---
    #[error("key not yet assigned: table={table}")]
    KeyNotAssigned { table: String },
    #[error("key already assigned: table={table}, key={key}")]
    KeyAlreadyAssigned { table: String, key: String },
    #[error("empty key: table={table}")]
    EmptyKey { table: String },

    // --- 字段分类 ---
    #[error("field type unresolvable: entity={entity}, field={field}, type={type_name}")]
    UnresolvableFieldType {
        entity: &'static str,
        field: &'static str,
        type_name: &'static str,
    },

    // --- 查询 ---
    #[error("unknown exist_query field: entity={entity}, field={field}")]
    UnknownQueryField {
        entity: &'static str,
        field: &'static str,
    },

    // --- 序列化 ---
    #[error("extra field shadows a model field: entity={entity}, field={field}")]
    ExtraFieldConflict { entity: &'static str, field: String },
    #[error("non-serializable field: entity={entity}, field={field}, reason={source}")]
    NonSerializableField {
        entity: &'static str,
        field: &'static str,
        source: serde_json::Error,
    },
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

/// 统一 Result 类型别名
pub type EntityResult<T> = Result<T, EntityError>;
