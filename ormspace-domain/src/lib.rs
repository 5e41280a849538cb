//! 键值文档库实体基础库（ormspace-domain）
//!
//! 为持久化在键值文档库中的记录提供统一的实体抽象：
//! - 实体（`entity`）：标识、命名推导、搜索字符串、排序与序列化
//! - 字段描述与引用字段分类（`field`），以及按变体缓存的注册表（`registry`）
//! - 变体级配置（`config`）与键类型（`keys`）
//! - 文本归一化（`text`）与统一错误（`error`）
//!
//! 本 crate 不包含数据库客户端、键字符串解析或查询语言，仅定义内存中的
//! 实体与其面向存储的键及引用字段之间的关系。
//!
//! 典型用法：
//! 1. 使用 `#[entity(...)]` 声明实体变体，引用字段使用 `Key` / `TableKey` 及其容器；
//! 2. 通过 `Entity::table`、`Entity::reference_fields` 等获取变体级信息；
//! 3. 持久化层使用 `asjson`/`model_fields_asjson` 写入，`from_json` 读取，`set_key` 回填标识。
//!
pub mod config;
pub mod entity;
pub mod error;
pub mod field;
pub mod keys;
pub mod registry;
pub mod text;

pub use ormspace_macros::entity;

// 允许在本 crate 内部通过 ::ormspace_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::ormspace_domain 路径。
extern crate self as ormspace_domain;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
