//! 实体变体级配置
//!
//! 每个实体变体在注册时解析出一份 `EntityConfig`，由所有实例共享。
//! 通常由 `#[entity(...)]` 宏参数生成，也可手写 `Entity::config` 返回。
//!
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 存储层解释的查询描述：单个条件对象，或多个条件对象（任一匹配）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Query {
    Single(Map<String, Value>),
    Any(Vec<Map<String, Value>>),
}

/// 实体变体配置
#[derive(Builder, Default, Debug, Clone)]
pub struct EntityConfig {
    /// 单数名称覆盖
    singular: Option<&'static str>,
    /// 复数名称覆盖
    plural: Option<&'static str>,
    /// 表名覆盖
    table: Option<&'static str>,
    /// 额外依赖的实体名称
    #[builder(default)]
    extra_dependents: Vec<&'static str>,
    /// 存在性检查使用的字段
    #[builder(default)]
    exist_query: Vec<&'static str>,
    /// 拉取查询
    fetch_query: Option<Query>,
    /// 模型分组
    #[builder(default)]
    model_groups: Vec<&'static str>,
}

impl EntityConfig {
    pub fn singular(&self) -> Option<&'static str> {
        self.singular
    }

    pub fn plural(&self) -> Option<&'static str> {
        self.plural
    }

    pub fn table(&self) -> Option<&'static str> {
        self.table
    }

    pub fn extra_dependents(&self) -> &[&'static str] {
        &self.extra_dependents
    }

    pub fn exist_query(&self) -> &[&'static str] {
        &self.exist_query
    }

    pub fn fetch_query(&self) -> Option<&Query> {
        self.fetch_query.as_ref()
    }

    pub fn model_groups(&self) -> &[&'static str] {
        &self.model_groups
    }
}
