//! 实体（Entity）基础抽象
//!
//! 每个持久化在键值文档库中的记录都是一个实体：知道自己的表名与标识（key），
//! 知道哪些字段引用其他记录，并能输出用于搜索/排序与持久化的形态。
//!
//! 变体级信息（命名、配置、字段分类）通过 [`registry`](crate::registry) 按类型缓存，
//! 实例只持有声明字段、`key` 与额外字段映射。
//!
use crate::config::{EntityConfig, Query};
use crate::error::{EntityError, EntityResult};
use crate::field::FieldDescriptor;
use crate::keys::TableKey;
use crate::registry::{self, Registration};
use crate::text::normalize_lower;
use serde::{Serialize, de::DeserializeOwned, ser::Error as _};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt::Display;

/// 搜索字符串在序列化结果中的字段名
pub const SEARCH_FIELD: &str = "search";

/// 计算字段（序列化时生成，不存储）
pub const COMPUTED_FIELDS: &[&str] = &[SEARCH_FIELD];

/// 具备表名、标识与引用字段分类的实体抽象
///
/// 通常通过 `#[entity]` 宏实现；宏负责注入 `key` 与 `extra` 字段并生成必需方法，
/// 其余方法均有默认实现。
pub trait Entity: Serialize + DeserializeOwned + Display + Send + Sync + 'static {
    /// 变体类型名
    const NAME: &'static str;

    /// 变体配置，注册时调用一次
    ///
    /// 在注册表初始化过程中执行：实现（包括 `fetch_query` 指定的函数）不得调用
    /// 本变体的 `table()`、`key_fields()` 等变体级方法，否则初始化重入，线程会永久阻塞。
    /// 访问其他变体不受影响。
    fn config() -> EntityConfig {
        EntityConfig::default()
    }

    /// 声明字段描述（按声明顺序），注册时调用一次
    fn fields() -> Vec<FieldDescriptor>;

    /// 原始 `key` 槽位
    fn key_slot(&self) -> &Option<String>;

    fn key_slot_mut(&mut self) -> &mut Option<String>;

    /// 未在声明中出现的额外字段
    fn extra(&self) -> &Map<String, Value>;

    fn extra_mut(&mut self) -> &mut Map<String, Value>;

    /// 自定义搜索字符串；返回 `None` 时使用显示字符串的归一化形式
    fn search_field(&self) -> Option<String> {
        None
    }

    /// 第一个无法序列化为 JSON 的声明字段
    fn unserializable_field(&self) -> Option<&'static str> {
        None
    }

    /// 第一个取值为 NaN/无穷的浮点声明字段（JSON 无法表示，serde_json 会写成 null）
    fn non_finite_field(&self) -> Option<&'static str> {
        None
    }

    // --- 变体级 ---

    fn registration() -> &'static Registration {
        registry::registration::<Self>()
    }

    fn singular() -> &'static str {
        &Self::registration().naming().singular
    }

    /// 未覆盖时为 `singular() + "s"`，不处理不规则复数
    fn plural() -> &'static str {
        &Self::registration().naming().plural
    }

    fn table() -> &'static str {
        &Self::registration().naming().table
    }

    fn item_name() -> &'static str {
        &Self::registration().naming().item_name
    }

    /// 其他实体引用本表时使用的字段名：`<item_name>_key`
    fn key_name() -> &'static str {
        &Self::registration().naming().key_name
    }

    fn extra_dependents() -> &'static [&'static str] {
        Self::registration().config().extra_dependents()
    }

    fn model_groups() -> &'static [&'static str] {
        Self::registration().config().model_groups()
    }

    fn fetch_query() -> Option<&'static Query> {
        Self::registration().config().fetch_query()
    }

    fn key_fields() -> EntityResult<&'static [&'static str]> {
        Ok(Self::registration().references()?.key_fields())
    }

    fn table_key_fields() -> EntityResult<&'static [&'static str]> {
        Ok(Self::registration().references()?.table_key_fields())
    }

    fn reference_fields() -> EntityResult<&'static [&'static str]> {
        Ok(Self::registration().references()?.reference_fields())
    }

    // --- 标识 ---

    /// 当前 key；空串视为未分配
    fn key(&self) -> Option<&str> {
        self.key_slot().as_deref().filter(|k| !k.is_empty())
    }

    /// 分配 key（只允许一次）
    fn set_key(&mut self, key: impl Into<String>) -> EntityResult<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(EntityError::EmptyKey {
                table: Self::table().to_string(),
            });
        }
        if let Some(existing) = self.key() {
            return Err(EntityError::KeyAlreadyAssigned {
                table: Self::table().to_string(),
                key: existing.to_string(),
            });
        }

        tracing::trace!(entity = Self::NAME, key = %key, "entity key assigned");
        *self.key_slot_mut() = Some(key);
        Ok(())
    }

    /// `<table>.<key>`；要求 key 已分配
    fn table_key(&self) -> EntityResult<TableKey> {
        match self.key() {
            Some(key) => Ok(TableKey::compose(Self::table(), key)),
            None => Err(EntityError::KeyNotAssigned {
                table: Self::table().to_string(),
            }),
        }
    }

    // --- 搜索与排序 ---

    fn search(&self) -> String {
        match self.search_field() {
            Some(search) => search,
            None => normalize_lower(&self.to_string()),
        }
    }

    /// 按归一化显示字符串比较
    fn display_cmp(&self, other: &Self) -> Ordering {
        normalize_lower(&self.to_string()).cmp(&normalize_lower(&other.to_string()))
    }

    // --- 序列化 ---

    /// 完整 JSON 形态（声明字段、额外字段与计算字段）
    ///
    /// 额外字段与声明字段、`key` 或计算字段同名时返回 `ExtraFieldConflict`；
    /// 浮点字段为 NaN/无穷时返回 `NonSerializableField`。
    fn asjson(&self) -> EntityResult<Map<String, Value>> {
        let fields = Self::registration().fields();
        if let Some(name) = self.extra().keys().find(|name| {
            fields.iter().any(|f| f.name() == name.as_str())
                || COMPUTED_FIELDS.contains(&name.as_str())
        }) {
            return Err(EntityError::ExtraFieldConflict {
                entity: Self::NAME,
                field: name.clone(),
            });
        }

        if let Some(field) = self.non_finite_field() {
            return Err(EntityError::NonSerializableField {
                entity: Self::NAME,
                field,
                source: serde_json::Error::custom("non-finite float has no JSON representation"),
            });
        }

        let text = serde_json::to_string(self).map_err(|source| match self.unserializable_field() {
            Some(field) => EntityError::NonSerializableField {
                entity: Self::NAME,
                field,
                source,
            },
            None => EntityError::Serde { source },
        })?;

        let mut data: Map<String, Value> = serde_json::from_str(&text)?;
        data.insert(SEARCH_FIELD.to_string(), Value::String(self.search()));
        Ok(data)
    }

    /// 仅保留声明字段与计算字段
    fn model_fields_asjson(&self) -> EntityResult<Map<String, Value>> {
        let fields = Self::registration().fields();
        let mut data = self.asjson()?;
        data.retain(|name, _| {
            fields.iter().any(|f| f.name() == name.as_str())
                || COMPUTED_FIELDS.contains(&name.as_str())
        });
        Ok(data)
    }

    /// 由 JSON 重建实例；输入中的计算字段会被丢弃
    fn from_json(value: Value) -> EntityResult<Self> {
        let mut entity: Self = serde_json::from_value(value)?;
        for name in COMPUTED_FIELDS {
            entity.extra_mut().remove(*name);
        }
        Ok(entity)
    }

    /// 由配置的存在性字段与当前值构造查询；未配置时为 `None`
    ///
    /// 配置中出现未声明的字段名时返回 `UnknownQueryField`。
    fn exist_query(&self) -> EntityResult<Option<Query>> {
        let registration = Self::registration();
        let fields = registration.config().exist_query();
        if fields.is_empty() {
            return Ok(None);
        }
        if let Some(unknown) = fields
            .iter()
            .find(|name| !registration.fields().iter().any(|f| f.name() == **name))
        {
            return Err(EntityError::UnknownQueryField {
                entity: Self::NAME,
                field: *unknown,
            });
        }

        let data = self.asjson()?;
        let query = fields
            .iter()
            .map(|f| (f.to_string(), data.get(*f).cloned().unwrap_or(Value::Null)))
            .collect();
        Ok(Some(Query::Single(query)))
    }
}

/// 按归一化显示字符串排序（稳定）
pub fn sort_by_display<E: Entity>(items: &mut [E]) {
    items.sort_by_cached_key(|e| normalize_lower(&e.to_string()));
}
