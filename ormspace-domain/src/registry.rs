//! 实体变体注册表
//!
//! 以 `TypeId` 为键缓存每个实体变体的命名、配置与字段分类结果。
//! 每个变体首次访问时计算一次，之后只读；并发首次访问下也只初始化一次。
//!
use crate::config::EntityConfig;
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use crate::field::{FieldDescriptor, ReferenceFields};
use crate::text::slug;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{LazyLock, OnceLock};

type Cell = &'static OnceLock<Registration>;

static REGISTRY: LazyLock<DashMap<TypeId, Cell>> = LazyLock::new(DashMap::new);

/// 变体的派生名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    pub singular: String,
    pub plural: String,
    pub table: String,
    pub item_name: String,
    pub key_name: String,
}

impl Naming {
    fn resolve(type_name: &str, config: &EntityConfig) -> Self {
        let singular = config.singular().unwrap_or(type_name).to_string();
        let plural = match config.plural() {
            Some(p) => p.to_string(),
            None => format!("{singular}s"),
        };
        let table = config.table().unwrap_or(type_name).to_string();
        let item_name = slug(type_name);
        let key_name = format!("{item_name}_key");

        Self {
            singular,
            plural,
            table,
            item_name,
            key_name,
        }
    }
}

/// 单个实体变体的注册信息
#[derive(Debug)]
pub struct Registration {
    entity: &'static str,
    naming: Naming,
    config: EntityConfig,
    fields: Vec<FieldDescriptor>,
    references: Result<ReferenceFields, FieldDescriptor>,
}

impl Registration {
    fn build<E: Entity>() -> Self {
        let config = E::config();
        let naming = Naming::resolve(E::NAME, &config);
        let fields = E::fields();
        let references = ReferenceFields::classify(&fields);

        match &references {
            Ok(refs) => tracing::debug!(
                entity = E::NAME,
                table = %naming.table,
                fields = fields.len(),
                key_fields = ?refs.key_fields(),
                table_key_fields = ?refs.table_key_fields(),
                "entity registered"
            ),
            Err(field) => tracing::warn!(
                entity = E::NAME,
                field = field.name(),
                type_name = field.type_name(),
                "entity field type unresolvable"
            ),
        }

        Self {
            entity: E::NAME,
            naming,
            config,
            fields,
            references,
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    /// 声明字段（含 `key`，不含额外字段映射）
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn references(&self) -> EntityResult<&ReferenceFields> {
        self.references
            .as_ref()
            .map_err(|field| EntityError::UnresolvableFieldType {
                entity: self.entity,
                field: field.name(),
                type_name: field.type_name(),
            })
    }
}

/// 获取（必要时创建）实体变体的注册信息
pub fn registration<E: Entity>() -> &'static Registration {
    let id = TypeId::of::<E>();

    // 先只读查找；缺失时插入空 cell。初始化在分片锁之外进行，
    // 以免变体的 config/fields 访问其他变体时与同一分片发生死锁。
    let existing = REGISTRY.get(&id).map(|cell| *cell);
    let cell: Cell = match existing {
        Some(cell) => cell,
        None => *REGISTRY
            .entry(id)
            .or_insert_with(|| &*Box::leak(Box::new(OnceLock::new()))),
    };

    cell.get_or_init(Registration::build::<E>)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_defaults_from_type_name() {
        let naming = Naming::resolve("InvoiceItem", &EntityConfig::default());
        assert_eq!(naming.singular, "InvoiceItem");
        assert_eq!(naming.plural, "InvoiceItems");
        assert_eq!(naming.table, "InvoiceItem");
        assert_eq!(naming.item_name, "invoice_item");
        assert_eq!(naming.key_name, "invoice_item_key");
    }

    // 单数覆盖影响默认复数，但不影响表名与 item_name
    #[test]
    fn naming_singular_override() {
        let cfg = EntityConfig::builder().singular("Bill").build();
        let naming = Naming::resolve("Invoice", &cfg);
        assert_eq!(naming.singular, "Bill");
        assert_eq!(naming.plural, "Bills");
        assert_eq!(naming.table, "Invoice");
        assert_eq!(naming.item_name, "invoice");
    }

    #[test]
    fn naming_explicit_overrides() {
        let cfg = EntityConfig::builder()
            .singular("Person")
            .plural("People")
            .table("people")
            .build();
        let naming = Naming::resolve("Person", &cfg);
        assert_eq!(naming.plural, "People");
        assert_eq!(naming.table, "people");
    }
}
