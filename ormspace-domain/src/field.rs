//! 字段描述与引用字段分类
//!
//! 键形状集合是封闭的：只有声明类型与下列类型完全相同（`TypeId` 相等）的字段才算引用字段，
//! 不做子类型或结构匹配。新的键容器类型（例如 `VecDeque<Key>`）需要先加入 `RECOGNIZED`
//! 才会被识别。
//!
//! | 形状        | 普通引用                 | 带表名引用                    |
//! |-------------|--------------------------|-------------------------------|
//! | 单值        | `Key`                    | `TableKey`                    |
//! | 可选        | `Option<Key>`            | `Option<TableKey>`            |
//! | 序列        | `Vec<Key>`               | `Vec<TableKey>`               |
//! | 映射        | `HashMap<String, Key>`   | `HashMap<String, TableKey>`   |
//! | 映射        | `BTreeMap<String, Key>`  | `BTreeMap<String, TableKey>`  |
//!
use crate::keys::{Key, TableKey};
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// 引用类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// 指向表不固定的记录
    Key,
    /// 携带目标表名
    TableKey,
}

/// 键字段的容器形状
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyShape {
    Single,
    Optional,
    List,
    Map,
}

static RECOGNIZED: LazyLock<Vec<(TypeId, ReferenceKind, KeyShape)>> = LazyLock::new(|| {
    vec![
        (TypeId::of::<Key>(), ReferenceKind::Key, KeyShape::Single),
        (TypeId::of::<Option<Key>>(), ReferenceKind::Key, KeyShape::Optional),
        (TypeId::of::<Vec<Key>>(), ReferenceKind::Key, KeyShape::List),
        (TypeId::of::<HashMap<String, Key>>(), ReferenceKind::Key, KeyShape::Map),
        (TypeId::of::<BTreeMap<String, Key>>(), ReferenceKind::Key, KeyShape::Map),
        (TypeId::of::<TableKey>(), ReferenceKind::TableKey, KeyShape::Single),
        (TypeId::of::<Option<TableKey>>(), ReferenceKind::TableKey, KeyShape::Optional),
        (TypeId::of::<Vec<TableKey>>(), ReferenceKind::TableKey, KeyShape::List),
        (TypeId::of::<HashMap<String, TableKey>>(), ReferenceKind::TableKey, KeyShape::Map),
        (TypeId::of::<BTreeMap<String, TableKey>>(), ReferenceKind::TableKey, KeyShape::Map),
    ]
});

/// 声明字段描述，由 `#[entity]` 宏按声明顺序生成
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    name: &'static str,
    type_name: &'static str,
    type_id: Option<TypeId>,
}

impl FieldDescriptor {
    /// 类型可确定的字段
    pub fn resolved<T: ?Sized + 'static>(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            type_name,
            type_id: Some(TypeId::of::<T>()),
        }
    }

    /// 类型无法确定（依赖泛型参数）的字段
    pub fn unresolved(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            type_name,
            type_id: None,
        }
    }

    /// 序列化后的字段名
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 源码中书写的类型
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_resolved(&self) -> bool {
        self.type_id.is_some()
    }

    /// 若为键字段，返回其类别与形状
    pub fn reference(&self) -> Option<(ReferenceKind, KeyShape)> {
        let id = self.type_id?;
        RECOGNIZED
            .iter()
            .find(|(recognized, _, _)| *recognized == id)
            .map(|(_, kind, shape)| (*kind, *shape))
    }
}

/// 一个实体变体的引用字段分组
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFields {
    key_fields: Vec<&'static str>,
    table_key_fields: Vec<&'static str>,
    reference_fields: Vec<&'static str>,
}

impl ReferenceFields {
    /// 对声明字段分类；遇到类型无法确定的字段时返回该字段
    pub fn classify(fields: &[FieldDescriptor]) -> Result<Self, FieldDescriptor> {
        let mut key_fields = Vec::new();
        let mut table_key_fields = Vec::new();

        for field in fields {
            if !field.is_resolved() {
                return Err(*field);
            }
            match field.reference() {
                Some((ReferenceKind::Key, _)) => key_fields.push(field.name),
                Some((ReferenceKind::TableKey, _)) => table_key_fields.push(field.name),
                None => {}
            }
        }

        let reference_fields = key_fields
            .iter()
            .chain(table_key_fields.iter())
            .copied()
            .collect();

        Ok(Self {
            key_fields,
            table_key_fields,
            reference_fields,
        })
    }

    pub fn key_fields(&self) -> &[&'static str] {
        &self.key_fields
    }

    pub fn table_key_fields(&self) -> &[&'static str] {
        &self.table_key_fields
    }

    /// `key_fields` 在前，`table_key_fields` 在后
    pub fn reference_fields(&self) -> &[&'static str] {
        &self.reference_fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn sample() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::resolved::<Option<String>>("key", "Option<String>"),
            FieldDescriptor::resolved::<String>("name", "String"),
            FieldDescriptor::resolved::<TableKey>("owner", "TableKey"),
            FieldDescriptor::resolved::<Key>("customer_key", "Key"),
            FieldDescriptor::resolved::<Vec<Key>>("tags", "Vec<Key>"),
            FieldDescriptor::resolved::<Option<TableKey>>("parent", "Option<TableKey>"),
            FieldDescriptor::resolved::<BTreeMap<String, Key>>("roles", "BTreeMap<String, Key>"),
        ]
    }

    #[test]
    fn classify_keeps_declaration_order() {
        let refs = ReferenceFields::classify(&sample()).unwrap();
        assert_eq!(refs.key_fields(), &["customer_key", "tags", "roles"]);
        assert_eq!(refs.table_key_fields(), &["owner", "parent"]);
        assert_eq!(
            refs.reference_fields(),
            &["customer_key", "tags", "roles", "owner", "parent"]
        );
    }

    #[test]
    fn recognized_shapes() {
        let opt = FieldDescriptor::resolved::<Option<Key>>("a", "Option<Key>");
        assert_eq!(opt.reference(), Some((ReferenceKind::Key, KeyShape::Optional)));

        let map = FieldDescriptor::resolved::<HashMap<String, TableKey>>("b", "HashMap");
        assert_eq!(map.reference(), Some((ReferenceKind::TableKey, KeyShape::Map)));
    }

    // 封闭集合：其他容器不被识别
    #[test]
    fn unrecognized_wrappers_are_plain_fields() {
        let deque = FieldDescriptor::resolved::<VecDeque<Key>>("q", "VecDeque<Key>");
        let nested = FieldDescriptor::resolved::<Option<Vec<Key>>>("n", "Option<Vec<Key>>");
        let int_map = FieldDescriptor::resolved::<HashMap<u32, Key>>("m", "HashMap<u32, Key>");
        assert!(deque.reference().is_none());
        assert!(nested.reference().is_none());
        assert!(int_map.reference().is_none());
    }

    #[test]
    fn unresolved_field_is_an_error() {
        let fields = vec![
            FieldDescriptor::resolved::<String>("name", "String"),
            FieldDescriptor::unresolved("payload", "T"),
        ];
        let unresolved = ReferenceFields::classify(&fields).unwrap_err();
        assert_eq!(unresolved.name(), "payload");
        assert_eq!(unresolved.type_name(), "T");
        assert!(!unresolved.is_resolved());
    }
}
