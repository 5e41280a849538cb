use ormspace_domain::config::{EntityConfig, Query};
use ormspace_domain::entity;
use ormspace_domain::entity::Entity;
use ormspace_domain::error::EntityError;
use ormspace_domain::field::FieldDescriptor;
use ormspace_domain::keys::{Key, TableKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Barrier};
use std::thread;

#[entity]
struct Order {
    buyer_key: Key,
    seller: TableKey,
}

#[entity]
struct Shipment {
    order_key: Key,
    carrier: Option<TableKey>,
    parcel_keys: Vec<Key>,
}

// 注册时访问其他变体
#[entity(fetch_query = refunds_for_orders)]
struct Refund {
    order_key: Key,
}

fn refunds_for_orders() -> Query {
    let mut cond = Map::new();
    cond.insert("table".to_string(), Value::from(Order::table()));
    Query::Single(cond)
}

// 依赖泛型参数的字段无法确定类型
#[entity]
struct Envelope<T>
where
    T: Serialize + DeserializeOwned + Default + fmt::Debug + Send + Sync + 'static,
{
    label: String,
    payload: T,
    sender_key: Key,
}

// 手写实现：字段类型无法确定
#[derive(Debug, Default, Serialize, Deserialize)]
struct Opaque {
    key: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "opaque")
    }
}

impl Entity for Opaque {
    const NAME: &'static str = "Opaque";

    fn config() -> EntityConfig {
        EntityConfig::builder()
            .exist_query(vec!["payload", "missing"])
            .build()
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::resolved::<Option<String>>("key", "Option<String>"),
            FieldDescriptor::unresolved("payload", "T"),
        ]
    }

    fn key_slot(&self) -> &Option<String> {
        &self.key
    }

    fn key_slot_mut(&mut self) -> &mut Option<String> {
        &mut self.key
    }

    fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

#[test]
fn concurrent_first_access_registers_once() {
    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let registration = Shipment::registration();
                let refs = Shipment::reference_fields().unwrap();
                (
                    registration as *const _ as usize,
                    refs.as_ptr() as usize,
                )
            })
        })
        .collect();

    let results: Vec<(usize, usize)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(
        Shipment::reference_fields().unwrap(),
        &["order_key", "parcel_keys", "carrier"]
    );
}

#[test]
fn variants_do_not_share_cache_entries() {
    assert_eq!(Order::key_fields().unwrap(), &["buyer_key"]);
    assert_eq!(Shipment::key_fields().unwrap(), &["order_key", "parcel_keys"]);
    assert_eq!(Order::table_key_fields().unwrap(), &["seller"]);
    assert_eq!(Shipment::table_key_fields().unwrap(), &["carrier"]);
    assert!(!std::ptr::eq(Order::registration(), Shipment::registration()));
}

#[test]
fn registration_lists_declared_fields() {
    let names: Vec<&str> = Order::registration()
        .fields()
        .iter()
        .map(|f| f.name())
        .collect();
    assert_eq!(names, vec!["key", "buyer_key", "seller"]);
    assert_eq!(Order::registration().entity(), "Order");
}

#[test]
fn unresolvable_field_type_is_reported() {
    for result in [
        Opaque::key_fields(),
        Opaque::table_key_fields(),
        Opaque::reference_fields(),
    ] {
        match result.unwrap_err() {
            EntityError::UnresolvableFieldType {
                entity,
                field,
                type_name,
            } => {
                assert_eq!(entity, "Opaque");
                assert_eq!(field, "payload");
                assert_eq!(type_name, "T");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    // 命名不受影响
    assert_eq!(Opaque::table(), "Opaque");
    assert_eq!(Opaque::plural(), "Opaques");
}

#[test]
fn generic_field_is_unresolvable_through_macro() {
    match Envelope::<i64>::key_fields().unwrap_err() {
        EntityError::UnresolvableFieldType {
            entity,
            field,
            type_name,
        } => {
            assert_eq!(entity, "Envelope");
            assert_eq!(field, "payload");
            assert_eq!(type_name, "T");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(Envelope::<i64>::reference_fields().is_err());

    // 命名与序列化不受影响
    assert_eq!(Envelope::<i64>::table(), "Envelope");
    let envelope = Envelope {
        label: "parcel".to_string(),
        payload: 42_i64,
        ..Default::default()
    };
    let data = envelope.asjson().unwrap();
    assert_eq!(data["payload"], serde_json::json!(42));
    assert_eq!(data["label"], serde_json::json!("parcel"));
}

#[test]
fn generic_variants_register_separately() {
    assert!(!std::ptr::eq(
        Envelope::<i64>::registration(),
        Envelope::<String>::registration()
    ));
    let names: Vec<&str> = Envelope::<String>::registration()
        .fields()
        .iter()
        .map(|f| f.name())
        .collect();
    assert_eq!(names, vec!["key", "label", "payload", "sender_key"]);
}

#[test]
fn exist_query_rejects_undeclared_fields() {
    match Opaque::default().exist_query().unwrap_err() {
        EntityError::UnknownQueryField { entity, field } => {
            assert_eq!(entity, "Opaque");
            assert_eq!(field, "missing");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn config_may_read_other_variants() {
    let Some(Query::Single(cond)) = Refund::fetch_query() else {
        panic!("expected single condition");
    };
    assert_eq!(cond["table"], Value::from("Order"));
    assert_eq!(Refund::key_fields().unwrap(), &["order_key"]);
}
