use ormspace_domain::entity::Entity;
use ormspace_domain::keys::{Key, TableKey};
use ormspace_macros::entity;

#[entity]
struct InvoiceItem {
    description: String,
    invoice_key: Key,
    product: TableKey,
}

fn main() {
    let item = InvoiceItem::default();
    assert_eq!(item.key(), None);
    assert_eq!(InvoiceItem::item_name(), "invoice_item");
    assert_eq!(InvoiceItem::key_name(), "invoice_item_key");
    assert_eq!(InvoiceItem::key_fields().unwrap(), &["invoice_key"]);
    assert_eq!(InvoiceItem::table_key_fields().unwrap(), &["product"]);

    // 默认派生 Debug/Default/Serialize/Deserialize
    let _ = format!("{:?}", item);
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["key"], serde_json::Value::Null);
}
