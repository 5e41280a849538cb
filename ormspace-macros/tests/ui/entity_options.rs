use ormspace_domain::config::Query;
use ormspace_domain::entity::Entity;
use ormspace_domain::keys::Key;
use ormspace_macros::entity;
use std::fmt;

fn active() -> Query {
    Query::Any(vec![serde_json::Map::new()])
}

#[entity(
    singular = "Client",
    plural = "Clientele",
    table = "clients",
    extra_dependents = ["Invoice"],
    exist_query = ["code"],
    fetch_query = active,
    groups = ["crm", "billing"],
    search = search_text,
    display = false,
    debug = false,
    ord = true
)]
#[derive(Clone, PartialEq)]
struct Customer {
    code: String,
    #[serde(rename = "displayName")]
    display_name: String,
    referrer_key: Option<Key>,
}

impl Customer {
    fn search_text(&self) -> String {
        self.code.to_lowercase()
    }
}

impl fmt::Debug for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Customer(..)")
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

fn main() {
    assert_eq!(Customer::singular(), "Client");
    assert_eq!(Customer::plural(), "Clientele");
    assert_eq!(Customer::table(), "clients");
    assert_eq!(Customer::extra_dependents(), &["Invoice"]);
    assert_eq!(Customer::model_groups(), &["crm", "billing"]);
    assert!(Customer::fetch_query().is_some());

    let customer = Customer {
        code: "ACME".to_string(),
        display_name: "Acme Corp".to_string(),
        ..Default::default()
    };
    assert_eq!(customer.search(), "acme");
    assert_eq!(format!("{:?}", customer.clone()), "Customer(..)");

    let other = Customer {
        display_name: "beta".to_string(),
        ..Default::default()
    };
    assert!(customer < other);

    let model = customer.model_fields_asjson().unwrap();
    assert!(model.contains_key("displayName"));
    assert_eq!(Customer::key_fields().unwrap(), &["referrer_key"]);
}
