use ormspace_macros::key_type;
use std::collections::BTreeSet;

#[key_type]
struct ProjectKey(String);

fn main() {
    let key = ProjectKey::new("p-1".to_string());
    assert_eq!(key.to_string(), "p-1");
    assert_eq!(key.as_str(), "p-1");

    let parsed: ProjectKey = "p-1".parse().unwrap();
    assert_eq!(parsed, key);

    let set: BTreeSet<ProjectKey> = ["b", "a"].into_iter().map(ProjectKey::from).collect();
    assert_eq!(set.iter().next().map(ProjectKey::as_str), Some("a"));

    let raw: String = key.into();
    assert_eq!(raw, "p-1");
}
