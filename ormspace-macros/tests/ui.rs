#[test]
fn ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/entity_basic.rs");
    t.pass("tests/ui/entity_options.rs");
    t.pass("tests/ui/key_type_basic.rs");
}
