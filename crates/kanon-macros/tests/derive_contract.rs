//! Derived contracts through the compiler, binder and encoder.

use kanon_core::{Contract, FromValue, Kind, Location, StructView, Value};
use kanon_extract::{Binder, Encoder, LazyJson};
use kanon_macros::Contract;
use kanon_schema::SchemaCompiler;

#[derive(Debug, Clone, PartialEq, Contract)]
struct Address {
    #[kanon(rules = "required")]
    city: String,
    #[kanon(wire = "zip", omit_empty)]
    postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Contract)]
struct Account {
    #[kanon(rules = "required,min=2,max=64")]
    name: String,
    #[kanon(default = "25")]
    age: u8,
    #[kanon(rules = "oneof=free pro")]
    plan: String,
    addresses: Vec<Address>,
    #[kanon(skip)]
    session: Option<String>,
    #[kanon(vendor = "x-internal")]
    r#type: String,
}

fn rule() -> kanon_schema::FieldRule {
    SchemaCompiler::default().compile_type(&Account::describe()).unwrap()
}

#[test]
fn test_describe_matches_declaration() {
    let rule = rule();
    assert_eq!(rule.kind(), Kind::Struct);
    let keys: Vec<_> = rule.properties().keys().cloned().collect();
    assert_eq!(keys, vec!["name", "age", "plan", "addresses", "type"]);
    assert!(rule.property("name").unwrap().is_required());

    let address = rule.property("addresses").unwrap().item().unwrap();
    assert!(address.property("zip").unwrap().omits_empty());
    assert_eq!(address.property("zip").unwrap().binding(), "postal_code");

    let raw = rule.property("type").unwrap().annotations();
    assert_eq!(raw.get("vendor"), Some(&vec!["x-internal".to_string()]));
}

#[test]
fn test_struct_view_exposes_bindings() {
    let account = Account {
        name: "Ann".into(),
        age: 30,
        plan: "pro".into(),
        addresses: vec![],
        session: Some("secret".into()),
        r#type: "person".into(),
    };
    assert!(account.field("session").is_none());
    assert!(account.field("type").is_some());
    let names: Vec<_> = account.fields().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["name", "age", "plan", "addresses", "type"]);
}

#[test]
fn test_bind_into_derived_type() {
    let document = LazyJson::parse(
        r#"{"name": "Ann", "plan": "free", "type": "person",
            "addresses": [{"city": "Oslo", "zip": "0150"}, {"city": "Bergen"}]}"#,
    )
    .unwrap();
    let bound = Binder::default()
        .walk(&rule(), &document, Location::Body, true)
        .unwrap()
        .unwrap();
    let account = Account::from_value(bound).unwrap();
    assert_eq!(account.age, 25);
    assert_eq!(account.session, None);
    assert_eq!(
        account.addresses,
        vec![
            Address {
                city: "Oslo".into(),
                postal_code: Some("0150".into())
            },
            Address {
                city: "Bergen".into(),
                postal_code: None
            },
        ]
    );
}

#[test]
fn test_validation_errors_carry_paths() {
    let document = LazyJson::parse(
        r#"{"name": "A", "plan": "gold", "type": "x", "addresses": [{"zip": "1"}]}"#,
    )
    .unwrap();
    let errors = Binder::default()
        .walk(&rule(), &document, Location::Body, true)
        .unwrap_err();
    let mut found: Vec<_> = errors
        .iter()
        .map(|e| format!("{}:{}", e.field_path, e.rule))
        .collect();
    found.sort();
    assert_eq!(found, vec!["addresses.0.city:required", "name:min", "plan:oneof"]);
}

#[test]
fn test_encode_derived_value() {
    let account = Account {
        name: "Ann".into(),
        age: 30,
        plan: "pro".into(),
        addresses: vec![Address {
            city: "Oslo".into(),
            postal_code: None,
        }],
        session: Some("secret".into()),
        r#type: "person".into(),
    };
    let body = Encoder::default().encode_json(&rule(), &account).unwrap();
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        r#"{"name":"Ann","age":30,"plan":"pro","addresses":[{"city":"Oslo"}],"type":"person"}"#
    );
}

#[test]
fn test_from_value_rejects_wrong_shape() {
    assert!(Account::from_value(Value::from("nope")).is_err());
}

#[derive(Debug, Contract)]
struct Session {
    #[kanon(wire = "sid")]
    cookie: kanon_core::Cookie,
}

#[test]
fn test_from_absent_builds_members_from_their_empty_state() {
    assert_eq!(
        Address::from_absent(),
        Ok(Address {
            city: String::new(),
            postal_code: None,
        })
    );
    let account = Account::from_absent().unwrap();
    assert!(account.addresses.is_empty());
    assert_eq!(account.session, None);

    let err = Session::from_absent().unwrap_err();
    assert!(err.to_string().contains("member 'cookie': missing value"));
}
