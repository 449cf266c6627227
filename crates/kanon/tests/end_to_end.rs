//! Whole operations through the engine: register, bind, handle, encode.

use kanon::prelude::*;
use kanon_config::{CodecConfig, ValidationConfig};
use kanon_core::fixtures::{money_format, Money};
use kanon_core::rules::rule_fn;
use kanon_core::{RuleContext, RuleFn, RuleViolation, View};

#[derive(Debug, Contract)]
struct CreateOrderHeader {
    #[kanon(wire = "x-request-id", rules = "required,uuid")]
    request_id: String,
}

#[derive(Debug, Contract)]
struct CreateOrderQuery {
    dry_run: bool,
    #[kanon(default = "10", rules = "max=100")]
    limit: u32,
}

#[derive(Debug, Contract)]
struct CreateOrderPath {
    #[kanon(rules = "required")]
    org_id: u64,
}

#[derive(Debug, Clone, PartialEq, Contract)]
struct Order {
    #[kanon(rules = "required,min=2,sku")]
    sku: String,
    #[kanon(default = "1")]
    quantity: u16,
    #[kanon(omit_empty)]
    note: Option<String>,
    #[kanon(omit_empty)]
    tags: Vec<String>,
}

#[derive(Debug, Contract)]
struct CreateOrderRequest {
    header: CreateOrderHeader,
    query: CreateOrderQuery,
    path: CreateOrderPath,
    body: Order,
}

#[derive(Debug, Contract)]
struct CreatedHeader {
    #[kanon(wire = "Location", rules = "required")]
    location: String,
}

#[derive(Debug, Contract)]
struct OrderCreated {
    header: CreatedHeader,
    body: Order,
}

#[derive(Debug, Contract)]
struct ProblemBody {
    #[kanon(rules = "required")]
    message: String,
}

#[derive(Debug, Contract)]
struct Problem {
    body: ProblemBody,
}

#[derive(Debug, Contract)]
struct Quote {
    #[kanon(spec = "money", rules = "required")]
    price: Money,
}

#[derive(Debug, Contract)]
struct QuoteRequest {
    body: Quote,
}

#[derive(Debug, Contract)]
struct Filter {
    #[kanon(default = "20")]
    limit: u32,
    owner: Option<String>,
    tags: Vec<String>,
}

#[derive(Debug, Contract)]
struct SearchRequest {
    body: Filter,
}

#[derive(Debug, Contract)]
struct Starts {
    #[kanon(rules = "required")]
    gain: i64,
}

#[derive(Debug, Contract)]
struct Item {
    name: String,
    starts: Starts,
}

#[derive(Debug, Contract)]
struct ItemRequest {
    body: Item,
}

#[derive(Debug, Contract)]
struct Tip {
    #[kanon(spec = "money")]
    amount: Money,
}

#[derive(Debug, Contract)]
struct TipRequest {
    body: Tip,
}

const REQUEST_ID: &str = "0190b0a4-7c5e-7000-8000-000000000001";

fn sku_rule(_: &RuleContext<'_>) -> Result<RuleFn, kanon_core::RuleBuildError> {
    Ok(rule_fn(|view| match view {
        View::Str(s) if s.starts_with("SKU-") => Ok(()),
        View::Str(s) => Err(RuleViolation::failed(format!("'{s}' is not a SKU"))),
        other => Err(RuleViolation::wrong_type("string", &other)),
    }))
}

fn engine_with(config: KanonConfig) -> Engine {
    Engine::builder()
        .config(config)
        .rule("sku", sku_rule)
        .format(money_format())
        .build()
}

fn create_order(engine: &Engine) -> Operation {
    engine
        .register(
            OperationContract::new("createOrder")
                .request::<CreateOrderRequest>()
                .response::<OrderCreated>("Created")
                .response::<Problem>("Err"),
        )
        .unwrap()
}

fn order_request(body: &str) -> RequestData {
    RequestData::builder()
        .uri("/orgs/7/orders?dry_run=true")
        .header("x-request-id", REQUEST_ID)
        .header("content-type", "application/json")
        .path_param("org_id", "7")
        .body(body.to_string())
        .build()
}

fn created(location: &str, order: Order) -> Value {
    let mut header = indexmap::IndexMap::new();
    header.insert("location".to_string(), Value::from(location));
    let mut response = indexmap::IndexMap::new();
    response.insert("header".to_string(), Value::Struct(header));
    response.insert("body".to_string(), order_value(&order));
    Value::Struct(response)
}

fn order_value(order: &Order) -> Value {
    let mut body = indexmap::IndexMap::new();
    body.insert("sku".to_string(), Value::from(order.sku.as_str()));
    body.insert("quantity".to_string(), Value::Uint(u64::from(order.quantity)));
    if let Some(note) = &order.note {
        body.insert("note".to_string(), Value::from(note.as_str()));
    }
    Value::Struct(body)
}

#[test]
fn test_bind_into_typed_request() {
    let engine = engine_with(KanonConfig::default());
    let operation = create_order(&engine);

    let request: CreateOrderRequest = operation
        .bind_into(&order_request(r#"{"sku": "SKU-1", "tags": ["gift"]}"#))
        .unwrap();
    assert_eq!(request.header.request_id, REQUEST_ID);
    assert!(request.query.dry_run);
    assert_eq!(request.query.limit, 10);
    assert_eq!(request.path.org_id, 7);
    assert_eq!(request.body.quantity, 1);
    assert_eq!(request.body.note, None);
    assert_eq!(request.body.tags, vec!["gift".to_string()]);
}

#[test]
fn test_omitted_optional_data_binds() {
    let engine = engine_with(KanonConfig::default());
    let operation = engine
        .register(OperationContract::new("search").request::<SearchRequest>())
        .unwrap();

    let request: SearchRequest = operation.bind_into(&RequestData::builder().build()).unwrap();
    assert_eq!(request.body.limit, 20);
    assert_eq!(request.body.owner, None);
    assert!(request.body.tags.is_empty());

    let request: SearchRequest = operation
        .bind_into(
            &RequestData::builder()
                .header("content-type", "application/json")
                .body("{}")
                .build(),
        )
        .unwrap();
    assert_eq!(request.body.limit, 20);
}

#[test]
fn test_omitted_nested_record_is_a_client_error() {
    let engine = engine_with(KanonConfig::default());
    let operation = engine
        .register(OperationContract::new("addItem").request::<ItemRequest>())
        .unwrap();
    let request = |body: &str| {
        RequestData::builder()
            .header("content-type", "application/json")
            .body(body.to_string())
            .build()
    };

    let err = operation
        .bind_into::<ItemRequest>(&request(r#"{"name": "x"}"#))
        .unwrap_err();
    assert!(matches!(err, ContractError::Request(_)));
    assert_eq!(err.status_code(), 400);
    let error = err.validation_errors().unwrap().iter().next().unwrap().clone();
    assert_eq!((error.field_path.as_str(), error.rule.as_str()), ("starts.gain", "required"));

    let item: ItemRequest = operation
        .bind_into(&request(r#"{"name": "x", "starts": {"gain": 3}}"#))
        .unwrap();
    assert_eq!(item.body.starts.gain, 3);
}

#[test]
fn test_leaf_without_empty_state_must_be_sent() {
    let engine = engine_with(KanonConfig::default());
    let operation = engine
        .register(OperationContract::new("tip").request::<TipRequest>())
        .unwrap();

    let err = operation
        .bind_into::<TipRequest>(
            &RequestData::builder()
                .header("content-type", "application/json")
                .body("{}")
                .build(),
        )
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    let error = err.validation_errors().unwrap().iter().next().unwrap().clone();
    assert_eq!((error.field_path.as_str(), error.rule.as_str()), ("amount", "required"));
}

#[test]
fn test_request_failures_map_to_bad_request() {
    let operation = create_order(&engine_with(KanonConfig::default()));

    let err = operation
        .bind(&order_request(r#"{"sku": "ABC", "quantity": 70000}"#))
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    let errors = err.validation_errors().unwrap();
    let found: Vec<_> = errors.iter().map(|e| (e.field_path.as_str(), e.rule.as_str())).collect();
    assert!(found.contains(&("sku", "sku")));
    assert!(found.contains(&("quantity", "rangeError")));

    let envelope = err.to_envelope(Some(REQUEST_ID));
    assert_eq!(envelope.error.code, "REQUEST_VALIDATION_FAILED");
    assert!(envelope.error.details.is_some());
    assert_eq!(envelope.request_id.as_deref(), Some(REQUEST_ID));
}

#[test]
fn test_first_failing_location_stops_binding() {
    let operation = create_order(&engine_with(KanonConfig::default()));
    let request = RequestData::builder()
        .uri("/orgs/7/orders?limit=500")
        .header("content-type", "application/json")
        .path_param("org_id", "7")
        .body(r#"{"sku": "x"}"#)
        .build();

    let err = operation.validate(&request).unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert!(errors.iter().all(|e| e.location == Location::Header));
    assert_eq!(errors.iter().next().unwrap().rule, "required");
}

#[test]
fn test_transport_errors() {
    let operation = create_order(&engine_with(KanonConfig::default()));

    let request = RequestData::builder()
        .uri("/orgs/7/orders")
        .header("x-request-id", REQUEST_ID)
        .header("content-type", "text/xml")
        .path_param("org_id", "7")
        .body("<order/>")
        .build();
    let err = operation.bind(&request).unwrap_err();
    assert!(matches!(err, ContractError::UnsupportedMediaType { .. }));
    assert_eq!(err.status_code(), 415);

    let small = KanonConfig::builder()
        .codec(CodecConfig {
            max_body_bytes: 8,
            ..Default::default()
        })
        .build();
    let operation = create_order(&engine_with(small));
    let err = operation
        .bind(&order_request(r#"{"sku": "SKU-123456"}"#))
        .unwrap_err();
    assert!(matches!(err, ContractError::PayloadTooLarge { limit: 8, .. }));
    assert_eq!(err.status_code(), 413);
}

#[test]
fn test_form_body_binds_like_json() {
    let operation = create_order(&engine_with(KanonConfig::default()));
    let request = RequestData::builder()
        .uri("/orgs/7/orders")
        .header("x-request-id", REQUEST_ID)
        .header("content-type", "application/x-www-form-urlencoded")
        .path_param("org_id", "7")
        .body("sku=SKU-9&quantity=3&tags=a&tags=b")
        .build();
    let request: CreateOrderRequest = operation.bind_into(&request).unwrap();
    assert_eq!(request.body.quantity, 3);
    assert_eq!(request.body.tags, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_encode_created_response() {
    let operation = create_order(&engine_with(KanonConfig::default()));
    let order = Order {
        sku: "SKU-1".into(),
        quantity: 2,
        note: Some("fragile".into()),
        tags: vec![],
    };

    let encoded = operation
        .encode_response(201, &created("/orders/1", order.clone()), None)
        .unwrap();
    assert_eq!(encoded.headers, vec![("Location".to_string(), "/orders/1".to_string())]);
    assert_eq!(encoded.content_type.as_deref(), Some("application/json"));
    let body: serde_json::Value = serde_json::from_slice(&encoded.body).unwrap();
    assert_eq!(body, serde_json::json!({"sku": "SKU-1", "quantity": 2, "note": "fragile"}));

    let encoded = operation
        .encode_response(
            201,
            &created("/orders/1", order),
            Some("application/x-www-form-urlencoded"),
        )
        .unwrap();
    assert_eq!(
        encoded.content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(&encoded.body[..], b"sku=SKU-1&quantity=2&note=fragile");
}

#[test]
fn test_status_falls_back_to_range_variant() {
    let operation = create_order(&engine_with(KanonConfig::default()));
    let mut body = indexmap::IndexMap::new();
    body.insert("message".to_string(), Value::from("out of stock"));
    let mut problem = indexmap::IndexMap::new();
    problem.insert("body".to_string(), Value::Struct(body));

    let encoded = operation
        .encode_response(422, &Value::Struct(problem), None)
        .unwrap();
    assert_eq!(&encoded.body[..], br#"{"message":"out of stock"}"#);
    assert!(encoded.headers.is_empty());
}

#[test]
fn test_response_contract_violation_is_a_server_error() {
    let operation = create_order(&engine_with(KanonConfig::default()));
    let order = Order {
        sku: "SKU-1".into(),
        quantity: 1,
        note: None,
        tags: vec![],
    };

    let err = operation
        .encode_response(201, &created("", order), None)
        .unwrap_err();
    assert!(matches!(err, ContractError::Response(_)));
    assert_eq!(err.status_code(), 500);
    let envelope = err.to_envelope(None);
    assert_eq!(envelope.error.code, "RESPONSE_VALIDATION_FAILED");
    assert!(envelope.error.details.is_none());
}

#[test]
fn test_validation_switches() {
    let config = KanonConfig::builder()
        .validation(ValidationConfig {
            validate_requests: false,
            validate_responses: false,
        })
        .build();
    let operation = create_order(&engine_with(config));

    let request = RequestData::builder()
        .uri("/orgs/7/orders")
        .header("content-type", "application/json")
        .path_param("org_id", "7")
        .body(r#"{"sku": "x"}"#)
        .build();
    assert!(operation.validate(&request).is_ok());

    // Coercion still runs with validation off.
    let bad = order_request(r#"{"sku": "SKU-1", "quantity": "many"}"#);
    assert!(operation.validate(&bad).is_err());

    let order = Order {
        sku: "x".into(),
        quantity: 1,
        note: None,
        tags: vec![],
    };
    assert!(operation.encode_response(201, &created("", order), None).is_ok());
}

#[test]
fn test_custom_format_through_engine() {
    let engine = engine_with(KanonConfig::default());
    let operation = engine
        .register(OperationContract::new("quote").request::<QuoteRequest>())
        .unwrap();

    let request = RequestData::builder()
        .header("content-type", "application/json")
        .body(r#"{"price": "12.50 EUR"}"#)
        .build();
    let quote: QuoteRequest = operation.bind_into(&request).unwrap();
    assert_eq!(quote.body.price.cents, 1250);
    assert_eq!(quote.body.price.currency, "EUR");

    let bad = RequestData::builder()
        .header("content-type", "application/json")
        .body(r#"{"price": "twelve"}"#)
        .build();
    let err = operation.bind(&bad).unwrap_err();
    assert_eq!(err.validation_errors().unwrap().iter().next().unwrap().field_path, "price");
}

#[test]
fn test_concurrent_walks_share_one_operation() {
    let operation = create_order(&engine_with(KanonConfig::default()));

    std::thread::scope(|scope| {
        for i in 0..8u16 {
            let operation = &operation;
            scope.spawn(move || {
                let body = format!(r#"{{"sku": "SKU-{i}", "quantity": {i}}}"#);
                let request: CreateOrderRequest =
                    operation.bind_into(&order_request(&body)).unwrap();
                assert_eq!(request.body.quantity, i);

                let encoded = operation
                    .encode_response(201, &created("/orders/1", request.body.clone()), None)
                    .unwrap();
                let text = std::str::from_utf8(&encoded.body).unwrap().to_string();
                assert!(text.contains(&format!("\"SKU-{i}\"")));
            });
        }
    });
}
