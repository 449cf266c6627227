//! Compiling whole operations: request locations, response variants and
//! their documentation projection.

use kanon_core::{fixtures, ContractError, FieldDesc, Kind, Location, SchemaError, TypeDesc};
use kanon_schema::{OperationContract, SchemaCompiler, StatusRegistry};
use serde_json::json;

fn create_user() -> OperationContract {
    OperationContract::new("createUser")
        .request_desc(fixtures::create_user_request())
        .response_desc("Created", fixtures::create_user_response())
        .response_desc(
            "Err",
            TypeDesc::record(
                "Problem",
                vec![FieldDesc::new(
                    "body",
                    TypeDesc::record(
                        "ProblemBody",
                        vec![FieldDesc::of::<String>("message").rules("required")],
                    ),
                )],
            ),
        )
}

#[test]
fn test_request_locations_in_binding_order() {
    let rules = SchemaCompiler::default().compile_operation(&create_user()).unwrap();
    assert_eq!(rules.operation_id(), "createUser");

    let locations: Vec<_> = rules.request().iter().map(|(location, _)| location).collect();
    assert_eq!(
        locations,
        vec![Location::Header, Location::Query, Location::Path, Location::Body]
    );

    let header = rules.request().get(Location::Header).unwrap();
    let request_id = header.property("x-request-id").unwrap();
    assert_eq!(request_id.binding(), "request_id");
    assert!(request_id.is_required());
    let names: Vec<_> = request_id.validators().iter().map(|v| v.name()).collect();
    assert_eq!(names, vec!["required", "uuid"]);

    assert!(rules.request().get(Location::Cookie).is_none());
}

#[test]
fn test_response_variants_resolve_by_status() {
    let rules = SchemaCompiler::default().compile_operation(&create_user()).unwrap();
    let statuses = StatusRegistry::default();

    let (variant, created) = rules.response_for_status(201, &statuses).unwrap();
    assert_eq!(variant, "Created");
    assert_eq!(created.get(Location::Body).unwrap().kind(), Kind::Struct);

    let (variant, _) = rules.response_for_status(503, &statuses).unwrap();
    assert_eq!(variant, "Err");

    let err = rules.response_for_status(204, &statuses).unwrap_err();
    assert!(matches!(err, ContractError::NoResponseRules { status: 204 }));
    assert_eq!(err.to_string(), "no matching response rules for status code 204");
}

#[test]
fn test_operation_without_request() {
    let contract = OperationContract::new("health").response_desc(
        "Ok",
        TypeDesc::record("Health", vec![FieldDesc::of::<String>("body")]),
    );
    let rules = SchemaCompiler::default().compile_operation(&contract).unwrap();
    assert!(rules.request().is_empty());
    assert_eq!(rules.variants().collect::<Vec<_>>(), vec!["Ok"]);
}

#[test]
fn test_bad_variant_fails_the_whole_operation() {
    let contract = create_user().response_desc(
        "Default",
        TypeDesc::record("Bad", vec![FieldDesc::of::<u32>("header")]),
    );
    let err = SchemaCompiler::default().compile_operation(&contract).unwrap_err();
    assert!(matches!(err, SchemaError::NotARecord { .. }));
}

#[test]
fn test_json_schema_of_request_body() {
    let rules = SchemaCompiler::default().compile_operation(&create_user()).unwrap();
    let body = rules.request().get(Location::Body).unwrap().to_json_schema();

    assert_eq!(body["type"], "object");
    assert_eq!(body["required"], json!(["name"]));
    assert_eq!(body["properties"]["name"]["maxLength"], 64);
    assert_eq!(body["properties"]["age"]["default"], 25);
    assert_eq!(body["properties"]["tags"]["type"], "array");
    assert_eq!(body["properties"]["tags"]["items"]["type"], "string");

    let query = rules.request().get(Location::Query).unwrap().to_json_schema();
    assert_eq!(query["properties"]["limit"]["maximum"], 100);
}
