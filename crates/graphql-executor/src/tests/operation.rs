use pretty_assertions::assert_eq;
use serde_json::json;

use super::{execute_request, run, star_wars};
use crate::{ErrorCode, ExecutorConfig, FieldDefinition, ObjectType, Request, Schema};

#[tokio::test]
async fn single_anonymous_operation_is_selected() {
    let response = run("{ hero { name } }").await;
    assert_eq!(response, json!({ "data": { "hero": { "name": "R2-D2" } } }));
}

#[tokio::test]
async fn single_named_operation_needs_no_name() {
    let response = run("query HeroName { hero { name } }").await;
    assert_eq!(response, json!({ "data": { "hero": { "name": "R2-D2" } } }));
}

#[tokio::test]
async fn multiple_operations_require_a_name() {
    let response = run("query Numbers { numbers } query Hero { hero { name } }").await;
    insta::assert_json_snapshot!(response, @r###"
    {
      "errors": [
        {
          "message": "Must provide operation name if query contains multiple operations.",
          "extensions": {
            "code": "OPERATION_VALIDATION_ERROR"
          }
        }
      ]
    }
    "###);
}

#[tokio::test]
async fn operation_name_selects_among_many() {
    let request = Request::parse("query Numbers { numbers } query Hero { hero { name } }")
        .unwrap()
        .with_operation_name("Hero");
    let response = execute_request(&star_wars(), &ExecutorConfig::default(), request).await;
    assert_eq!(response, json!({ "data": { "hero": { "name": "R2-D2" } } }));
}

#[tokio::test]
async fn unknown_operation_name() {
    let request = Request::parse("query Numbers { numbers } query Hero { hero { name } }")
        .unwrap()
        .with_operation_name("Villain");
    let response = execute_request(&star_wars(), &ExecutorConfig::default(), request).await;
    assert_eq!(response["errors"][0]["message"], "Unknown operation named 'Villain'.");
    assert_eq!(response.get("data"), None);

    // An anonymous operation has no name to match.
    let request = Request::parse("{ numbers }").unwrap().with_operation_name("Numbers");
    let response = execute_request(&star_wars(), &ExecutorConfig::default(), request).await;
    assert_eq!(response["errors"][0]["message"], "Unknown operation named 'Numbers'.");
}

#[tokio::test]
async fn only_queries_are_executed() {
    let response = run("mutation { numbers }").await;
    insta::assert_json_snapshot!(response, @r###"
    {
      "errors": [
        {
          "message": "Can only execute queries, found a mutation operation.",
          "locations": [
            {
              "line": 1,
              "column": 1
            }
          ],
          "extensions": {
            "code": "OPERATION_VALIDATION_ERROR"
          }
        }
      ]
    }
    "###);
}

#[tokio::test]
async fn request_errors_are_returned_as_errors() {
    let request = Request::parse("subscription { numbers }").unwrap();
    let err = crate::execute(&star_wars(), request).await.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.code(), ErrorCode::OperationValidationError);
}

#[tokio::test]
async fn root_fields_read_the_root_value() {
    let schema = Schema::build("Query")
        .register(ObjectType::new("Query").field(FieldDefinition::new("greeting", "String")))
        .finish()
        .unwrap();
    let request = Request::parse("{ greeting }")
        .unwrap()
        .with_root_value(json!({ "greeting": "Hello there" }));

    let response = execute_request(&schema, &ExecutorConfig::default(), request).await;
    assert_eq!(response, json!({ "data": { "greeting": "Hello there" } }));
}

#[tokio::test]
async fn operation_name_is_exposed() {
    let request = Request::parse("query Hero { hero { name } }").unwrap();
    assert_eq!(request.operation_name(), None);
    let request = request.with_operation_name("Hero");
    assert_eq!(request.operation_name(), Some("Hero"));
}
