use pretty_assertions::assert_eq;
use serde_json::json;

use super::run;

#[tokio::test]
async fn null_bubbles_to_the_nearest_nullable_ancestor() {
    let response = run("{ root { nonNullChild { x } } }").await;
    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "root": null
      },
      "errors": [
        {
          "message": "Cannot return null for non-nullable field Root.nonNullChild.",
          "locations": [
            {
              "line": 1,
              "column": 10
            }
          ],
          "path": [
            "root",
            "nonNullChild"
          ],
          "extensions": {
            "code": "RESOLVER_ERROR"
          }
        }
      ]
    }
    "###);
}

#[tokio::test]
async fn siblings_of_a_nulled_subtree_are_kept() {
    let response = run("{ numbers root { name child { x } nonNullChild { x } } hero { name } }").await;
    assert_eq!(response["data"], json!({ "numbers": [1, 2, 3], "root": null, "hero": { "name": "R2-D2" } }));
    assert_eq!(response["errors"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn resolver_error_on_a_nullable_field() {
    let response = run("{ failing numbers }").await;
    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "failing": null,
        "numbers": [
          1,
          2,
          3
        ]
      },
      "errors": [
        {
          "message": "the resolver failed",
          "locations": [
            {
              "line": 1,
              "column": 3
            }
          ],
          "path": [
            "failing"
          ],
          "extensions": {
            "code": "RESOLVER_ERROR"
          }
        }
      ]
    }
    "###);
}

#[tokio::test]
async fn resolver_error_on_a_non_null_root_field_nulls_data() {
    let response = run("{ numbers failingNonNull }").await;
    assert_eq!(response["data"], json!(null));
    assert_eq!(response["errors"][0]["message"], "the resolver failed");
    assert_eq!(response["errors"][0]["path"], json!(["failingNonNull"]));
}

#[tokio::test]
async fn list_keeps_the_resolver_order() {
    let response = run("{ numbers }").await;
    assert_eq!(response, json!({ "data": { "numbers": [1, 2, 3] } }));
}

#[tokio::test]
async fn null_item_in_a_list_of_non_null_items() {
    let response = run("{ brokenNumbers sparseNumbers }").await;
    assert_eq!(
        response,
        json!({
            "data": { "brokenNumbers": null, "sparseNumbers": [1, null, 3] },
            "errors": [{
                "message": "Cannot return null for non-nullable field Query.brokenNumbers.",
                "locations": [{ "line": 1, "column": 3 }],
                "path": ["brokenNumbers", 1],
                "extensions": { "code": "RESOLVER_ERROR" }
            }]
        })
    );
}

#[tokio::test]
async fn errors_follow_the_field_order() {
    let response = run("{ a: failing root { nonNullChild { x } } b: failing }").await;
    let paths = response["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|error| error["path"].clone())
        .collect::<Vec<_>>();
    assert_eq!(paths, [json!(["a"]), json!(["root", "nonNullChild"]), json!(["b"])]);
}

#[tokio::test]
async fn leaf_that_cannot_be_serialized() {
    let schema = crate::Schema::build("Query")
        .register(
            crate::ObjectType::new("Query")
                .field(crate::FieldDefinition::new("count", "Int"))
                .field(crate::FieldDefinition::new("total", "Int!")),
        )
        .finish()
        .unwrap();
    let request = crate::Request::parse("{ count total }")
        .unwrap()
        .with_root_value(json!({ "count": "many", "total": 1.5 }));
    let response = super::execute_request(&schema, &crate::ExecutorConfig::default(), request).await;

    assert_eq!(response["data"], json!(null));
    assert_eq!(response["errors"][0]["message"], r#"Int cannot represent value: "many""#);
    assert_eq!(response["errors"][1]["message"], "Int cannot represent value: 1.5");
}
