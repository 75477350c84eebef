use pretty_assertions::assert_eq;
use serde_json::json;

use super::{execute_request, run, star_wars};
use crate::{ExecutorConfig, Request};

async fn first_error(query: &str) -> String {
    let response = run(query).await;
    assert_eq!(response.get("data"), None, "{response}");
    response["errors"][0]["message"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn unknown_field() {
    insta::assert_snapshot!(first_error("{ starships }").await, @"Cannot query field 'starships' on type 'Query'.");
}

#[tokio::test]
async fn unknown_field_in_a_branch_that_resolves_to_null() {
    // `human` is null for this id, the selection is still checked.
    insta::assert_snapshot!(
        first_error(r#"{ human(id: "2001") { starships } }"#).await,
        @"Cannot query field 'starships' on type 'Human'."
    );
}

#[tokio::test]
async fn unknown_fragment() {
    insta::assert_snapshot!(first_error("{ ...Missing }").await, @"Unknown fragment named 'Missing'.");
}

#[tokio::test]
async fn fragment_cycle() {
    let query = r"
        { hero { ...A } }
        fragment A on Character { name ...B }
        fragment B on Character { id ...A }
    ";
    insta::assert_snapshot!(first_error(query).await, @"Fragment 'A' cannot spread itself.");
}

#[tokio::test]
async fn selection_sets_must_match_the_field_type() {
    insta::assert_snapshot!(
        first_error("{ numbers { x } }").await,
        @"Field 'numbers' must not have a selection since type '[Int!]!' has no subfields."
    );
    insta::assert_snapshot!(
        first_error("{ hero }").await,
        @"Field 'hero' of type 'Character' must have a selection of subfields."
    );
    insta::assert_snapshot!(
        first_error("{ __typename { x } }").await,
        @"Field '__typename' must not have a selection since type 'String!' has no subfields."
    );
}

#[tokio::test]
async fn unknown_type_condition() {
    insta::assert_snapshot!(first_error("{ ... on Starship { numbers } }").await, @"Unknown type 'Starship'.");
}

#[tokio::test]
async fn max_depth() {
    let config = ExecutorConfig {
        max_depth: Some(2),
        ..Default::default()
    };
    let schema = star_wars();

    let request = Request::parse("{ hero { name } }").unwrap();
    let response = execute_request(&schema, &config, request).await;
    assert_eq!(response, json!({ "data": { "hero": { "name": "R2-D2" } } }));

    let request = Request::parse("{ hero { friends { name } } }").unwrap();
    let response = execute_request(&schema, &config, request).await;
    insta::assert_json_snapshot!(response, @r###"
    {
      "errors": [
        {
          "message": "Query is nested too deep, the maximum depth is 2.",
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
async fn max_depth_counts_fragments() {
    let config = ExecutorConfig {
        max_depth: Some(2),
        ..Default::default()
    };
    let request = Request::parse("{ hero { ...Friends } } fragment Friends on Character { friends { name } }").unwrap();
    let response = execute_request(&star_wars(), &config, request).await;
    assert_eq!(
        response["errors"][0]["message"],
        "Query is nested too deep, the maximum depth is 2."
    );
}
