use pretty_assertions::assert_eq;
use serde_json::json;

use super::{execute_request, star_wars};
use crate::{ExecutorConfig, Request};

#[test]
fn defaults() {
    let config: ExecutorConfig = toml::from_str("").unwrap();
    assert_eq!(config, ExecutorConfig::default());
    insta::assert_debug_snapshot!(config, @r###"
    ExecutorConfig {
        concurrency_limit: 32,
        max_depth: None,
    }
    "###);
}

#[test]
fn from_toml() {
    let config: ExecutorConfig = toml::from_str(
        r"
        concurrency_limit = 4
        max_depth = 10
        ",
    )
    .unwrap();

    assert_eq!(
        config,
        ExecutorConfig {
            concurrency_limit: 4,
            max_depth: Some(10),
        }
    );
}

#[test]
fn unknown_fields_are_rejected() {
    let error = toml::from_str::<ExecutorConfig>("max_concurrency = 4").unwrap_err();
    assert!(error.to_string().contains("unknown field `max_concurrency`"), "{error}");
}

#[tokio::test]
async fn zero_concurrency_still_executes() {
    let config: ExecutorConfig = serde_json::from_value(json!({ "concurrency_limit": 0 })).unwrap();
    let response = execute_request(&star_wars(), &config, Request::parse("{ numbers hero { name } }").unwrap()).await;
    assert_eq!(
        response,
        json!({ "data": { "numbers": [1, 2, 3], "hero": { "name": "R2-D2" } } })
    );
}
