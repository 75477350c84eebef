use std::time::Duration;

use serde_json::{json, Value};

use crate::{
    error::ResolverError,
    schema::{
        EnumType, FieldDefinition, InputValueDefinition, InterfaceType, ObjectType, ResolvedValue, ResolverFuture, Schema,
        UnionType,
    },
    DirectiveLocation, DirectiveSpec, ExecutorConfig, Request, Response, ValueProducer, Variables,
};

mod config;
mod nullability;
mod operation;
mod validation;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn resolved(value: Value) -> Result<ResolvedValue, ResolverError> {
    Ok(value.into())
}

fn humans() -> Value {
    json!([
        {
            "id": "1000",
            "name": "Luke Skywalker",
            "friends": ["1002", "1003", "2000", "2001"],
            "appearsIn": ["NEWHOPE", "EMPIRE", "JEDI"],
            "homePlanet": "Tatooine"
        },
        {
            "id": "1001",
            "name": "Darth Vader",
            "friends": ["1004"],
            "appearsIn": ["NEWHOPE", "EMPIRE", "JEDI"],
            "homePlanet": "Tatooine"
        },
        {
            "id": "1002",
            "name": "Han Solo",
            "friends": ["1000", "1003", "2001"],
            "appearsIn": ["NEWHOPE", "EMPIRE", "JEDI"],
            "homePlanet": null
        },
        {
            "id": "1003",
            "name": "Leia Organa",
            "friends": ["1000", "1002", "2000", "2001"],
            "appearsIn": ["NEWHOPE", "EMPIRE", "JEDI"],
            "homePlanet": "Alderaan"
        },
        {
            "id": "1004",
            "name": "Wilhuff Tarkin",
            "friends": ["1001"],
            "appearsIn": ["NEWHOPE"],
            "homePlanet": null
        }
    ])
}

fn droids() -> Value {
    json!([
        {
            "id": "2000",
            "name": "C-3PO",
            "friends": ["1000", "1002", "1003", "2001"],
            "appearsIn": ["NEWHOPE", "EMPIRE", "JEDI"],
            "primaryFunction": "Protocol"
        },
        {
            "id": "2001",
            "name": "R2-D2",
            "friends": ["1000", "1002", "1003"],
            "appearsIn": ["NEWHOPE", "EMPIRE", "JEDI"],
            "primaryFunction": "Astromech"
        }
    ])
}

fn characters() -> Vec<Value> {
    let mut characters = Vec::new();
    for list in [humans(), droids()] {
        if let Value::Array(items) = list {
            characters.extend(items);
        }
    }
    characters
}

fn character(id: &str) -> Option<Value> {
    characters().into_iter().find(|character| character["id"] == id)
}

/// Droid ids start with a 2. Character values carry no `__typename` so that the interface
/// has to ask its type resolver.
fn character_type(value: &ResolvedValue) -> Option<String> {
    let id = value.get_field("id");
    let id = id.data_resolved().as_str()?;
    Some(if id.starts_with('2') { "Droid" } else { "Human" }.to_string())
}

fn friends() -> FieldDefinition {
    FieldDefinition::new("friends", "[Character]").resolve(|ctx| async move {
        let friends = ctx
            .parent
            .get_field("friends")
            .item_iter()
            .map(|ids| {
                ids.filter_map(|id| id.data_resolved().as_str().and_then(character))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        resolved(Value::Array(friends))
    })
}

fn human() -> ObjectType {
    ObjectType::new("Human")
        .implements("Character")
        .field(FieldDefinition::new("id", "ID!"))
        .field(FieldDefinition::new("name", "String"))
        .field(friends())
        .field(FieldDefinition::new("appearsIn", "[Episode]"))
        .field(FieldDefinition::new("homePlanet", "String"))
}

fn droid() -> ObjectType {
    ObjectType::new("Droid")
        .implements("Character")
        .field(FieldDefinition::new("id", "ID!"))
        .field(FieldDefinition::new("name", "String"))
        .field(friends())
        .field(FieldDefinition::new("appearsIn", "[Episode]"))
        .field(FieldDefinition::new("primaryFunction", "String"))
}

fn query() -> ObjectType {
    ObjectType::new("Query")
        .field(
            FieldDefinition::new("hero", "Character")
                .argument(InputValueDefinition::new("episode", "Episode"))
                .resolve(|ctx| async move {
                    let id = match ctx.arg::<String>("episode")?.as_deref() {
                        Some("EMPIRE") => "1000",
                        _ => "2001",
                    };
                    resolved(character(id).unwrap_or_default())
                }),
        )
        .field(
            FieldDefinition::new("human", "Human")
                .argument(InputValueDefinition::new("id", "ID!"))
                .resolve(|ctx| async move {
                    let id = ctx.arg::<String>("id")?.unwrap_or_default();
                    resolved(character(&id).filter(|_| !id.starts_with('2')).unwrap_or_default())
                }),
        )
        .field(
            FieldDefinition::new("droid", "Droid")
                .argument(InputValueDefinition::new("id", "ID!"))
                .resolve(|ctx| async move {
                    let id = ctx.arg::<String>("id")?.unwrap_or_default();
                    resolved(character(&id).filter(|_| id.starts_with('2')).unwrap_or_default())
                }),
        )
        .field(
            FieldDefinition::new("characters", "[Character!]!")
                .argument(InputValueDefinition::new("episode", "Episode"))
                .resolve(|ctx| async move {
                    let episode = ctx.arg::<String>("episode")?;
                    let characters = characters()
                        .into_iter()
                        .filter(|character| match &episode {
                            Some(episode) => character["appearsIn"]
                                .as_array()
                                .is_some_and(|episodes| episodes.iter().any(|e| e == episode.as_str())),
                            None => true,
                        })
                        .collect();
                    resolved(Value::Array(characters))
                }),
        )
        .field(
            FieldDefinition::new("search", "[SearchResult]")
                .argument(InputValueDefinition::new("text", "String!"))
                .resolve(|ctx| async move {
                    let text = ctx.arg::<String>("text")?.unwrap_or_default();
                    let results = characters()
                        .into_iter()
                        .filter(|character| character["name"].as_str().is_some_and(|name| name.contains(&text)))
                        .map(|mut character| {
                            let typename = if character.get("primaryFunction").is_some() {
                                "Droid"
                            } else {
                                "Human"
                            };
                            character["__typename"] = json!(typename);
                            character
                        })
                        .collect();
                    resolved(Value::Array(results))
                }),
        )
        .field(
            FieldDefinition::new("episode", "Episode!")
                .argument(InputValueDefinition::new("episode", "Episode!"))
                .resolve(|ctx| async move { resolved(json!(ctx.arg::<String>("episode")?)) }),
        )
        .field(FieldDefinition::new("numbers", "[Int!]!").resolve(|_| async { resolved(json!([1, 2, 3])) }))
        .field(FieldDefinition::new("brokenNumbers", "[Int!]").resolve(|_| async { resolved(json!([1, null, 3])) }))
        .field(FieldDefinition::new("sparseNumbers", "[Int]!").resolve(|_| async { resolved(json!([1, null, 3])) }))
        .field(FieldDefinition::new("root", "Root").resolve(|_| async { resolved(json!({ "name": "root" })) }))
        .field(
            FieldDefinition::new("failing", "String")
                .resolve(|_| async { Err::<ResolvedValue, _>(ResolverError::new("the resolver failed")) }),
        )
        .field(
            FieldDefinition::new("failingNonNull", "String!")
                .resolve(|_| async { Err::<ResolvedValue, _>(ResolverError::new("the resolver failed")) }),
        )
        .field(
            FieldDefinition::new("delayed", "String")
                .argument(InputValueDefinition::new("ms", "Int!"))
                .argument(InputValueDefinition::new("value", "String").with_default("done"))
                .resolve(|ctx| async move {
                    let ms = ctx.arg::<u64>("ms")?.unwrap_or_default();
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    resolved(json!(ctx.arg::<String>("value")?))
                }),
        )
        .field(
            FieldDefinition::new("echo", "String")
                .argument(InputValueDefinition::new("text", "String"))
                .argument(InputValueDefinition::new("times", "Int").with_default(1))
                .resolve(|ctx| async move {
                    let text = ctx.arg::<String>("text")?;
                    let times = ctx.arg::<usize>("times")?.unwrap_or(1);
                    resolved(json!(text.map(|text| text.repeat(times))))
                }),
        )
        .field(
            FieldDefinition::new("sum", "Int!")
                .argument(InputValueDefinition::new("values", "[Int!]!"))
                .resolve(|ctx| async move {
                    let values = ctx.arg::<Vec<i64>>("values")?.unwrap_or_default();
                    resolved(json!(values.iter().sum::<i64>()))
                }),
        )
}

/// Characters of the original trilogy and a few fields exercising the error paths.
pub(crate) fn star_wars_builder() -> crate::SchemaBuilder {
    Schema::build("Query")
        .register(EnumType::new("Episode", ["NEWHOPE", "EMPIRE", "JEDI"]))
        .register(
            InterfaceType::new("Character")
                .field(FieldDefinition::new("id", "ID!"))
                .field(FieldDefinition::new("name", "String"))
                .field(FieldDefinition::new("friends", "[Character]"))
                .field(FieldDefinition::new("appearsIn", "[Episode]"))
                .resolve_type(character_type),
        )
        .register(human())
        .register(droid())
        .register(UnionType::new("SearchResult").member("Human").member("Droid"))
        .register(
            ObjectType::new("Root")
                .field(FieldDefinition::new("name", "String"))
                .field(FieldDefinition::new("nonNullChild", "Child!"))
                .field(FieldDefinition::new("child", "Child").resolve(|_| async { resolved(json!({ "x": 1 })) })),
        )
        .register(ObjectType::new("Child").field(FieldDefinition::new("x", "Int")))
        .register(query())
        .directive(
            DirectiveSpec::new("upper", [DirectiveLocation::Field]).wrap_resolver(|producer, _, _| -> ValueProducer {
                Box::new(move || -> ResolverFuture {
                    Box::pin(async move {
                        let value = producer().await?;
                        resolved(match value.data_resolved() {
                            Value::String(s) => json!(s.to_uppercase()),
                            other => other.clone(),
                        })
                    })
                })
            }),
        )
}

pub(crate) fn star_wars() -> Schema {
    star_wars_builder().finish().unwrap()
}

pub(crate) async fn execute_request(schema: &Schema, config: &ExecutorConfig, request: Request) -> Value {
    init_logging();
    crate::execute_with_config(schema, config, request)
        .await
        .unwrap_or_else(Response::from)
        .into_json()
        .unwrap()
}

pub(crate) async fn run(query: &str) -> Value {
    run_with_variables(query, json!({})).await
}

pub(crate) async fn run_with_variables(query: &str, variables: Value) -> Value {
    let request = Request::parse(query)
        .unwrap()
        .with_variables(Variables::from_json(variables));
    execute_request(&star_wars(), &ExecutorConfig::default(), request).await
}
