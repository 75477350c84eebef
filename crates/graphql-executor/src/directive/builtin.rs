use async_graphql_value::ConstValue;

use super::{DirectiveLocation, DirectiveSpec};
use crate::schema::{ArgumentValues, InputValueDefinition};

const LOCATIONS: [DirectiveLocation; 3] = [
    DirectiveLocation::Field,
    DirectiveLocation::FragmentSpread,
    DirectiveLocation::InlineFragment,
];

pub(super) fn skip() -> DirectiveSpec {
    DirectiveSpec::new("skip", LOCATIONS)
        .description("Directs the executor to skip this field or fragment when the `if` argument is true.")
        .argument(InputValueDefinition::new("if", "Boolean!").with_description("Skipped when true."))
        .include_if(|arguments, _| condition(arguments).map(|skip| !skip))
}

pub(super) fn include() -> DirectiveSpec {
    DirectiveSpec::new("include", LOCATIONS)
        .description("Directs the executor to include this field or fragment only when the `if` argument is true.")
        .argument(InputValueDefinition::new("if", "Boolean!").with_description("Included when true."))
        .include_if(|arguments, _| condition(arguments))
}

fn condition(arguments: &ArgumentValues) -> Result<bool, String> {
    match arguments.get("if") {
        Some(ConstValue::Boolean(value)) => Ok(*value),
        _ => Err("argument 'if' must be a Boolean".to_string()),
    }
}
