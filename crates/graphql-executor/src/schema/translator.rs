use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::{ConstValue, Name, Value};

use super::{MetaType, ScalarKind, ScalarType, Schema};
use crate::error::{InputValueError, ValuePath};

/// Converts between document values, native values and response leaves.
///
/// Every method has a default following the GraphQL rules for the built-in scalars, so an
/// implementation only overrides what its custom scalars need.
pub trait TypeTranslator: Send + Sync {
    /// The value of a literal, `None` for lists, objects and variables which the caller
    /// handles itself.
    fn literal_value(&self, value: &Value) -> Option<ConstValue> {
        match value {
            Value::Variable(_) | Value::List(_) | Value::Object(_) => None,
            value => value.clone().into_const(),
        }
    }

    /// Coerces a native value into the input type `ty`.
    fn coerce_input(&self, schema: &Schema, ty: &Type, value: ConstValue) -> Result<ConstValue, InputValueError> {
        InputCoercion {
            schema,
            value_path: ValuePath::default(),
        }
        .coerce_type(ty, value)
    }

    /// Serializes the non-null value a resolver produced for a scalar or enum.
    fn serialize_leaf(&self, schema: &Schema, ty: &MetaType, value: serde_json::Value) -> Result<ConstValue, String> {
        let _ = schema;
        serialize_leaf(ty, value)
    }
}

/// The GraphQL rules, custom scalars are passed through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTranslator;

impl TypeTranslator for BuiltinTranslator {}

struct InputCoercion<'a> {
    schema: &'a Schema,
    value_path: ValuePath,
}

impl InputCoercion<'_> {
    fn coerce_type(&mut self, ty: &Type, value: ConstValue) -> Result<ConstValue, InputValueError> {
        if matches!(value, ConstValue::Null) {
            if !ty.nullable {
                return Err(InputValueError::UnexpectedNull {
                    expected: ty.to_string(),
                    path: self.value_path.clone(),
                });
            }
            return Ok(ConstValue::Null);
        }

        match &ty.base {
            BaseType::List(item) => match value {
                ConstValue::List(items) => {
                    let mut coerced = Vec::with_capacity(items.len());
                    for (idx, value) in items.into_iter().enumerate() {
                        self.value_path.push(idx);
                        coerced.push(self.coerce_type(item, value)?);
                        self.value_path.pop();
                    }
                    Ok(ConstValue::List(coerced))
                }
                // A single value is accepted as a list of one.
                value => Ok(ConstValue::List(vec![self.coerce_type(item, value)?])),
            },
            BaseType::Named(name) => self.coerce_named_type(name, value),
        }
    }

    fn coerce_named_type(&mut self, name: &Name, value: ConstValue) -> Result<ConstValue, InputValueError> {
        match self.schema.get(name) {
            Some(MetaType::Scalar(scalar)) => self.coerce_scalar(scalar, value),
            Some(MetaType::Enum(r#enum)) => {
                let actual = match &value {
                    ConstValue::Enum(value) => value.as_str(),
                    // Variables arrive as JSON, enum values are strings there.
                    ConstValue::String(value) => value.as_str(),
                    value => {
                        return Err(InputValueError::IncorrectEnumValueType {
                            r#enum: r#enum.name().to_string(),
                            actual: value.into(),
                            path: self.value_path.clone(),
                        })
                    }
                };
                let Some(value) = r#enum.find_value_by_name(actual) else {
                    return Err(InputValueError::UnknownEnumValue {
                        r#enum: r#enum.name().to_string(),
                        value: actual.to_string(),
                        path: self.value_path.clone(),
                    });
                };
                Ok(ConstValue::Enum(value.clone()))
            }
            _ => Err(InputValueError::UnknownInputType {
                name: name.to_string(),
                path: self.value_path.clone(),
            }),
        }
    }

    fn coerce_scalar(&mut self, scalar: &ScalarType, value: ConstValue) -> Result<ConstValue, InputValueError> {
        match (value, scalar.kind()) {
            (value, ScalarKind::Custom) => Ok(value),
            (ConstValue::Number(number), ScalarKind::Int) => {
                let Some(value) = number.as_i64().and_then(|n| i32::try_from(n).ok()) else {
                    return Err(InputValueError::IncorrectScalarValue {
                        actual: number.to_string(),
                        expected: scalar.name().to_string(),
                        path: self.value_path.clone(),
                    });
                };
                Ok(ConstValue::Number(value.into()))
            }
            (ConstValue::Number(number), ScalarKind::Float) => {
                let Some(value) = number.as_f64().and_then(serde_json::Number::from_f64) else {
                    return Err(InputValueError::IncorrectScalarValue {
                        actual: number.to_string(),
                        expected: scalar.name().to_string(),
                        path: self.value_path.clone(),
                    });
                };
                Ok(ConstValue::Number(value))
            }
            (ConstValue::String(value), ScalarKind::String | ScalarKind::Id) => Ok(ConstValue::String(value)),
            (ConstValue::Number(number), ScalarKind::Id) if number.is_i64() || number.is_u64() => {
                Ok(ConstValue::String(number.to_string()))
            }
            (ConstValue::Boolean(value), ScalarKind::Boolean) => Ok(ConstValue::Boolean(value)),
            (actual, _) => Err(InputValueError::IncorrectScalarType {
                actual: (&actual).into(),
                expected: scalar.name().to_string(),
                path: self.value_path.clone(),
            }),
        }
    }
}

fn serialize_leaf(ty: &MetaType, value: serde_json::Value) -> Result<ConstValue, String> {
    let invalid = |value: &serde_json::Value| format!("{} cannot represent value: {value}", ty.name());
    match ty {
        MetaType::Enum(r#enum) => value
            .as_str()
            .and_then(|name| r#enum.find_value_by_name(name))
            .map(|name| ConstValue::Enum(name.clone()))
            .ok_or_else(|| invalid(&value)),
        MetaType::Scalar(scalar) => match (scalar.kind(), &value) {
            (ScalarKind::Custom, _) => ConstValue::from_json(value).map_err(|err| err.to_string()),
            (ScalarKind::Int, serde_json::Value::Number(number)) => number
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(|n| ConstValue::Number(n.into()))
                .ok_or_else(|| invalid(&value)),
            (ScalarKind::Float, serde_json::Value::Number(number)) => number
                .as_f64()
                .and_then(serde_json::Number::from_f64)
                .map(ConstValue::Number)
                .ok_or_else(|| invalid(&value)),
            (ScalarKind::String | ScalarKind::Id, serde_json::Value::String(s)) => Ok(ConstValue::String(s.clone())),
            (ScalarKind::String, serde_json::Value::Bool(b)) => Ok(ConstValue::String(b.to_string())),
            (ScalarKind::String | ScalarKind::Id, serde_json::Value::Number(n)) => Ok(ConstValue::String(n.to_string())),
            (ScalarKind::Boolean, serde_json::Value::Bool(b)) => Ok(ConstValue::Boolean(*b)),
            _ => Err(invalid(&value)),
        },
        MetaType::Object(_) | MetaType::Interface(_) | MetaType::Union(_) => {
            Err(format!("{} is not a leaf type", ty.name()))
        }
    }
}
