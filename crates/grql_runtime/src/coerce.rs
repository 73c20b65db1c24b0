//! Input coercion.
//!
//! Converts literal argument values and client-supplied variables into the
//! runtime values resolvers receive, checked against declared parameter
//! types. Coercion is a pure function of its inputs: the same node, type and
//! variable bindings always produce the same value or the same error.
//!
//! Enum symbols coerce to their member name; integral variable values that
//! match a member's integral value coerce to that member's name as well.
//! Input object literals materialize with snake_case keys so resolvers see
//! one spelling regardless of how the request spelled them.

use grql_ast::value::{ObjectFieldNode, ValueNode};
use grql_core::to_snake_case;
use grql_schema::{InputObjectDef, ScalarKind, TypeDef, TypeRef, TypeRegistry};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::context::Variables;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("cannot find variable `${0}`")]
    UnknownVariable(String),
    #[error("`{symbol}` is not a valid member of `{enum_name}`")]
    UnknownEnumMember { symbol: String, enum_name: String },
    #[error("field `{field}` is not defined on input `{input}`")]
    UnknownInputField { field: String, input: String },
    #[error("input `{input}` is missing required field `{field}`")]
    MissingInputField { field: String, input: String },
    #[error("cannot coerce {found} into `{expected}`")]
    Mismatch { found: String, expected: String },
}

fn mismatch(found: &Value, expected: &TypeRef) -> CoercionError {
    CoercionError::Mismatch {
        found: found.to_string(),
        expected: expected.to_string(),
    }
}

/// Coerces a literal value node from the document into a runtime value of
/// the given type. Variable references are substituted from `variables` and
/// coerced through [`coerce_variable`].
pub fn coerce_literal(
    node: &ValueNode,
    ty: &TypeRef,
    registry: &TypeRegistry,
    variables: &Variables,
) -> Result<Value, CoercionError> {
    match node {
        ValueNode::Variable(name) => {
            let value = variables
                .get(name)
                .ok_or_else(|| CoercionError::UnknownVariable(name.clone()))?;
            coerce_variable(value, ty, registry)
        }
        ValueNode::Null => Ok(Value::Null),
        ValueNode::Int(i) => Ok(Value::Number(Number::from(*i))),
        ValueNode::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| CoercionError::Mismatch {
                found: format!("{f}"),
                expected: ty.to_string(),
            }),
        ValueNode::Boolean(b) => Ok(Value::Bool(*b)),
        ValueNode::String(s) => Ok(Value::String(s.clone())),
        ValueNode::Enum(symbol) => {
            let enum_def = enum_target(ty, registry).ok_or_else(|| CoercionError::Mismatch {
                found: format!("`{symbol}`"),
                expected: ty.to_string(),
            })?;
            if enum_def.has_member(symbol) {
                Ok(Value::String(symbol.clone()))
            } else {
                Err(CoercionError::UnknownEnumMember {
                    symbol: symbol.clone(),
                    enum_name: enum_def.name.clone(),
                })
            }
        }
        ValueNode::List(items) => {
            let element = element_target(ty).ok_or_else(|| CoercionError::Mismatch {
                found: "a list".to_string(),
                expected: ty.to_string(),
            })?;
            let coerced = items
                .iter()
                .map(|item| coerce_literal(item, element, registry, variables))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(coerced))
        }
        ValueNode::Object(fields) => {
            let input = input_target(ty, registry).ok_or_else(|| CoercionError::Mismatch {
                found: "an input object".to_string(),
                expected: ty.to_string(),
            })?;
            materialize_literal(fields, input, registry, variables)
        }
    }
}

/// Coerces a client-supplied variable value (already JSON) against the
/// declared type. The shape must already match; no implicit conversions
/// happen other than integral-to-name enum lookup.
pub fn coerce_variable(
    value: &Value,
    ty: &TypeRef,
    registry: &TypeRegistry,
) -> Result<Value, CoercionError> {
    match ty {
        TypeRef::Optional(inner) => {
            if value.is_null() {
                Ok(Value::Null)
            } else {
                coerce_variable(value, inner, registry)
            }
        }
        TypeRef::List(inner) => {
            let items = value.as_array().ok_or_else(|| mismatch(value, ty))?;
            let coerced = items
                .iter()
                .map(|item| coerce_variable(item, inner, registry))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(coerced))
        }
        TypeRef::Scalar(kind) => {
            if scalar_accepts(*kind, value) {
                Ok(value.clone())
            } else {
                Err(mismatch(value, ty))
            }
        }
        TypeRef::Named(name) => match registry.get(name) {
            Some(TypeDef::Enum(enum_def)) => match value {
                Value::String(symbol) if enum_def.has_member(symbol) => {
                    Ok(Value::String(symbol.clone()))
                }
                Value::Number(n) => n
                    .as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .and_then(|i| enum_def.name_of(i))
                    .map(|member| Value::String(member.to_string()))
                    .ok_or_else(|| mismatch(value, ty)),
                Value::String(symbol) => Err(CoercionError::UnknownEnumMember {
                    symbol: symbol.clone(),
                    enum_name: enum_def.name.clone(),
                }),
                _ => Err(mismatch(value, ty)),
            },
            Some(TypeDef::Input(input)) => {
                let fields = value.as_object().ok_or_else(|| mismatch(value, ty))?;
                materialize_variable(fields, input, registry)
            }
            _ => Err(mismatch(value, ty)),
        },
    }
}

fn scalar_accepts(kind: ScalarKind, value: &Value) -> bool {
    match kind {
        ScalarKind::Int => value.is_i64() || value.is_u64(),
        ScalarKind::Float => value.is_number(),
        ScalarKind::String => value.is_string(),
        ScalarKind::Boolean => value.is_boolean(),
        ScalarKind::Id => value.is_string() || value.is_i64() || value.is_u64(),
    }
}

fn element_target(ty: &TypeRef) -> Option<&TypeRef> {
    match ty {
        TypeRef::Optional(inner) => element_target(inner),
        TypeRef::List(inner) => Some(inner),
        _ => None,
    }
}

fn enum_target<'r>(ty: &TypeRef, registry: &'r TypeRegistry) -> Option<&'r grql_schema::EnumDef> {
    match registry.get(ty.shelled().named_target()?)? {
        TypeDef::Enum(enum_def) => Some(enum_def),
        _ => None,
    }
}

fn input_target<'r>(ty: &TypeRef, registry: &'r TypeRegistry) -> Option<&'r InputObjectDef> {
    match registry.get(ty.shelled().named_target()?)? {
        TypeDef::Input(input) => Some(input),
        _ => None,
    }
}

fn materialize_literal(
    fields: &[ObjectFieldNode],
    input: &InputObjectDef,
    registry: &TypeRegistry,
    variables: &Variables,
) -> Result<Value, CoercionError> {
    let mut out = Map::new();
    for field in fields {
        let key = to_snake_case(&field.name);
        let def = input
            .fields
            .get(&key)
            .ok_or_else(|| CoercionError::UnknownInputField {
                field: field.name.clone(),
                input: input.name.clone(),
            })?;
        out.insert(key, coerce_literal(&field.value, &def.ty, registry, variables)?);
    }
    fill_absent(&mut out, input)?;
    Ok(Value::Object(out))
}

fn materialize_variable(
    fields: &Map<String, Value>,
    input: &InputObjectDef,
    registry: &TypeRegistry,
) -> Result<Value, CoercionError> {
    let mut out = Map::new();
    for (name, value) in fields {
        let key = to_snake_case(name);
        let def = input
            .fields
            .get(&key)
            .ok_or_else(|| CoercionError::UnknownInputField {
                field: name.clone(),
                input: input.name.clone(),
            })?;
        out.insert(key, coerce_variable(value, &def.ty, registry)?);
    }
    fill_absent(&mut out, input)?;
    Ok(Value::Object(out))
}

// Absent optional fields materialize as explicit nulls so resolvers can
// index every declared field.
fn fill_absent(out: &mut Map<String, Value>, input: &InputObjectDef) -> Result<(), CoercionError> {
    for (name, def) in &input.fields {
        if out.contains_key(name) {
            continue;
        }
        if def.ty.is_optional() {
            out.insert(name.clone(), Value::Null);
        } else {
            return Err(CoercionError::MissingInputField {
                field: name.clone(),
                input: input.name.clone(),
            });
        }
    }
    Ok(())
}
