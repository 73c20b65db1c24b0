//! Registry-backed introspection.
//!
//! The meta types (`__Schema`, `__Type`, `__Field`, `__InputValue`,
//! `__EnumValue`, `__Directive` and the two kind enums) live in a static
//! registry of their own, so they never show up in a schema's print form
//! or in its `types` listing. `schema_value` and `type_value` render a
//! schema's registry into the meta model as plain runtime values that the
//! executor walks like any other data object.
//!
//! Nested type references are rendered shallowly: the wrapper chain
//! (`NON_NULL`, `LIST`) down to a named leaf carrying only `kind` and
//! `name`. That keeps the rendering finite for cyclic type graphs; a
//! client drills into a named type with a `__type(name:)` query.

use std::sync::OnceLock;

use grql_core::to_camel_case;
use serde_json::{json, Map, Value};

use crate::registry::TypeRegistry;
use crate::schema::Schema;
use crate::types::{FieldDef, ObjectDef, ParamDef, TypeDef, TypeRef};

fn meta_type() -> TypeRef {
    TypeRef::named("__Type")
}

/// The static registry of meta types, built once.
pub fn meta_registry() -> &'static TypeRegistry {
    static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = TypeRegistry::new();
        registry.register(
            ObjectDef::new("__Schema")
                .field(FieldDef::data("query_type", meta_type()))
                .field(FieldDef::data("mutation_type", TypeRef::optional(meta_type())))
                .field(FieldDef::data(
                    "subscription_type",
                    TypeRef::optional(meta_type()),
                ))
                .field(FieldDef::data("types", TypeRef::list(meta_type())))
                .field(FieldDef::data(
                    "directives",
                    TypeRef::list(TypeRef::named("__Directive")),
                )),
        );
        registry.register(
            ObjectDef::new("__Type")
                .field(FieldDef::data("kind", TypeRef::named("__TypeKind")))
                .field(FieldDef::data("name", TypeRef::optional(TypeRef::string())))
                .field(FieldDef::data(
                    "description",
                    TypeRef::optional(TypeRef::string()),
                ))
                .field(FieldDef::data(
                    "fields",
                    TypeRef::optional(TypeRef::list(TypeRef::named("__Field"))),
                ))
                .field(FieldDef::data(
                    "interfaces",
                    TypeRef::optional(TypeRef::list(meta_type())),
                ))
                .field(FieldDef::data(
                    "possible_types",
                    TypeRef::optional(TypeRef::list(meta_type())),
                ))
                .field(FieldDef::data(
                    "enum_values",
                    TypeRef::optional(TypeRef::list(TypeRef::named("__EnumValue"))),
                ))
                .field(FieldDef::data(
                    "input_fields",
                    TypeRef::optional(TypeRef::list(TypeRef::named("__InputValue"))),
                ))
                .field(FieldDef::data("of_type", TypeRef::optional(meta_type()))),
        );
        registry.register(
            ObjectDef::new("__Field")
                .field(FieldDef::data("name", TypeRef::string()))
                .field(FieldDef::data(
                    "description",
                    TypeRef::optional(TypeRef::string()),
                ))
                .field(FieldDef::data(
                    "args",
                    TypeRef::list(TypeRef::named("__InputValue")),
                ))
                .field(FieldDef::data("type", meta_type()))
                .field(FieldDef::data("is_deprecated", TypeRef::boolean()))
                .field(FieldDef::data(
                    "deprecation_reason",
                    TypeRef::optional(TypeRef::string()),
                )),
        );
        registry.register(
            ObjectDef::new("__InputValue")
                .field(FieldDef::data("name", TypeRef::string()))
                .field(FieldDef::data(
                    "description",
                    TypeRef::optional(TypeRef::string()),
                ))
                .field(FieldDef::data("type", meta_type()))
                .field(FieldDef::data(
                    "default_value",
                    TypeRef::optional(TypeRef::string()),
                )),
        );
        registry.register(
            ObjectDef::new("__EnumValue")
                .field(FieldDef::data("name", TypeRef::string()))
                .field(FieldDef::data(
                    "description",
                    TypeRef::optional(TypeRef::string()),
                ))
                .field(FieldDef::data("is_deprecated", TypeRef::boolean()))
                .field(FieldDef::data(
                    "deprecation_reason",
                    TypeRef::optional(TypeRef::string()),
                )),
        );
        registry.register(
            ObjectDef::new("__Directive")
                .field(FieldDef::data("name", TypeRef::string()))
                .field(FieldDef::data(
                    "description",
                    TypeRef::optional(TypeRef::string()),
                ))
                .field(FieldDef::data(
                    "locations",
                    TypeRef::list(TypeRef::named("__DirectiveLocation")),
                ))
                .field(FieldDef::data(
                    "args",
                    TypeRef::list(TypeRef::named("__InputValue")),
                )),
        );
        registry.register(
            crate::types::EnumDef::new("__TypeKind")
                .value("SCALAR", 0)
                .value("OBJECT", 1)
                .value("INTERFACE", 2)
                .value("UNION", 3)
                .value("ENUM", 4)
                .value("INPUT_OBJECT", 5)
                .value("LIST", 6)
                .value("NON_NULL", 7),
        );
        registry.register(
            crate::types::EnumDef::new("__DirectiveLocation")
                .value("QUERY", 0)
                .value("MUTATION", 1)
                .value("SUBSCRIPTION", 2)
                .value("FIELD", 3)
                .value("FRAGMENT_DEFINITION", 4)
                .value("FRAGMENT_SPREAD", 5)
                .value("INLINE_FRAGMENT", 6),
        );
        registry
    })
}

/// The meta fields exposed on the query root: `__schema` and
/// `__type(name:)`.
pub fn meta_field(name: &str) -> Option<&'static FieldDef> {
    static FIELDS: OnceLock<[FieldDef; 2]> = OnceLock::new();
    let fields = FIELDS.get_or_init(|| {
        [
            FieldDef::resolver("__schema", TypeRef::named("__Schema")),
            FieldDef::resolver("__type", TypeRef::optional(meta_type()))
                .with_param(ParamDef::new("name", TypeRef::string())),
        ]
    });
    fields.iter().find(|field| field.name == name)
}

/// Renders the `__schema` value for a schema.
#[must_use]
pub fn schema_value(schema: &Schema) -> Value {
    let registry = &schema.registry;
    let root = |binding: Option<&str>| {
        binding.map_or(Value::Null, |name| shallow_named(name, registry))
    };
    let mut map = Map::new();
    map.insert("__typename".to_string(), json!("__Schema"));
    map.insert("query_type".to_string(), root(schema.query.as_deref()));
    map.insert("mutation_type".to_string(), root(schema.mutation.as_deref()));
    map.insert(
        "subscription_type".to_string(),
        root(schema.subscription.as_deref()),
    );
    map.insert(
        "types".to_string(),
        Value::Array(registry.iter().map(|def| full_node(def, registry)).collect()),
    );
    map.insert("directives".to_string(), json!([]));
    Value::Object(map)
}

/// Renders the `__type(name:)` value: the named registration in full, or
/// null if the name is unknown.
#[must_use]
pub fn type_value(schema: &Schema, name: &str) -> Value {
    schema
        .registry
        .get(name)
        .map_or(Value::Null, |def| full_node(def, &schema.registry))
}

const fn kind_of(def: &TypeDef) -> &'static str {
    match def {
        TypeDef::Object(_) => "OBJECT",
        TypeDef::Interface(_) => "INTERFACE",
        TypeDef::Union(_) => "UNION",
        TypeDef::Enum(_) => "ENUM",
        TypeDef::Input(_) => "INPUT_OBJECT",
    }
}

fn description_of(def: &TypeDef) -> Option<&str> {
    match def {
        TypeDef::Object(d) => d.description.as_deref(),
        TypeDef::Interface(d) => d.description.as_deref(),
        TypeDef::Union(d) => d.description.as_deref(),
        TypeDef::Enum(d) => d.description.as_deref(),
        TypeDef::Input(d) => d.description.as_deref(),
    }
}

/// A `__Type` node with every declared key present, null until filled in.
fn node(kind: &str, name: Option<&str>) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("__typename".to_string(), json!("__Type"));
    map.insert("kind".to_string(), json!(kind));
    map.insert("name".to_string(), json!(name));
    for key in [
        "description",
        "fields",
        "interfaces",
        "possible_types",
        "input_fields",
        "enum_values",
        "of_type",
    ] {
        map.insert(key.to_string(), Value::Null);
    }
    map
}

fn shallow_named(name: &str, registry: &TypeRegistry) -> Value {
    let kind = registry.get(name).map_or("OBJECT", kind_of);
    Value::Object(node(kind, Some(name)))
}

/// Renders a type reference in a non-null-aware position.
fn type_ref(ty: &TypeRef, registry: &TypeRegistry) -> Value {
    match ty {
        TypeRef::Optional(inner) => nullable_ref(inner, registry),
        other => {
            let mut map = node("NON_NULL", None);
            map.insert("of_type".to_string(), nullable_ref(other, registry));
            Value::Object(map)
        }
    }
}

/// Renders the nullable view of a type reference.
fn nullable_ref(ty: &TypeRef, registry: &TypeRegistry) -> Value {
    match ty {
        TypeRef::Optional(inner) => nullable_ref(inner, registry),
        TypeRef::List(inner) => {
            let mut map = node("LIST", None);
            map.insert("of_type".to_string(), type_ref(inner, registry));
            Value::Object(map)
        }
        TypeRef::Scalar(kind) => Value::Object(node("SCALAR", Some(kind.name()))),
        TypeRef::Named(name) => shallow_named(name, registry),
    }
}

fn full_node(def: &TypeDef, registry: &TypeRegistry) -> Value {
    let mut map = node(kind_of(def), Some(def.name()));
    map.insert("description".to_string(), json!(description_of(def)));
    match def {
        TypeDef::Object(object) => {
            map.insert(
                "fields".to_string(),
                Value::Array(
                    object
                        .fields
                        .values()
                        .map(|field| field_value(field, registry))
                        .collect(),
                ),
            );
            map.insert(
                "interfaces".to_string(),
                Value::Array(
                    object
                        .implements
                        .iter()
                        .map(|name| shallow_named(name, registry))
                        .collect(),
                ),
            );
        }
        TypeDef::Interface(interface) => {
            map.insert(
                "fields".to_string(),
                Value::Array(
                    interface
                        .fields
                        .values()
                        .map(|field| field_value(field, registry))
                        .collect(),
                ),
            );
            let implementors = registry
                .iter()
                .filter_map(TypeDef::as_object)
                .filter(|object| object.implements.iter().any(|i| *i == interface.name))
                .map(|object| shallow_named(&object.name, registry))
                .collect();
            map.insert("possible_types".to_string(), Value::Array(implementors));
        }
        TypeDef::Union(union) => {
            map.insert(
                "possible_types".to_string(),
                Value::Array(
                    union
                        .members
                        .iter()
                        .map(|member| shallow_named(member, registry))
                        .collect(),
                ),
            );
        }
        TypeDef::Enum(enum_def) => {
            map.insert(
                "enum_values".to_string(),
                Value::Array(
                    enum_def
                        .values
                        .iter()
                        .map(|member| {
                            json!({
                                "__typename": "__EnumValue",
                                "name": member.name,
                                "description": member.description,
                                "is_deprecated": false,
                                "deprecation_reason": null,
                            })
                        })
                        .collect(),
                ),
            );
        }
        TypeDef::Input(input) => {
            map.insert(
                "input_fields".to_string(),
                Value::Array(
                    input
                        .fields
                        .values()
                        .map(|field| {
                            json!({
                                "__typename": "__InputValue",
                                "name": to_camel_case(&field.name),
                                "description": field.description,
                                "type": type_ref(&field.ty, registry),
                                "default_value": null,
                            })
                        })
                        .collect(),
                ),
            );
        }
    }
    Value::Object(map)
}

fn field_value(field: &FieldDef, registry: &TypeRegistry) -> Value {
    let args: Vec<Value> = field
        .params()
        .map(|params| {
            params
                .values()
                .map(|param| param_value(param, registry))
                .collect()
        })
        .unwrap_or_default();
    json!({
        "__typename": "__Field",
        "name": to_camel_case(&field.name),
        "description": field.description,
        "args": args,
        "type": type_ref(&field.ty, registry),
        "is_deprecated": false,
        "deprecation_reason": null,
    })
}

fn param_value(param: &ParamDef, registry: &TypeRegistry) -> Value {
    json!({
        "__typename": "__InputValue",
        "name": to_camel_case(&param.name),
        "description": param.description,
        "type": type_ref(&param.ty, registry),
        "default_value": param.default.as_ref().map(ToString::to_string),
    })
}
