//! Selection-set execution.
//!
//! Resolution of one selection set runs in three phases. First every field
//! is dispatched: fragments are expanded in place, data fields are read off
//! the parent, and resolver fields have their arguments bound and their
//! futures created, without awaiting any of them. Second the futures are
//! awaited together and each field settles, with its value checked against
//! the declared type. Third, only after every sibling has settled, fields
//! with sub-selections recurse into their children.
//!
//! A failing field becomes null and records an error; its siblings keep
//! their results. A null in a non-optional position collapses the enclosing
//! object to null, and the collapse keeps propagating until an optional
//! position absorbs it.

use std::collections::HashMap;

use futures::future::{join_all, BoxFuture};
use grql_ast::{FieldNode, Selection};
use grql_core::{to_snake_case, PathSegment};
use grql_schema::introspection;
use grql_schema::{FieldDef, FieldKind, ScalarKind, TypeDef, TypeRef, TypeRegistry};
use serde_json::{Map, Value};

use crate::coerce::coerce_literal;
use crate::context::{ExecutionContext, Variables};
use crate::resolver::{Resolver, ResolverArgs, ResolverFuture, ResolverInfo, ResolverMap};
use crate::response::ExecutionError;

enum EvalState<'a> {
    Ready(Value),
    Launch(&'a dyn Resolver),
    Failed,
}

struct FieldEval<'a> {
    node: &'a FieldNode,
    field: Option<&'a FieldDef>,
    output: String,
    path: Vec<PathSegment>,
    args: ResolverArgs,
    info: ResolverInfo,
    state: EvalState<'a>,
}

pub(crate) struct Execution<'e> {
    pub ctx: &'e ExecutionContext,
    pub resolvers: &'e ResolverMap,
    pub errors: Vec<ExecutionError>,
    /// Substitutes the named root field's value instead of invoking its
    /// resolver. Used by subscription streaming, where the source field's
    /// value arrives from outside the executor.
    pub root_override: Option<(String, Value)>,
}

impl<'e> Execution<'e> {
    pub fn new(
        ctx: &'e ExecutionContext,
        resolvers: &'e ResolverMap,
        root_override: Option<(String, Value)>,
    ) -> Self {
        Self {
            ctx,
            resolvers,
            errors: Vec::new(),
            root_override,
        }
    }

    /// Resolves one selection set against `parent`, returning the result
    /// object, or null if the object collapsed.
    pub fn resolve_selection_set<'a>(
        &'a mut self,
        selections: &'a [Selection],
        type_name: &'a str,
        parent: &'a Value,
        path: &'a [PathSegment],
    ) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            let ctx = self.ctx;
            let concrete = concrete_type_name(parent, type_name);
            let type_def = lookup_type(&ctx.schema().registry, concrete);
            let mut results = Map::new();
            let mut evals: Vec<FieldEval<'_>> = Vec::new();
            let mut poisoned = false;

            // Phase 1: expand fragments in place, dispatch fields.
            for selection in selections {
                match selection {
                    Selection::Field(node) => {
                        let output = node.output_name().to_string();
                        let mut field_path = path.to_vec();
                        field_path.push(PathSegment::Field(output.clone()));
                        // placeholder keeps request order stable across the
                        // later phases
                        results.insert(output, Value::Null);
                        self.dispatch_field(node, concrete, type_def, parent, field_path, &mut evals);
                    }
                    Selection::InlineFragment(fragment) => {
                        if !ctx
                            .schema()
                            .registry
                            .object_satisfies(concrete, &fragment.type_condition)
                        {
                            continue;
                        }
                        let merged = self
                            .resolve_selection_set(&fragment.selections, type_name, parent, path)
                            .await;
                        match merged {
                            Value::Object(map) => {
                                for (key, value) in map {
                                    results.insert(key, value);
                                }
                            }
                            _ => poisoned = true,
                        }
                    }
                    Selection::FragmentSpread(spread) => {
                        let Some(fragment) = ctx.fragment(&spread.name) else {
                            continue;
                        };
                        if !ctx
                            .schema()
                            .registry
                            .object_satisfies(concrete, &fragment.type_condition)
                        {
                            continue;
                        }
                        let mut spread_path = path.to_vec();
                        spread_path.push(PathSegment::Field(spread.name.clone()));
                        let merged = self
                            .resolve_selection_set(
                                &fragment.selections,
                                type_name,
                                parent,
                                &spread_path,
                            )
                            .await;
                        match merged {
                            Value::Object(map) => {
                                for (key, value) in map {
                                    results.insert(key, value);
                                }
                            }
                            _ => poisoned = true,
                        }
                    }
                }
            }

            // Phase 2: await every launched resolver together, then settle
            // each field against its declared type.
            let launched: Vec<(usize, ResolverFuture<'_>)> = evals
                .iter()
                .enumerate()
                .filter_map(|(i, eval)| match &eval.state {
                    EvalState::Launch(resolver) => {
                        Some((i, resolver.resolve(parent, &eval.args, ctx, &eval.info)))
                    }
                    _ => None,
                })
                .collect();
            let (indices, futures): (Vec<usize>, Vec<_>) = launched.into_iter().unzip();
            let outcomes = join_all(futures).await;
            let mut outcome_by_index: HashMap<usize, _> =
                indices.into_iter().zip(outcomes).collect();

            let registry = &ctx.schema().registry;
            for (i, eval) in evals.iter_mut().enumerate() {
                let (mut value, mut errored) =
                    match std::mem::replace(&mut eval.state, EvalState::Failed) {
                        EvalState::Ready(value) => (value, false),
                        EvalState::Failed => (Value::Null, true),
                        EvalState::Launch(_) => match outcome_by_index.remove(&i) {
                            Some(Ok(value)) => (value, false),
                            Some(Err(error)) => {
                                tracing::error!(
                                    field = %eval.node.name,
                                    error = %error,
                                    "resolver failed"
                                );
                                self.errors.push(
                                    ExecutionError::new(error.to_string())
                                        .at(eval.node.location)
                                        .with_path(eval.path.clone()),
                                );
                                (Value::Null, true)
                            }
                            None => (Value::Null, true),
                        },
                    };
                if let Some(field) = eval.field {
                    if !errored {
                        match complete_value(&field.ty, value, registry) {
                            Ok(completed) => value = completed,
                            Err(offender) => {
                                self.errors.push(
                                    ExecutionError::new(format!(
                                        "{offender} is not a valid return value to '{}'",
                                        eval.node.name
                                    ))
                                    .at(eval.node.location)
                                    .with_path(eval.path.clone()),
                                );
                                errored = true;
                                value = Value::Null;
                            }
                        }
                    }
                    if errored && !field.ty.is_optional() {
                        poisoned = true;
                    }
                }
                eval.state = EvalState::Ready(value);
            }

            // Phase 3: recurse into children only after every sibling has
            // settled.
            for eval in &mut evals {
                let EvalState::Ready(settled) =
                    std::mem::replace(&mut eval.state, EvalState::Failed)
                else {
                    continue;
                };
                let mut value = settled;
                if let Some(field) = eval.field {
                    if !value.is_null() {
                        value = self
                            .complete_children(&field.ty, value, eval.node, eval.path.clone())
                            .await;
                        if value.is_null() && !field.ty.is_optional() {
                            poisoned = true;
                        }
                    }
                }
                results.insert(eval.output.clone(), value);
            }

            if poisoned {
                Value::Null
            } else {
                Value::Object(results)
            }
        })
    }

    fn dispatch_field<'a>(
        &mut self,
        node: &'a FieldNode,
        concrete: &str,
        type_def: Option<&'a TypeDef>,
        parent: &Value,
        path: Vec<PathSegment>,
        evals: &mut Vec<FieldEval<'a>>,
    ) where
        'e: 'a,
    {
        let snake = to_snake_case(&node.name);
        let mut eval = FieldEval {
            node,
            field: None,
            output: node.output_name().to_string(),
            info: ResolverInfo {
                parent_type: concrete.to_string(),
                field_name: snake.clone(),
                path: path.clone(),
            },
            path,
            args: ResolverArgs::new(),
            state: EvalState::Failed,
        };

        if snake == "__typename" {
            eval.state = EvalState::Ready(Value::String(concrete.to_string()));
            evals.push(eval);
            return;
        }

        // The query root additionally answers the introspection meta
        // fields, resolved straight off the schema's registry.
        if eval.path.len() == 1 && self.ctx.schema().query.as_deref() == Some(concrete) {
            if let Some(meta) = introspection::meta_field(&snake) {
                eval.field = Some(meta);
                if snake == "__schema" {
                    eval.state =
                        EvalState::Ready(introspection::schema_value(self.ctx.schema()));
                } else {
                    match bind_arguments(
                        node,
                        meta,
                        &self.ctx.schema().registry,
                        self.ctx.variables(),
                        &eval.path,
                    ) {
                        Ok(args) => match args.get("name").and_then(Value::as_str) {
                            Some(name) => {
                                eval.state = EvalState::Ready(introspection::type_value(
                                    self.ctx.schema(),
                                    name,
                                ));
                            }
                            None => self.fail(
                                &mut eval,
                                format!("missing argument 'name' to '{}'", node.name),
                            ),
                        },
                        Err(error) => {
                            tracing::error!(field = %node.name, error = %error.message, "argument binding failed");
                            self.errors.push(error);
                        }
                    }
                }
                evals.push(eval);
                return;
            }
        }

        let field = type_def
            .and_then(TypeDef::fields)
            .and_then(|fields| fields.get(&snake));
        let Some(field) = field else {
            self.fail(
                &mut eval,
                format!("Cannot query field '{}' on type '{concrete}'.", node.name),
            );
            evals.push(eval);
            return;
        };
        eval.field = Some(field);

        match &field.kind {
            FieldKind::Data => match parent.get(&snake) {
                Some(value) => eval.state = EvalState::Ready(value.clone()),
                None => {
                    let message =
                        format!("cannot read attribute '{snake}' on type '{concrete}'");
                    self.fail(&mut eval, message);
                }
            },
            FieldKind::Resolver { .. } => {
                if let Some((name, value)) = &self.root_override {
                    if eval.path.len() == 1 && *name == snake {
                        eval.state = EvalState::Ready(value.clone());
                        evals.push(eval);
                        return;
                    }
                }
                let Some(resolver) = self.resolvers.get(concrete, &snake) else {
                    self.fail(
                        &mut eval,
                        format!("Cannot query field '{}' on type '{concrete}'.", node.name),
                    );
                    evals.push(eval);
                    return;
                };
                match bind_arguments(
                    node,
                    field,
                    &self.ctx.schema().registry,
                    self.ctx.variables(),
                    &eval.path,
                ) {
                    Ok(args) => {
                        eval.args = args;
                        eval.state = EvalState::Launch(resolver);
                    }
                    Err(error) => {
                        tracing::error!(field = %node.name, error = %error.message, "argument binding failed");
                        self.errors.push(error);
                    }
                }
            }
        }
        evals.push(eval);
    }

    fn fail(&mut self, eval: &mut FieldEval<'_>, message: String) {
        tracing::error!(field = %eval.node.name, "{message}");
        self.errors.push(
            ExecutionError::new(message)
                .at(eval.node.location)
                .with_path(eval.path.clone()),
        );
        eval.state = EvalState::Failed;
    }

    /// Walks a settled value down through its type's wrappers and resolves
    /// sub-selections on composite leaves. Lists collapse to null when a
    /// non-optional element resolves to null.
    fn complete_children<'a>(
        &'a mut self,
        ty: &'a TypeRef,
        value: Value,
        node: &'a FieldNode,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            match ty {
                TypeRef::Optional(inner) => {
                    if value.is_null() {
                        value
                    } else {
                        self.complete_children(inner, value, node, path).await
                    }
                }
                TypeRef::List(inner) => {
                    let Value::Array(items) = value else {
                        return value;
                    };
                    let mut out = Vec::with_capacity(items.len());
                    for (i, item) in items.into_iter().enumerate() {
                        let mut child_path = path.clone();
                        child_path.push(PathSegment::Index(i));
                        let resolved =
                            self.complete_children(inner, item, node, child_path).await;
                        if resolved.is_null() && !inner.is_optional() {
                            return Value::Null;
                        }
                        out.push(resolved);
                    }
                    Value::Array(out)
                }
                TypeRef::Scalar(_) => value,
                TypeRef::Named(name) => {
                    let composite = matches!(
                        lookup_type(&self.ctx.schema().registry, name),
                        Some(TypeDef::Object(_) | TypeDef::Interface(_) | TypeDef::Union(_))
                    );
                    if !composite || node.selections.is_empty() {
                        return value;
                    }
                    self.resolve_selection_set(&node.selections, name, &value, &path)
                        .await
                }
            }
        })
    }
}

/// Binds a field node's arguments against the field's declared parameters,
/// coercing literals and substituting defaults for absent arguments. An
/// explicit null is an override, not an absence.
pub(crate) fn bind_arguments(
    node: &FieldNode,
    field: &FieldDef,
    registry: &TypeRegistry,
    variables: &Variables,
    path: &[PathSegment],
) -> Result<ResolverArgs, ExecutionError> {
    let mut args = ResolverArgs::new();
    let Some(params) = field.params() else {
        return Ok(args);
    };
    for argument in &node.arguments {
        let name = to_snake_case(&argument.name);
        let Some(param) = params.get(&name) else {
            return Err(ExecutionError::new(format!(
                "cannot find '{}' as a parameter of '{}'",
                argument.name, field.name
            ))
            .at(argument.location)
            .with_path(path.to_vec()));
        };
        let value = coerce_literal(&argument.value, &param.ty, registry, variables)
            .map_err(|error| {
                ExecutionError::new(error.to_string())
                    .at(argument.location)
                    .with_path(path.to_vec())
            })?;
        args.set(name, value);
    }
    for (name, param) in params {
        if args.contains(name) {
            continue;
        }
        if let Some(default) = &param.default {
            args.set(name.clone(), default.clone());
        }
    }
    Ok(args)
}

/// Looks a type up in the schema's registry, falling back to the static
/// meta-type registry so introspection results complete like any other
/// data object.
fn lookup_type<'r>(registry: &'r TypeRegistry, name: &str) -> Option<&'r TypeDef> {
    registry
        .get(name)
        .or_else(|| introspection::meta_registry().get(name))
}

/// The concrete type a value claims to be, falling back to the statically
/// declared type when the value carries no `__typename`.
fn concrete_type_name<'v>(parent: &'v Value, static_name: &'v str) -> &'v str {
    parent
        .get("__typename")
        .and_then(Value::as_str)
        .unwrap_or(static_name)
}

/// Checks a settled value against its declared type, completing enum
/// integral values to their member names. `Err` carries the offending value
/// back for the error message. Every element of a list is checked.
fn complete_value(ty: &TypeRef, value: Value, registry: &TypeRegistry) -> Result<Value, Value> {
    match ty {
        TypeRef::Optional(inner) => {
            if value.is_null() {
                Ok(Value::Null)
            } else {
                complete_value(inner, value, registry)
            }
        }
        TypeRef::List(inner) => {
            let Value::Array(items) = value else {
                return Err(value);
            };
            items
                .into_iter()
                .map(|item| complete_value(inner, item, registry))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        TypeRef::Scalar(kind) => {
            let ok = match kind {
                ScalarKind::Int => value.is_i64() || value.is_u64(),
                ScalarKind::Float => value.is_number(),
                ScalarKind::String => value.is_string(),
                ScalarKind::Boolean => value.is_boolean(),
                ScalarKind::Id => value.is_string() || value.is_i64() || value.is_u64(),
            };
            if ok {
                Ok(value)
            } else {
                Err(value)
            }
        }
        TypeRef::Named(name) => {
            let Some(def) = lookup_type(registry, name) else {
                return Err(value);
            };
            match def {
                TypeDef::Enum(enum_def) => match value {
                    Value::String(symbol) if enum_def.has_member(&symbol) => {
                        Ok(Value::String(symbol))
                    }
                    Value::Number(n) => {
                        let member = n
                            .as_i64()
                            .and_then(|i| i32::try_from(i).ok())
                            .and_then(|i| enum_def.name_of(i));
                        match member {
                            Some(member) => Ok(Value::String(member.to_string())),
                            None => Err(Value::Number(n)),
                        }
                    }
                    other => Err(other),
                },
                TypeDef::Object(object) => {
                    let ok = value.as_object().is_some_and(|map| {
                        map.get("__typename")
                            .and_then(Value::as_str)
                            .map_or(true, |tn| tn == object.name)
                    });
                    if ok {
                        Ok(value)
                    } else {
                        Err(value)
                    }
                }
                TypeDef::Interface(interface) => {
                    let ok = value.as_object().is_some_and(|map| {
                        map.get("__typename")
                            .and_then(Value::as_str)
                            .map_or(true, |tn| registry.object_satisfies(tn, &interface.name))
                    });
                    if ok {
                        Ok(value)
                    } else {
                        Err(value)
                    }
                }
                // a union return must carry a __typename naming exactly one
                // member
                TypeDef::Union(union) => {
                    let ok = value.as_object().is_some_and(|map| {
                        map.get("__typename")
                            .and_then(Value::as_str)
                            .is_some_and(|tn| union.has_member(tn))
                    });
                    if ok {
                        Ok(value)
                    } else {
                        Err(value)
                    }
                }
                TypeDef::Input(_) => Err(value),
            }
        }
    }
}
