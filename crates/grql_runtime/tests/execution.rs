//! End-to-end execution tests: schema + resolvers + document in, envelope out.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use grql_ast::{
    Definition, Document, FieldNode, FragmentDefinition, FragmentSpreadNode, InlineFragmentNode,
    OperationDefinition, OperationKind, ValueNode,
};
use grql_core::{Location, PathSegment};
use grql_runtime::{
    Engine, ExecutionContext, ResolverArgs, ResolverError, ResolverInfo, ResolverMap,
    ResolverStream, Socket, SocketError, Variables,
};
use grql_schema::{
    FieldDef, InputObjectDef, InterfaceDef, ObjectDef, ParamDef, SchemaBuilder, TypeRef, UnionDef,
};
use serde_json::{json, Value};

fn patron_engine() -> Engine {
    let schema = SchemaBuilder::new()
        .query_type("Query")
        .register(
            ObjectDef::new("Patron")
                .field(FieldDef::data("id", TypeRef::id()))
                .field(FieldDef::data("name", TypeRef::string()))
                .field(FieldDef::data("age", TypeRef::int())),
        )
        .register(
            ObjectDef::new("Query")
                .field(FieldDef::resolver("patron", TypeRef::named("Patron")))
                .field(
                    FieldDef::resolver("exception", TypeRef::string()).with_param(
                        ParamDef::new("content", TypeRef::optional(TypeRef::string())),
                    ),
                ),
        )
        .build()
        .unwrap();

    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "patron", |_, _, _, _| {
        Ok(json!({"id": "1", "name": "Selena", "age": 25}))
    });
    resolvers.register_fn("Query", "exception", |_, args, _, _| {
        let content = args
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("failed");
        Err(ResolverError::custom(content.to_string()))
    });
    Engine::new(schema, resolvers)
}

fn query(selections: Vec<grql_ast::Selection>) -> Document {
    Document::new(vec![Definition::Operation(OperationDefinition::new(
        OperationKind::Query,
        selections,
    ))])
}

#[tokio::test]
async fn patron_query_produces_exact_envelope() {
    let engine = patron_engine();
    let document = query(vec![FieldNode::new("patron")
        .with_selections(vec![
            FieldNode::new("id").into(),
            FieldNode::new("name").into(),
            FieldNode::new("age").into(),
        ])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert_eq!(
        response.to_json().unwrap(),
        r#"{"errors":null,"data":{"patron":{"id":"1","name":"Selena","age":25}}}"#
    );
}

#[tokio::test]
async fn resolver_exception_collapses_to_null_data() {
    let engine = patron_engine();
    let document = query(vec![FieldNode::new("exception")
        .at(Location::new(3, 13))
        .with_argument("content", ValueNode::string("Test exception"))
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert_eq!(
        response.to_json().unwrap(),
        r#"{"errors":[{"message":"Test exception","locations":[{"line":3,"column":13}],"path":["exception"]}],"data":null}"#
    );
}

#[tokio::test]
async fn aliases_keep_request_order() {
    let engine = patron_engine();
    let document = query(vec![
        FieldNode::new("patron")
            .with_alias("second")
            .with_selections(vec![FieldNode::new("name").into()])
            .into(),
        FieldNode::new("patron")
            .with_alias("first")
            .with_selections(vec![FieldNode::new("age").into()])
            .into(),
    ]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert_eq!(
        response.to_json().unwrap(),
        r#"{"errors":null,"data":{"second":{"name":"Selena"},"first":{"age":25}}}"#
    );
}

#[tokio::test]
async fn unknown_field_errors_but_siblings_survive() {
    let engine = patron_engine();
    let document = query(vec![FieldNode::new("patron")
        .with_selections(vec![
            FieldNode::new("id").into(),
            FieldNode::new("bogus").at(Location::new(2, 5)).into(),
        ])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert_eq!(
        response.data,
        Some(json!({"patron": {"id": "1", "bogus": null}}))
    );
    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Cannot query field 'bogus' on type 'Patron'.");
    assert_eq!(
        errors[0].path,
        Some(vec![
            PathSegment::Field("patron".to_string()),
            PathSegment::Field("bogus".to_string()),
        ])
    );
}

#[tokio::test]
async fn failing_sibling_is_isolated() {
    let schema = SchemaBuilder::new()
        .query_type("Query")
        .register(
            ObjectDef::new("Query")
                .field(FieldDef::resolver("good", TypeRef::int()))
                .field(FieldDef::resolver(
                    "bad",
                    TypeRef::optional(TypeRef::int()),
                )),
        )
        .build()
        .unwrap();
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "good", |_, _, _, _| Ok(json!(7)));
    resolvers.register_fn("Query", "bad", |_, _, _, _| {
        Err(ResolverError::custom("broke"))
    });
    let engine = Engine::new(schema, resolvers);

    let document = query(vec![
        FieldNode::new("good").into(),
        FieldNode::new("bad").into(),
    ]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert_eq!(response.data, Some(json!({"good": 7, "bad": null})));
    assert_eq!(response.errors.unwrap()[0].message, "broke");
}

#[tokio::test]
async fn missing_attribute_in_non_optional_position_collapses() {
    let schema = SchemaBuilder::new()
        .query_type("Query")
        .register(
            ObjectDef::new("Patron")
                .field(FieldDef::data("name", TypeRef::string()))
                .field(FieldDef::data("nickname", TypeRef::string())),
        )
        .register(
            ObjectDef::new("Query")
                .field(FieldDef::resolver("patron", TypeRef::named("Patron"))),
        )
        .build()
        .unwrap();
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "patron", |_, _, _, _| {
        Ok(json!({"name": "Selena"}))
    });
    let engine = Engine::new(schema, resolvers);

    let document = query(vec![FieldNode::new("patron")
        .with_selections(vec![
            FieldNode::new("name").into(),
            FieldNode::new("nickname").into(),
        ])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert_eq!(response.data, None);
    let errors = response.errors.unwrap();
    assert_eq!(
        errors[0].message,
        "cannot read attribute 'nickname' on type 'Patron'"
    );
}

fn pet_engine(search: Value) -> Engine {
    let schema = SchemaBuilder::new()
        .query_type("Query")
        .register(ObjectDef::new("Cat").field(FieldDef::data("meow_volume", TypeRef::int())))
        .register(ObjectDef::new("Dog").field(FieldDef::data("bark_volume", TypeRef::int())))
        .register(UnionDef::new("SearchResult", ["Cat", "Dog"]))
        .register(ObjectDef::new("Query").field(FieldDef::resolver(
            "search",
            TypeRef::optional(TypeRef::named("SearchResult")),
        )))
        .build()
        .unwrap();
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "search", move |_, _, _, _| Ok(search.clone()));
    Engine::new(schema, resolvers)
}

#[tokio::test]
async fn union_return_without_typename_is_invalid() {
    let engine = pet_engine(json!({"meow_volume": 3}));
    let document = query(vec![FieldNode::new("search")
        .with_selections(vec![FieldNode::new("__typename").into()])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert_eq!(response.data, Some(json!({"search": null})));
    let errors = response.errors.unwrap();
    assert!(
        errors[0].message.contains("is not a valid return value to 'search'"),
        "unexpected message: {}",
        errors[0].message
    );
}

#[tokio::test]
async fn union_dispatches_matching_inline_fragment() {
    let engine = pet_engine(json!({"__typename": "Cat", "meow_volume": 3}));
    let document = query(vec![FieldNode::new("search")
        .with_selections(vec![
            FieldNode::new("__typename").into(),
            InlineFragmentNode::new(
                "Cat",
                vec![FieldNode::new("meowVolume").into()],
            )
            .into(),
            InlineFragmentNode::new(
                "Dog",
                vec![FieldNode::new("barkVolume").into()],
            )
            .into(),
        ])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert!(response.errors.is_none());
    assert_eq!(
        response.data,
        Some(json!({"search": {"__typename": "Cat", "meowVolume": 3}}))
    );
}

#[tokio::test]
async fn named_fragment_spread_merges_in_place() {
    let engine = patron_engine();
    let document = Document::new(vec![
        Definition::Operation(OperationDefinition::new(
            OperationKind::Query,
            vec![FieldNode::new("patron")
                .with_selections(vec![
                    FieldNode::new("id").into(),
                    FragmentSpreadNode::new("patronFields").into(),
                ])
                .into()],
        )),
        Definition::Fragment(FragmentDefinition::new(
            "patronFields",
            "Patron",
            vec![
                FieldNode::new("name").into(),
                FieldNode::new("age").into(),
            ],
        )),
    ]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert!(response.errors.is_none());
    assert_eq!(
        response.to_json().unwrap(),
        r#"{"errors":null,"data":{"patron":{"id":"1","name":"Selena","age":25}}}"#
    );
}

#[tokio::test]
async fn interface_conditioned_spread_applies_to_implementor() {
    let schema = SchemaBuilder::new()
        .query_type("Query")
        .register(InterfaceDef::new("Named").field(FieldDef::data("name", TypeRef::string())))
        .register(
            ObjectDef::new("Cat")
                .implements("Named")
                .field(FieldDef::data("name", TypeRef::string()))
                .field(FieldDef::data("meow_volume", TypeRef::int())),
        )
        .register(
            ObjectDef::new("Query").field(FieldDef::resolver("pet", TypeRef::named("Cat"))),
        )
        .build()
        .unwrap();
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "pet", |_, _, _, _| {
        Ok(json!({"name": "mia", "meow_volume": 3}))
    });
    let engine = Engine::new(schema, resolvers);

    let document = Document::new(vec![
        Definition::Operation(OperationDefinition::new(
            OperationKind::Query,
            vec![FieldNode::new("pet")
                .with_selections(vec![
                    FieldNode::new("meowVolume").into(),
                    FragmentSpreadNode::new("namedParts").into(),
                    InlineFragmentNode::new(
                        "Named",
                        vec![FieldNode::new("__typename").into()],
                    )
                    .into(),
                ])
                .into()],
        )),
        // conditioned on the interface, not the concrete object
        Definition::Fragment(FragmentDefinition::new(
            "namedParts",
            "Named",
            vec![FieldNode::new("name").into()],
        )),
    ]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert!(response.errors.is_none());
    assert_eq!(
        response.data,
        Some(json!({
            "pet": {"meowVolume": 3, "name": "mia", "__typename": "Cat"}
        }))
    );
}

#[tokio::test]
async fn missing_fragment_is_skipped_silently() {
    let engine = patron_engine();
    let document = query(vec![FieldNode::new("patron")
        .with_selections(vec![
            FieldNode::new("id").into(),
            FragmentSpreadNode::new("noSuchFragment").into(),
        ])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert!(response.errors.is_none());
    assert_eq!(response.data, Some(json!({"patron": {"id": "1"}})));
}

#[tokio::test]
async fn input_object_variable_reaches_resolver() {
    let schema = SchemaBuilder::new()
        .mutation_type("Mutation")
        .register(
            InputObjectDef::new("GeoInput")
                .field(FieldDef::data("lat", TypeRef::float()))
                .field(FieldDef::data("lng", TypeRef::float())),
        )
        .register(
            ObjectDef::new("Mutation").field(
                FieldDef::resolver("register", TypeRef::boolean())
                    .with_param(ParamDef::new("geo", TypeRef::named("GeoInput"))),
            ),
        )
        .build()
        .unwrap();
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Mutation", "register", |_, args, _, _| {
        Ok(json!(args.get("geo") == Some(&json!({"lat": 32.2, "lng": 12}))))
    });
    let engine = Engine::new(schema, resolvers);

    let document = Document::new(vec![Definition::Operation(OperationDefinition::new(
        OperationKind::Mutation,
        vec![FieldNode::new("register")
            .with_argument("geo", ValueNode::variable("geo"))
            .into()],
    ))]);
    let mut variables = Variables::new();
    variables.insert("geo".to_string(), json!({"lat": 32.2, "lng": 12}));
    let response = engine.execute(document, variables, None).await;
    assert!(response.errors.is_none());
    assert_eq!(response.data, Some(json!({"register": true})));
}

fn limit_engine() -> Engine {
    let schema = SchemaBuilder::new()
        .query_type("Query")
        .register(
            ObjectDef::new("Query").field(
                FieldDef::resolver("limit", TypeRef::optional(TypeRef::int())).with_param(
                    ParamDef::new("limit", TypeRef::optional(TypeRef::int()))
                        .with_default(json!(10)),
                ),
            ),
        )
        .build()
        .unwrap();
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "limit", |_, args, _, _| {
        Ok(args.get("limit").cloned().unwrap_or(Value::Null))
    });
    Engine::new(schema, resolvers)
}

#[tokio::test]
async fn absent_argument_takes_default() {
    let engine = limit_engine();
    let document = query(vec![FieldNode::new("limit").into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert_eq!(response.data, Some(json!({"limit": 10})));
}

#[tokio::test]
async fn explicit_null_overrides_default() {
    let engine = limit_engine();
    let document = query(vec![FieldNode::new("limit")
        .with_argument("limit", ValueNode::Null)
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert!(response.errors.is_none());
    assert_eq!(response.data, Some(json!({"limit": null})));
}

#[tokio::test]
async fn list_element_error_carries_index_path() {
    let schema = SchemaBuilder::new()
        .query_type("Query")
        .register(ObjectDef::new("Cat").field(FieldDef::data("name", TypeRef::string())))
        .register(ObjectDef::new("Query").field(FieldDef::resolver(
            "pets",
            TypeRef::list(TypeRef::named("Cat")),
        )))
        .build()
        .unwrap();
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "pets", |_, _, _, _| {
        Ok(json!([{"name": "mia"}, {"color": "grey"}]))
    });
    let engine = Engine::new(schema, resolvers);

    let document = query(vec![FieldNode::new("pets")
        .with_selections(vec![FieldNode::new("name").into()])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    // the second element collapses, which collapses the list, which
    // collapses the root
    assert_eq!(response.data, None);
    let errors = response.errors.unwrap();
    assert_eq!(
        errors[0].path,
        Some(vec![
            PathSegment::Field("pets".to_string()),
            PathSegment::Index(1),
            PathSegment::Field("name".to_string()),
        ])
    );
}

#[tokio::test]
async fn subscription_via_execute_is_rejected() {
    let engine = patron_engine();
    let document = Document::new(vec![Definition::Operation(OperationDefinition::new(
        OperationKind::Subscription,
        vec![FieldNode::new("patron").into()],
    ))]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert_eq!(
        response.to_json().unwrap(),
        r#"{"errors":[{"message":"This API does not support this operation","locations":null,"path":null}],"data":null}"#
    );
}

#[tokio::test]
async fn document_without_operations_yields_empty_envelope() {
    let engine = patron_engine();
    let response = engine
        .execute(Document::default(), Variables::new(), None)
        .await;
    assert_eq!(response.to_json().unwrap(), r#"{"errors":null,"data":null}"#);
}

#[tokio::test]
async fn schema_introspection_reports_roots_and_types() {
    let engine = patron_engine();
    let document = query(vec![FieldNode::new("__schema")
        .with_selections(vec![
            FieldNode::new("queryType")
                .with_selections(vec![FieldNode::new("name").into()])
                .into(),
            FieldNode::new("types")
                .with_selections(vec![
                    FieldNode::new("name").into(),
                    FieldNode::new("kind").into(),
                ])
                .into(),
        ])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert!(response.errors.is_none());
    assert_eq!(
        response.data,
        Some(json!({
            "__schema": {
                "queryType": {"name": "Query"},
                "types": [
                    {"name": "Patron", "kind": "OBJECT"},
                    {"name": "Query", "kind": "OBJECT"},
                ],
            }
        }))
    );
}

#[tokio::test]
async fn type_introspection_walks_fields_and_wrappers() {
    let engine = patron_engine();
    let document = query(vec![FieldNode::new("__type")
        .with_argument("name", ValueNode::string("Patron"))
        .with_selections(vec![
            FieldNode::new("name").into(),
            FieldNode::new("kind").into(),
            FieldNode::new("fields")
                .with_selections(vec![
                    FieldNode::new("name").into(),
                    FieldNode::new("type")
                        .with_selections(vec![
                            FieldNode::new("kind").into(),
                            FieldNode::new("ofType")
                                .with_selections(vec![FieldNode::new("name").into()])
                                .into(),
                        ])
                        .into(),
                ])
                .into(),
        ])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert!(response.errors.is_none());
    assert_eq!(
        response.data,
        Some(json!({
            "__type": {
                "name": "Patron",
                "kind": "OBJECT",
                "fields": [
                    {"name": "id", "type": {"kind": "NON_NULL", "ofType": {"name": "ID"}}},
                    {"name": "name", "type": {"kind": "NON_NULL", "ofType": {"name": "String"}}},
                    {"name": "age", "type": {"kind": "NON_NULL", "ofType": {"name": "Int"}}},
                ],
            }
        }))
    );
}

#[tokio::test]
async fn unknown_type_introspects_to_null() {
    let engine = patron_engine();
    let document = query(vec![FieldNode::new("__type")
        .with_argument("name", ValueNode::string("Ghost"))
        .with_selections(vec![FieldNode::new("name").into()])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    assert!(response.errors.is_none());
    assert_eq!(response.data, Some(json!({"__type": null})));
}

#[tokio::test]
async fn introspection_is_query_root_only() {
    let engine = patron_engine();
    let document = query(vec![FieldNode::new("patron")
        .with_selections(vec![FieldNode::new("__schema")
            .at(Location::new(2, 3))
            .into()])
        .into()]);
    let response = engine.execute(document, Variables::new(), None).await;
    let errors = response.errors.unwrap();
    assert_eq!(
        errors[0].message,
        "Cannot query field '__schema' on type 'Patron'."
    );
}

struct TestSocket {
    incoming: VecDeque<String>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

#[async_trait]
impl Socket for TestSocket {
    async fn send(&mut self, text: String) -> Result<(), SocketError> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn receive(&mut self) -> Result<String, SocketError> {
        self.incoming.pop_front().ok_or(SocketError::Closed)
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

fn beat_stream<'a>(
    _parent: &'a Value,
    _args: &'a ResolverArgs,
    _ctx: &'a ExecutionContext,
    _info: &'a ResolverInfo,
) -> ResolverStream<'a> {
    Box::pin(futures::stream::iter(vec![
        Ok(json!(1)),
        Ok(json!(2)),
        Ok(json!(3)),
    ]))
}

#[tokio::test]
async fn subscription_streams_one_envelope_per_value() {
    let schema = SchemaBuilder::new()
        .query_type("Query")
        .subscription_type("Subscription")
        .register(ObjectDef::new("Query").field(FieldDef::resolver("ping", TypeRef::string())))
        .register(
            ObjectDef::new("Subscription")
                .field(FieldDef::resolver("beat", TypeRef::int())),
        )
        .build()
        .unwrap();
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "ping", |_, _, _, _| Ok(json!("pong")));
    resolvers.register_stream("Subscription", "beat", beat_stream);
    let engine = Engine::new(schema, resolvers);

    let subscription = Document::new(vec![Definition::Operation(OperationDefinition::new(
        OperationKind::Subscription,
        vec![FieldNode::new("beat").into()],
    ))]);
    let ping = query(vec![FieldNode::new("ping").into()]);

    let sent = Arc::new(Mutex::new(Vec::new()));
    let closed = Arc::new(Mutex::new(false));
    let socket = TestSocket {
        incoming: VecDeque::from(vec![
            r#"{"query": "subscription { beat }"}"#.to_string(),
            r#"{"query": "{ ping }"}"#.to_string(),
        ]),
        sent: sent.clone(),
        closed: closed.clone(),
    };

    engine
        .serve(socket, move |text: &str| {
            if text.starts_with("subscription") {
                Ok::<_, SocketError>(subscription.clone())
            } else {
                Ok(ping.clone())
            }
        })
        .await;

    let sent = sent.lock().unwrap();
    assert_eq!(
        *sent,
        vec![
            r#"{"errors":null,"data":{"beat":1}}"#.to_string(),
            r#"{"errors":null,"data":{"beat":2}}"#.to_string(),
            r#"{"errors":null,"data":{"beat":3}}"#.to_string(),
            r#"{"errors":null,"data":{"ping":"pong"}}"#.to_string(),
        ]
    );
    assert!(*closed.lock().unwrap());
}
