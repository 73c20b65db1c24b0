//! The schema descriptor and its builder.

use crate::error::DefinitionError;
use crate::registry::TypeRegistry;
use crate::types::{ObjectDef, TypeDef};
use crate::validate::Validator;

/// A validated schema: root type bindings plus the type registry.
///
/// Built once, immutable afterwards, and safe to share read-only across
/// concurrent executions.
#[derive(Debug, Clone)]
pub struct Schema {
    pub description: Option<String>,
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
    pub registry: TypeRegistry,
}

impl Schema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The root object type bound to the named operation kind
    /// (`query`, `mutation` or `subscription`).
    #[must_use]
    pub fn root_object(&self, operation: &str) -> Option<&ObjectDef> {
        let name = match operation {
            "query" => self.query.as_deref(),
            "mutation" => self.mutation.as_deref(),
            "subscription" => self.subscription.as_deref(),
            _ => None,
        }?;
        self.registry.get(name).and_then(TypeDef::as_object)
    }

    /// Renders the schema in its SDL-style print form.
    #[must_use]
    pub fn print(&self) -> String {
        crate::print::print_schema(self)
    }
}

/// The explicit registration step that replaces runtime reflection: every
/// declared type and root binding is supplied here, then `build` validates
/// the whole graph exactly once.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    description: Option<String>,
    query: Option<String>,
    mutation: Option<String>,
    subscription: Option<String>,
    registry: TypeRegistry,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Binds the query root type.
    #[must_use]
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.query = Some(name.into());
        self
    }

    /// Binds the mutation root type.
    #[must_use]
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation = Some(name.into());
        self
    }

    /// Binds the subscription root type.
    #[must_use]
    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.subscription = Some(name.into());
        self
    }

    /// Registers a declared type.
    #[must_use]
    pub fn register(mut self, def: impl Into<TypeDef>) -> Self {
        self.registry.register(def);
        self
    }

    /// Composes another schema into this one: its registry is merged
    /// (existing registrations win) and its root bindings fill any root
    /// not already bound here.
    #[must_use]
    pub fn extend(mut self, base: &Schema) -> Self {
        self.registry.merge(&base.registry);
        self.query = self.query.or_else(|| base.query.clone());
        self.mutation = self.mutation.or_else(|| base.mutation.clone());
        self.subscription = self.subscription.or_else(|| base.subscription.clone());
        self
    }

    /// Validates the declared type graph and produces the schema.
    ///
    /// Any inconsistency is a fatal [`DefinitionError`]; nothing invalid
    /// survives into query execution.
    pub fn build(self) -> Result<Schema, DefinitionError> {
        let schema = Schema {
            description: self.description,
            query: self.query,
            mutation: self.mutation,
            subscription: self.subscription,
            registry: self.registry,
        };
        Validator::new(&schema.registry).validate_schema(&schema)?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldDef, TypeRef};

    fn base() -> Schema {
        Schema::builder()
            .query_type("Query")
            .mutation_type("Mutation")
            .register(ObjectDef::new("Patron").field(FieldDef::data("id", TypeRef::id())))
            .register(
                ObjectDef::new("Query")
                    .field(FieldDef::resolver("patron", TypeRef::named("Patron"))),
            )
            .register(
                ObjectDef::new("Mutation")
                    .field(FieldDef::resolver("touch", TypeRef::boolean())),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_extend_merges_registry_and_inherits_roots() {
        let extended = Schema::builder()
            .query_type("BookQuery")
            .register(
                ObjectDef::new("Book").field(FieldDef::data("title", TypeRef::string())),
            )
            .register(
                ObjectDef::new("BookQuery")
                    .field(FieldDef::resolver("book", TypeRef::named("Book"))),
            )
            .extend(&base())
            .build()
            .unwrap();

        // Roots bound here win; the unbound ones inherit from the base.
        assert_eq!(extended.query.as_deref(), Some("BookQuery"));
        assert_eq!(extended.mutation.as_deref(), Some("Mutation"));
        assert!(extended.subscription.is_none());

        // Both registries survive the merge.
        for name in ["Book", "BookQuery", "Patron", "Query", "Mutation"] {
            assert!(extended.registry.contains(name), "missing {name}");
        }
        assert_eq!(extended.root_object("query").unwrap().name, "BookQuery");
        assert_eq!(extended.root_object("mutation").unwrap().name, "Mutation");
    }

    #[test]
    fn test_extend_keeps_local_registrations() {
        let extended = Schema::builder()
            .register(
                ObjectDef::new("Patron").field(FieldDef::data("name", TypeRef::string())),
            )
            .extend(&base())
            .build()
            .unwrap();

        // The local Patron shadows the base one.
        let patron = extended.registry.get("Patron").unwrap();
        assert!(patron.fields().unwrap().contains_key("name"));
        assert!(!patron.fields().unwrap().contains_key("id"));
        assert_eq!(extended.query.as_deref(), Some("Query"));
    }
}
