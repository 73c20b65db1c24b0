//! Document, operation, selection and fragment nodes.

use grql_core::Location;

use crate::value::ValueNode;

/// A complete executable document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub definitions: Vec<Definition>,
}

impl Document {
    /// Creates a document from its definitions.
    #[must_use]
    pub fn new(definitions: Vec<Definition>) -> Self {
        Self { definitions }
    }

    /// Returns the executable operations in document order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
    }

    /// Looks up a named fragment definition.
    #[must_use]
    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.definitions.iter().find_map(|def| match def {
            Definition::Fragment(frag) if frag.name == name => Some(frag),
            _ => None,
        })
    }
}

/// A top-level definition.
#[derive(Debug, Clone)]
pub enum Definition {
    Operation(OperationDefinition),
    Fragment(FragmentDefinition),
}

/// Type of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Returns the keyword form of the operation kind.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

/// An operation definition (query, mutation or subscription).
#[derive(Debug, Clone)]
pub struct OperationDefinition {
    pub operation: OperationKind,
    pub name: Option<String>,
    pub selections: Vec<Selection>,
    pub location: Location,
}

impl OperationDefinition {
    /// Creates an operation definition.
    #[must_use]
    pub fn new(operation: OperationKind, selections: Vec<Selection>) -> Self {
        Self {
            operation,
            name: None,
            selections,
            location: Location::default(),
        }
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// A named fragment definition.
#[derive(Debug, Clone)]
pub struct FragmentDefinition {
    pub name: String,
    pub type_condition: String,
    pub selections: Vec<Selection>,
    pub location: Location,
}

impl FragmentDefinition {
    /// Creates a fragment definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        type_condition: impl Into<String>,
        selections: Vec<Selection>,
    ) -> Self {
        Self {
            name: name.into(),
            type_condition: type_condition.into(),
            selections,
            location: Location::default(),
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// One entry in a selection set.
#[derive(Debug, Clone)]
pub enum Selection {
    Field(FieldNode),
    InlineFragment(InlineFragmentNode),
    FragmentSpread(FragmentSpreadNode),
}

/// A requested field, possibly aliased, with arguments and sub-selections.
#[derive(Debug, Clone)]
pub struct FieldNode {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<ArgumentNode>,
    pub selections: Vec<Selection>,
    pub location: Location,
}

impl FieldNode {
    /// Creates a leaf field node.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            name: name.into(),
            arguments: Vec::new(),
            selections: Vec::new(),
            location: Location::default(),
        }
    }

    /// Sets the response alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Adds an argument.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: ValueNode) -> Self {
        self.arguments.push(ArgumentNode {
            name: name.into(),
            value,
            location: self.location,
        });
        self
    }

    /// Sets the sub-selection set.
    #[must_use]
    pub fn with_selections(mut self, selections: Vec<Selection>) -> Self {
        self.selections = selections;
        self
    }

    /// Sets the source location.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// The output name this field writes to: alias if present, else name.
    #[must_use]
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl From<FieldNode> for Selection {
    fn from(node: FieldNode) -> Self {
        Self::Field(node)
    }
}

/// A single argument attached to a field.
#[derive(Debug, Clone)]
pub struct ArgumentNode {
    pub name: String,
    pub value: ValueNode,
    pub location: Location,
}

/// An inline fragment with a type condition.
#[derive(Debug, Clone)]
pub struct InlineFragmentNode {
    pub type_condition: String,
    pub selections: Vec<Selection>,
    pub location: Location,
}

impl InlineFragmentNode {
    /// Creates an inline fragment.
    #[must_use]
    pub fn new(type_condition: impl Into<String>, selections: Vec<Selection>) -> Self {
        Self {
            type_condition: type_condition.into(),
            selections,
            location: Location::default(),
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

impl From<InlineFragmentNode> for Selection {
    fn from(node: InlineFragmentNode) -> Self {
        Self::InlineFragment(node)
    }
}

/// A spread of a named fragment.
#[derive(Debug, Clone)]
pub struct FragmentSpreadNode {
    pub name: String,
    pub location: Location,
}

impl FragmentSpreadNode {
    /// Creates a fragment spread.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: Location::default(),
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

impl From<FragmentSpreadNode> for Selection {
    fn from(node: FragmentSpreadNode) -> Self {
        Self::FragmentSpread(node)
    }
}
