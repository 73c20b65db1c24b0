//! Parsed-document model for grql.
//!
//! The execution engine consumes queries as an already-built tree of
//! operation, selection and fragment nodes, each carrying a source
//! [`Location`](grql_core::Location). Building that tree from query text
//! is the job of an external parser; this crate only defines the shape of
//! its output, together with constructors that make documents cheap to
//! materialize by hand.

pub mod document;
pub mod value;

pub use document::{
    ArgumentNode, Definition, Document, FieldNode, FragmentDefinition, FragmentSpreadNode,
    InlineFragmentNode, OperationDefinition, OperationKind, Selection,
};
pub use value::{ObjectFieldNode, ValueNode};
