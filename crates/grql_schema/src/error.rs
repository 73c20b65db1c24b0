//! Definition errors.
//!
//! Any inconsistency in a declared type graph is fatal and surfaces at
//! schema construction time, never during query execution.

use thiserror::Error;

/// A schema/type inconsistency detected while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("cannot find type `{0}`")]
    UnknownType(String),

    #[error("`{ty}` is not a valid output type for field `{field}` on `{owner}`")]
    InvalidOutputType {
        owner: String,
        field: String,
        ty: String,
    },

    #[error("`{ty}` is not a valid input type for `{name}`")]
    InvalidInputType { name: String, ty: String },

    #[error("input `{input}` field `{field}` must be a plain data field")]
    ResolverFieldInInput { input: String, field: String },

    #[error("union `{0}` must have at least one member")]
    EmptyUnion(String),

    #[error("union `{union}` member `{member}` must be an object type")]
    InvalidUnionMember { union: String, member: String },

    #[error("`{object}` implements `{name}`, which is not an interface")]
    NotAnInterface { object: String, name: String },

    #[error("`{object}` implements `{interface}` but does not define field `{field}`")]
    MissingInterfaceField {
        object: String,
        interface: String,
        field: String,
    },

    #[error("schema root `{root}` must be an object type, found `{ty}`")]
    InvalidRootType { root: String, ty: String },

    #[error("enum `{owner}` declares member `{member}` more than once")]
    DuplicateEnumMember { owner: String, member: String },
}
