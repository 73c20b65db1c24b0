//! Type descriptor system for grql.
//!
//! Declared entity types are registered explicitly, once, at schema
//! construction time:
//! - `types`: type and field descriptors
//! - `registry`: the deduplicated registry of declared types
//! - `schema`: the schema descriptor and its builder
//! - `validate`: one-time, cycle-safe validation
//! - `print`: the SDL-style print form
//! - `introspection`: the registry rendered into the meta-type model
//! - `error`: definition errors, fatal at construction time

pub mod error;
pub mod introspection;
pub mod print;
pub mod registry;
pub mod schema;
pub mod types;
mod validate;

pub use error::DefinitionError;
pub use print::print_schema;
pub use registry::TypeRegistry;
pub use schema::{Schema, SchemaBuilder};
pub use types::{
    EnumDef, EnumValueDef, FieldDef, FieldKind, InputObjectDef, InterfaceDef, ObjectDef, ParamDef,
    ScalarKind, TypeDef, TypeRef, UnionDef,
};
