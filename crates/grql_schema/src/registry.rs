//! The type registry.
//!
//! The registry is the deduplicated set of every declared type, keyed by
//! name in registration order. Type references resolve lazily against it,
//! which is what lets cyclic type graphs register and validate without
//! recursion problems.

use indexmap::IndexMap;

use crate::error::DefinitionError;
use crate::types::{TypeDef, TypeRef};

/// All declared types, deduplicated by name.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDef>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type. A type registered twice under the same name keeps
    /// the first registration's position and takes the new definition.
    pub fn register(&mut self, def: impl Into<TypeDef>) {
        let def = def.into();
        self.types.insert(def.name().to_string(), def);
    }

    /// Gets a type by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Returns true if the name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Resolves the core declared type behind a reference.
    ///
    /// Scalar references have no registry entry and resolve to `None`;
    /// a named reference with no registration is a definition error.
    pub fn resolve<'a>(&'a self, ty: &TypeRef) -> Result<Option<&'a TypeDef>, DefinitionError> {
        match ty.shelled() {
            TypeRef::Named(name) => self
                .get(name)
                .map(Some)
                .ok_or_else(|| DefinitionError::UnknownType(name.clone())),
            _ => Ok(None),
        }
    }

    /// Returns true if `object` is (or implements) `candidate`.
    #[must_use]
    pub fn object_satisfies(&self, object: &str, candidate: &str) -> bool {
        if object == candidate {
            return true;
        }
        match self.get(object) {
            Some(TypeDef::Object(def)) => def.implements.iter().any(|i| i == candidate),
            _ => false,
        }
    }

    /// Merges another registry into this one, keeping existing entries.
    pub fn merge(&mut self, other: &TypeRegistry) {
        for (name, def) in &other.types {
            if !self.types.contains_key(name) {
                self.types.insert(name.clone(), def.clone());
            }
        }
    }

    /// Iterates types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
