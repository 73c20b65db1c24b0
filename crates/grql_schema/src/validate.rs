//! One-time schema validation.
//!
//! The type graph may be cyclic, so every recursion is guarded by a
//! visited set keyed by type name: each descriptor is validated exactly
//! once no matter how many paths reach it.

use rustc_hash::FxHashSet;

use crate::error::DefinitionError;
use crate::registry::TypeRegistry;
use crate::schema::Schema;
use crate::types::{FieldDef, FieldKind, TypeDef, TypeRef};

pub(crate) struct Validator<'a> {
    registry: &'a TypeRegistry,
    validated: FxHashSet<&'a str>,
}

impl<'a> Validator<'a> {
    pub(crate) fn new(registry: &'a TypeRegistry) -> Self {
        Self {
            registry,
            validated: FxHashSet::default(),
        }
    }

    pub(crate) fn validate_schema(mut self, schema: &'a Schema) -> Result<(), DefinitionError> {
        for root in [&schema.query, &schema.mutation, &schema.subscription]
            .into_iter()
            .flatten()
        {
            let def = self
                .registry
                .get(root)
                .ok_or_else(|| DefinitionError::UnknownType(root.clone()))?;
            if !matches!(def, TypeDef::Object(_)) {
                return Err(DefinitionError::InvalidRootType {
                    root: root.clone(),
                    ty: def.kind().to_string(),
                });
            }
        }
        // Validate everything registered, reachable from a root or not.
        let registry = self.registry;
        for def in registry.iter() {
            self.validate_type(def)?;
        }
        Ok(())
    }

    fn validate_type(&mut self, def: &'a TypeDef) -> Result<(), DefinitionError> {
        if !self.validated.insert(def.name()) {
            return Ok(());
        }
        match def {
            TypeDef::Object(object) => {
                for field in object.fields.values() {
                    self.validate_output_field(&object.name, field)?;
                }
                for interface in &object.implements {
                    self.validate_implementation(object, interface)?;
                }
            }
            TypeDef::Interface(interface) => {
                for field in interface.fields.values() {
                    self.validate_output_field(&interface.name, field)?;
                }
            }
            TypeDef::Union(union) => {
                if union.members.is_empty() {
                    return Err(DefinitionError::EmptyUnion(union.name.clone()));
                }
                for member in &union.members {
                    let member_def = self
                        .registry
                        .get(member)
                        .ok_or_else(|| DefinitionError::UnknownType(member.clone()))?;
                    if !matches!(member_def, TypeDef::Object(_)) {
                        return Err(DefinitionError::InvalidUnionMember {
                            union: union.name.clone(),
                            member: member.clone(),
                        });
                    }
                    self.validate_type(member_def)?;
                }
            }
            TypeDef::Enum(en) => {
                for value in &en.values {
                    let duplicated = en.values.iter().filter(|v| v.name == value.name).count() > 1;
                    if duplicated {
                        return Err(DefinitionError::DuplicateEnumMember {
                            owner: en.name.clone(),
                            member: value.name.clone(),
                        });
                    }
                }
            }
            TypeDef::Input(input) => {
                for field in input.fields.values() {
                    if field.is_resolver() {
                        return Err(DefinitionError::ResolverFieldInInput {
                            input: input.name.clone(),
                            field: field.name.clone(),
                        });
                    }
                    self.check_input_type(&input.name, &field.ty)?;
                }
            }
        }
        Ok(())
    }

    /// Checks a field in output position: the declared type must be
    /// printable as a query type and must not be an input type.
    fn validate_output_field(
        &mut self,
        owner: &str,
        field: &'a FieldDef,
    ) -> Result<(), DefinitionError> {
        match self.registry.resolve(&field.ty)? {
            Some(TypeDef::Input(input)) => {
                return Err(DefinitionError::InvalidOutputType {
                    owner: owner.to_string(),
                    field: field.name.clone(),
                    ty: input.name.clone(),
                });
            }
            Some(target) => self.validate_type(target)?,
            None => {}
        }
        if let FieldKind::Resolver { params } = &field.kind {
            for param in params.values() {
                self.check_input_type(&param.name, &param.ty)?;
            }
        }
        Ok(())
    }

    /// Checks a parameter or input field position: object, interface and
    /// union types are not valid inputs.
    fn check_input_type(&mut self, name: &str, ty: &TypeRef) -> Result<(), DefinitionError> {
        match self.registry.resolve(ty)? {
            Some(target @ (TypeDef::Input(_) | TypeDef::Enum(_))) => self.validate_type(target),
            Some(other) => Err(DefinitionError::InvalidInputType {
                name: name.to_string(),
                ty: other.name().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// An object implementing an interface must expose a superset of the
    /// interface's fields.
    fn validate_implementation(
        &mut self,
        object: &'a crate::types::ObjectDef,
        interface: &str,
    ) -> Result<(), DefinitionError> {
        let interface_def = self
            .registry
            .get(interface)
            .ok_or_else(|| DefinitionError::UnknownType(interface.to_string()))?;
        let TypeDef::Interface(iface) = interface_def else {
            return Err(DefinitionError::NotAnInterface {
                object: object.name.clone(),
                name: interface.to_string(),
            });
        };
        for field in iface.fields.keys() {
            if !object.fields.contains_key(field) {
                return Err(DefinitionError::MissingInterfaceField {
                    object: object.name.clone(),
                    interface: interface.to_string(),
                    field: field.clone(),
                });
            }
        }
        self.validate_type(interface_def)
    }
}
