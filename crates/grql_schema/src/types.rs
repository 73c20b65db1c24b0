//! Type and field descriptors.
//!
//! Field mappings are insertion-ordered: declaration order drives both
//! the print form and result ordering for plain data fields.

use grql_core::to_snake_case;
use indexmap::IndexMap;
use serde_json::Value;

/// A built-in scalar kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Float,
    String,
    Boolean,
    Id,
}

impl ScalarKind {
    /// The scalar's name in the print form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Id => "ID",
        }
    }
}

/// A reference to a declared type, including its shape wrappers.
///
/// `Named` is a lazily-resolved handle: the target may be registered after
/// the referencing field is declared, which is what makes mutually
/// recursive types expressible. An unresolvable name is a definition
/// error at validation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Scalar(ScalarKind),
    Named(String),
    List(Box<TypeRef>),
    Optional(Box<TypeRef>),
}

impl TypeRef {
    #[must_use]
    pub const fn int() -> Self {
        Self::Scalar(ScalarKind::Int)
    }

    #[must_use]
    pub const fn float() -> Self {
        Self::Scalar(ScalarKind::Float)
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::Scalar(ScalarKind::String)
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::Scalar(ScalarKind::Boolean)
    }

    #[must_use]
    pub const fn id() -> Self {
        Self::Scalar(ScalarKind::Id)
    }

    /// References a declared type by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps a type in a list.
    #[must_use]
    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    /// Marks a type as nullable.
    #[must_use]
    pub fn optional(inner: TypeRef) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Returns true if the outermost shape allows null.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Strips `Optional` and `List` wrappers down to the core type.
    #[must_use]
    pub fn shelled(&self) -> &TypeRef {
        match self {
            Self::Optional(inner) | Self::List(inner) => inner.shelled(),
            other => other,
        }
    }

    /// The name of the core declared type, if the core is `Named`.
    #[must_use]
    pub fn named_target(&self) -> Option<&str> {
        match self.shelled() {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }

    fn render(&self, nonnull: bool, out: &mut String) {
        match self {
            Self::Optional(inner) => inner.render(false, out),
            Self::List(inner) => {
                out.push('[');
                inner.render(true, out);
                out.push(']');
                if nonnull {
                    out.push('!');
                }
            }
            Self::Scalar(kind) => {
                out.push_str(kind.name());
                if nonnull {
                    out.push('!');
                }
            }
            Self::Named(name) => {
                out.push_str(name);
                if nonnull {
                    out.push('!');
                }
            }
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        self.render(true, &mut out);
        write!(f, "{out}")
    }
}

/// A declared resolver parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeRef,
    pub description: Option<String>,
    /// Applied only when the argument is entirely absent from the query;
    /// an explicit `null` overrides it.
    pub default: Option<Value>,
}

impl ParamDef {
    /// Creates a parameter descriptor. The name is normalized to the
    /// server-side snake convention.
    #[must_use]
    pub fn new(name: impl AsRef<str>, ty: TypeRef) -> Self {
        Self {
            name: to_snake_case(name.as_ref()),
            ty,
            description: None,
            default: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// What produces a field's value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Read directly from the owning instance's stored attribute.
    Data,
    /// Produced by invoking a bound resolver with coerced arguments.
    Resolver { params: IndexMap<String, ParamDef> },
}

/// A field descriptor, exclusively owned by its declaring type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub kind: FieldKind,
}

impl FieldDef {
    /// Declares a plain data field.
    #[must_use]
    pub fn data(name: impl AsRef<str>, ty: TypeRef) -> Self {
        Self {
            name: to_snake_case(name.as_ref()),
            description: None,
            ty,
            kind: FieldKind::Data,
        }
    }

    /// Declares a resolver field.
    #[must_use]
    pub fn resolver(name: impl AsRef<str>, ty: TypeRef) -> Self {
        Self {
            name: to_snake_case(name.as_ref()),
            description: None,
            ty,
            kind: FieldKind::Resolver {
                params: IndexMap::new(),
            },
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a parameter to a resolver field. Ignored on data fields.
    #[must_use]
    pub fn with_param(mut self, param: ParamDef) -> Self {
        if let FieldKind::Resolver { params } = &mut self.kind {
            params.insert(param.name.clone(), param);
        }
        self
    }

    /// Returns true if this is a resolver field.
    #[must_use]
    pub const fn is_resolver(&self) -> bool {
        matches!(self.kind, FieldKind::Resolver { .. })
    }

    /// The declared parameters, for resolver fields.
    #[must_use]
    pub fn params(&self) -> Option<&IndexMap<String, ParamDef>> {
        match &self.kind {
            FieldKind::Resolver { params } => Some(params),
            FieldKind::Data => None,
        }
    }
}

/// A declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Object(ObjectDef),
    Interface(InterfaceDef),
    Union(UnionDef),
    Enum(EnumDef),
    Input(InputObjectDef),
}

impl TypeDef {
    /// The declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Object(d) => &d.name,
            Self::Interface(d) => &d.name,
            Self::Union(d) => &d.name,
            Self::Enum(d) => &d.name,
            Self::Input(d) => &d.name,
        }
    }

    /// The kind keyword used in the print form and in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "type",
            Self::Interface(_) => "interface",
            Self::Union(_) => "union",
            Self::Enum(_) => "enum",
            Self::Input(_) => "input",
        }
    }

    /// The fields of an object or interface.
    #[must_use]
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDef>> {
        match self {
            Self::Object(d) => Some(&d.fields),
            Self::Interface(d) => Some(&d.fields),
            Self::Input(d) => Some(&d.fields),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectDef> {
        match self {
            Self::Object(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_enum(&self) -> Option<&EnumDef> {
        match self {
            Self::Enum(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_input(&self) -> Option<&InputObjectDef> {
        match self {
            Self::Input(d) => Some(d),
            _ => None,
        }
    }
}

/// A concrete, resolvable object type.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub implements: Vec<String>,
}

impl ObjectDef {
    /// Starts declaring an object type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            implements: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    /// Declares a field, in declaration order.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

/// An abstract interface type.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
}

impl InterfaceDef {
    /// Starts declaring an interface type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a field.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

/// A closed set of object members.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDef {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

impl UnionDef {
    /// Declares a union over the given member type names.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: None,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns true if the named type is a member.
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }
}

/// One named integral member of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDef {
    pub name: String,
    pub value: i32,
    pub description: Option<String>,
}

/// A closed set of named integral values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDef>,
}

impl EnumDef {
    /// Starts declaring an enum type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a member.
    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: i32) -> Self {
        self.values.push(EnumValueDef {
            name: name.into(),
            value,
            description: None,
        });
        self
    }

    /// Returns true if the symbol names a member.
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.values.iter().any(|v| v.name == name)
    }

    /// Looks up a member's integral value by name.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|v| v.name == name).map(|v| v.value)
    }

    /// Looks up a member's name by integral value.
    #[must_use]
    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.value == value)
            .map(|v| v.name.as_str())
    }

    /// Maps a list of names to their values; `None` if any name is unknown.
    #[must_use]
    pub fn values_of(&self, names: &[&str]) -> Option<Vec<i32>> {
        names.iter().map(|name| self.value_of(name)).collect()
    }

    /// Maps a list of values to their names; `None` if any value is unknown.
    #[must_use]
    pub fn names_of(&self, values: &[i32]) -> Option<Vec<&str>> {
        values.iter().map(|&value| self.name_of(value)).collect()
    }
}

/// A data-only type usable in argument and variable positions.
#[derive(Debug, Clone, PartialEq)]
pub struct InputObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
}

impl InputObjectDef {
    /// Starts declaring an input type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a field. Input fields must be plain data fields.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

impl From<ObjectDef> for TypeDef {
    fn from(def: ObjectDef) -> Self {
        Self::Object(def)
    }
}

impl From<InterfaceDef> for TypeDef {
    fn from(def: InterfaceDef) -> Self {
        Self::Interface(def)
    }
}

impl From<UnionDef> for TypeDef {
    fn from(def: UnionDef) -> Self {
        Self::Union(def)
    }
}

impl From<EnumDef> for TypeDef {
    fn from(def: EnumDef) -> Self {
        Self::Enum(def)
    }
}

impl From<InputObjectDef> for TypeDef {
    fn from(def: InputObjectDef) -> Self {
        Self::Input(def)
    }
}
