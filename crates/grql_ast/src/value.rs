//! Literal and variable value nodes.

/// A literal or variable-reference value as it appears in a query.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Int(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
    /// An enum member symbol, e.g. `NEWHOPE`.
    Enum(String),
    List(Vec<ValueNode>),
    Object(Vec<ObjectFieldNode>),
    /// A `$variable` reference, resolved against the execution variables.
    Variable(String),
}

impl ValueNode {
    /// Creates a string value node.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Creates a variable reference node.
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Creates an object value node from (name, value) pairs.
    #[must_use]
    pub fn object(fields: impl IntoIterator<Item = (&'static str, ValueNode)>) -> Self {
        Self::Object(
            fields
                .into_iter()
                .map(|(name, value)| ObjectFieldNode {
                    name: name.to_string(),
                    value,
                })
                .collect(),
        )
    }
}

/// One field of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectFieldNode {
    pub name: String,
    pub value: ValueNode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_constructor() {
        let node = ValueNode::object([("lat", ValueNode::Float(32.2)), ("lng", ValueNode::Int(12))]);
        match node {
            ValueNode::Object(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "lat");
            }
            _ => panic!("expected object node"),
        }
    }
}
