//! SDL-style schema printing.
//!
//! An order-preserving projection of the type registry: every registered
//! type is printed exactly once, in registration order, followed by the
//! `schema` block naming the root bindings.

use grql_core::to_camel_case;

use crate::schema::Schema;
use crate::types::{
    EnumDef, FieldDef, FieldKind, InputObjectDef, InterfaceDef, ObjectDef, TypeDef, UnionDef,
};

/// Renders a schema in its SDL-like print form.
#[must_use]
pub fn print_schema(schema: &Schema) -> String {
    let mut printer = Printer::default();
    printer.print(schema);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn print(&mut self, schema: &Schema) {
        for def in schema.registry.iter() {
            self.print_type(def);
            self.out.push_str("\n\n");
        }
        self.print_schema_block(schema);
        self.out.push('\n');
    }

    fn print_type(&mut self, def: &TypeDef) {
        match def {
            TypeDef::Object(object) => self.print_object(object),
            TypeDef::Interface(interface) => self.print_interface(interface),
            TypeDef::Union(union) => self.print_union(union),
            TypeDef::Enum(en) => self.print_enum(en),
            TypeDef::Input(input) => self.print_input(input),
        }
    }

    fn print_object(&mut self, object: &ObjectDef) {
        self.print_description(object.description.as_deref());
        self.out.push_str("type ");
        self.out.push_str(&object.name);
        for (i, interface) in object.implements.iter().enumerate() {
            self.out
                .push_str(if i == 0 { " implements " } else { " & " });
            self.out.push_str(interface);
        }
        self.print_field_block(object.fields.values());
    }

    fn print_interface(&mut self, interface: &InterfaceDef) {
        self.print_description(interface.description.as_deref());
        self.out.push_str("interface ");
        self.out.push_str(&interface.name);
        self.print_field_block(interface.fields.values());
    }

    fn print_union(&mut self, union: &UnionDef) {
        self.print_description(union.description.as_deref());
        self.out.push_str("union ");
        self.out.push_str(&union.name);
        self.out.push_str(" =");
        for member in &union.members {
            self.out.push('\n');
            self.push_indent(1);
            self.out.push_str("| ");
            self.out.push_str(member);
        }
    }

    fn print_enum(&mut self, en: &EnumDef) {
        self.print_description(en.description.as_deref());
        self.out.push_str("enum ");
        self.out.push_str(&en.name);
        self.out.push_str(" {");
        for value in &en.values {
            self.out.push('\n');
            self.push_indent(1);
            self.out.push_str(&value.name);
        }
        self.out.push_str("\n}");
    }

    fn print_input(&mut self, input: &InputObjectDef) {
        self.print_description(input.description.as_deref());
        self.out.push_str("input ");
        self.out.push_str(&input.name);
        self.print_field_block(input.fields.values());
    }

    fn print_schema_block(&mut self, schema: &Schema) {
        self.print_description(schema.description.as_deref());
        self.out.push_str("schema {");
        for (keyword, root) in [
            ("query", &schema.query),
            ("mutation", &schema.mutation),
            ("subscription", &schema.subscription),
        ] {
            if let Some(name) = root {
                self.out.push('\n');
                self.push_indent(1);
                self.out.push_str(keyword);
                self.out.push_str(": ");
                self.out.push_str(name);
            }
        }
        self.out.push_str("\n}");
    }

    fn print_field_block<'a>(&mut self, fields: impl Iterator<Item = &'a FieldDef>) {
        self.out.push_str(" {");
        self.indent += 1;
        for field in fields {
            self.out.push('\n');
            if let Some(description) = &field.description {
                self.push_indent(0);
                self.out.push('"');
                self.out.push_str(description);
                self.out.push_str("\"\n");
            }
            self.push_indent(0);
            self.out.push_str(&to_camel_case(&field.name));
            if let FieldKind::Resolver { params } = &field.kind {
                if !params.is_empty() {
                    self.out.push('(');
                    self.indent += 1;
                    for param in params.values() {
                        self.out.push('\n');
                        self.push_indent(0);
                        self.out.push_str(&to_camel_case(&param.name));
                        self.out.push_str(": ");
                        self.out.push_str(&param.ty.to_string());
                        if let Some(default) = &param.default {
                            self.out.push_str(" = ");
                            self.out.push_str(&default.to_string());
                        }
                    }
                    self.indent -= 1;
                    self.out.push('\n');
                    self.push_indent(0);
                    self.out.push(')');
                }
            }
            self.out.push_str(": ");
            self.out.push_str(&field.ty.to_string());
        }
        self.indent -= 1;
        self.out.push_str("\n}");
    }

    fn print_description(&mut self, description: Option<&str>) {
        if let Some(description) = description {
            self.out.push_str("\"\"\"\n");
            self.out.push_str(description);
            self.out.push_str("\n\"\"\"\n");
        }
    }

    fn push_indent(&mut self, extra: usize) {
        for _ in 0..self.indent + extra {
            self.out.push_str("  ");
        }
    }
}
