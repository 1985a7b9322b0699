//! Private name allocation
//!
//! Referenced private symbols are hoisted into the bundle under synthesized names. Names
//! are a fixed prefix followed by a bijective base-26 counter (`a`..`z`, `aa`, `ab`, ...),
//! skipping anything the root module already exports.

use rustc_hash::FxHashSet;

use super::symbols::SymbolTable;
use crate::error::{BundleError, BundleResult};
use crate::schema::{
    ClassMetadata, FunctionMetadata, MemberMetadata, MetadataValue, MethodMetadata, Reference,
    SymbolicNode,
};

/// Prefix of every synthesized private name
pub const PRIVATE_NAME_PREFIX: char = '\u{0275}';

/// Private name for the `index`-th counter value
pub fn private_name(index: usize) -> String {
    let mut digits = Vec::new();
    let mut remaining = index;
    loop {
        digits.push(b'a' + (remaining % 26) as u8);
        if remaining < 26 {
            break;
        }
        remaining = remaining / 26 - 1;
    }

    let mut name = String::with_capacity(digits.len() + 2);
    name.push(PRIVATE_NAME_PREFIX);
    name.extend(digits.iter().rev().map(|&digit| digit as char));
    name
}

/// Sequential allocator of private names
#[derive(Debug, Default)]
pub struct PrivateNameAllocator {
    next: usize,
    reserved: FxHashSet<String>,
}

impl PrivateNameAllocator {
    /// Create an allocator that never yields any of `reserved`
    pub fn new(reserved: impl IntoIterator<Item = String>) -> Self {
        Self {
            next: 0,
            reserved: reserved.into_iter().collect(),
        }
    }

    /// Next unused name
    pub fn next_name(&mut self) -> String {
        loop {
            let name = private_name(self.next);
            self.next += 1;
            if !self.reserved.contains(&name) {
                return name;
            }
        }
    }
}

/// Replace every bundled handle in `value` with a reference to its final name
pub fn finalize_value(value: MetadataValue, table: &SymbolTable) -> BundleResult<MetadataValue> {
    Ok(match value {
        MetadataValue::Array(items) => MetadataValue::Array(finalize_values(items, table)?),
        MetadataValue::Object(entries) => MetadataValue::Object(
            entries
                .into_iter()
                .map(|(key, value)| Ok((key, finalize_value(value, table)?)))
                .collect::<BundleResult<_>>()?,
        ),
        MetadataValue::Node(node) => finalize_node(*node, table)?,
        primitive => primitive,
    })
}

fn finalize_node(node: SymbolicNode, table: &SymbolTable) -> BundleResult<MetadataValue> {
    let finalized = match node {
        SymbolicNode::Reference(Reference::Bundled(id)) => {
            let symbol = table.get(id);
            let is_private = table.canonical(id)?.is_private;
            let name = if is_private {
                symbol
                    .private_name
                    .clone()
                    .ok_or_else(|| BundleError::UnresolvedHandle {
                        module: symbol.module.clone(),
                        name: symbol.name.clone(),
                    })?
            } else {
                symbol.name.clone()
            };
            return Ok(Reference::global(name).into());
        }
        SymbolicNode::Reference(reference) => SymbolicNode::Reference(finalize_reference(reference, table)?),
        SymbolicNode::Class(class) => SymbolicNode::Class(finalize_class(class, table)?),
        SymbolicNode::Function(function) => {
            SymbolicNode::Function(finalize_function(function, table)?)
        }
        SymbolicNode::Interface => SymbolicNode::Interface,
        SymbolicNode::Error(error) => SymbolicNode::Error(error),
        SymbolicNode::Binary {
            operator,
            left,
            right,
        } => SymbolicNode::Binary {
            operator,
            left: finalize_value(left, table)?,
            right: finalize_value(right, table)?,
        },
        SymbolicNode::Index { expression, index } => SymbolicNode::Index {
            expression: finalize_value(expression, table)?,
            index: finalize_value(index, table)?,
        },
        SymbolicNode::Pre { operator, operand } => SymbolicNode::Pre {
            operator,
            operand: finalize_value(operand, table)?,
        },
        SymbolicNode::If {
            condition,
            then_expression,
            else_expression,
        } => SymbolicNode::If {
            condition: finalize_value(condition, table)?,
            then_expression: finalize_value(then_expression, table)?,
            else_expression: finalize_value(else_expression, table)?,
        },
        SymbolicNode::Call {
            expression,
            arguments,
        } => SymbolicNode::Call {
            expression: finalize_value(expression, table)?,
            arguments: finalize_list(arguments, table)?,
        },
        SymbolicNode::New {
            expression,
            arguments,
        } => SymbolicNode::New {
            expression: finalize_value(expression, table)?,
            arguments: finalize_list(arguments, table)?,
        },
        SymbolicNode::Select { expression, member } => SymbolicNode::Select {
            expression: finalize_value(expression, table)?,
            member,
        },
        SymbolicNode::Spread { expression } => SymbolicNode::Spread {
            expression: finalize_value(expression, table)?,
        },
    };
    Ok(finalized.into())
}

fn finalize_reference(reference: Reference, table: &SymbolTable) -> BundleResult<Reference> {
    Ok(match reference {
        Reference::Imported {
            module,
            name,
            arguments,
        } => Reference::Imported {
            module,
            name,
            arguments: finalize_list(arguments, table)?,
        },
        Reference::ImportedDefault {
            module,
            default,
            arguments,
        } => Reference::ImportedDefault {
            module,
            default,
            arguments: finalize_list(arguments, table)?,
        },
        Reference::Global { name, arguments } => Reference::Global {
            name,
            arguments: finalize_list(arguments, table)?,
        },
        other => other,
    })
}

fn finalize_class(class: ClassMetadata, table: &SymbolTable) -> BundleResult<ClassMetadata> {
    let members = match class.members {
        Some(members) => Some(
            members
                .into_iter()
                .map(|(name, overloads)| {
                    let overloads = overloads
                        .into_iter()
                        .map(|member| finalize_member(member, table))
                        .collect::<BundleResult<Vec<_>>>()?;
                    Ok((name, overloads))
                })
                .collect::<BundleResult<_>>()?,
        ),
        None => None,
    };
    let statics = match class.statics {
        Some(statics) => Some(
            statics
                .into_iter()
                .map(|(name, value)| Ok((name, finalize_value(value, table)?)))
                .collect::<BundleResult<_>>()?,
        ),
        None => None,
    };

    Ok(ClassMetadata {
        extends: finalize_optional(class.extends, table)?,
        arity: class.arity,
        decorators: finalize_list(class.decorators, table)?,
        members,
        statics,
    })
}

fn finalize_member(member: MemberMetadata, table: &SymbolTable) -> BundleResult<MemberMetadata> {
    Ok(match member {
        MemberMetadata::Constructor(method) => {
            MemberMetadata::Constructor(finalize_method(method, table)?)
        }
        MemberMetadata::Method(method) => MemberMetadata::Method(finalize_method(method, table)?),
        MemberMetadata::Property(mut property) => {
            property.decorators = finalize_list(property.decorators, table)?;
            MemberMetadata::Property(property)
        }
    })
}

fn finalize_method(method: MethodMetadata, table: &SymbolTable) -> BundleResult<MethodMetadata> {
    let parameter_decorators = match method.parameter_decorators {
        Some(parameters) => Some(
            parameters
                .into_iter()
                .map(|decorators| finalize_list(decorators, table))
                .collect::<BundleResult<Vec<_>>>()?,
        ),
        None => None,
    };
    Ok(MethodMetadata {
        decorators: finalize_list(method.decorators, table)?,
        parameter_decorators,
        parameters: finalize_list(method.parameters, table)?,
    })
}

fn finalize_function(
    function: FunctionMetadata,
    table: &SymbolTable,
) -> BundleResult<FunctionMetadata> {
    Ok(FunctionMetadata {
        parameters: function.parameters,
        defaults: finalize_list(function.defaults, table)?,
        value: finalize_optional(function.value, table)?,
    })
}

fn finalize_values(
    values: Vec<MetadataValue>,
    table: &SymbolTable,
) -> BundleResult<Vec<MetadataValue>> {
    values
        .into_iter()
        .map(|value| finalize_value(value, table))
        .collect()
}

fn finalize_list(
    values: Option<Vec<MetadataValue>>,
    table: &SymbolTable,
) -> BundleResult<Option<Vec<MetadataValue>>> {
    values.map(|values| finalize_values(values, table)).transpose()
}

fn finalize_optional(
    value: Option<MetadataValue>,
    table: &SymbolTable,
) -> BundleResult<Option<MetadataValue>> {
    value.map(|value| finalize_value(value, table)).transpose()
}
