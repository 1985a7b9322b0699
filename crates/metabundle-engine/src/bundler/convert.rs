//! Value conversion
//!
//! Rewrites the value trees of bundled modules so that every reference points at an
//! identity reachable from the bundle. References into the bundle become
//! [`Reference::Bundled`] handles; their final names are filled in once all private names
//! are known (see `names::finalize_value`).

use super::path::{is_relative, resolve_module};
use super::symbols::SymbolId;
use super::MetadataBundler;
use crate::error::BundleResult;
use crate::host::MetadataHost;
use crate::schema::{
    ClassMetadata, FunctionMetadata, MemberMetadata, MetadataError, MetadataMap, MetadataValue,
    MethodMetadata, PropertyMetadata, Reference, SymbolicNode,
};

/// Names with this prefix are compiler-synthesized and never bundled
pub const RESERVED_NAME_PREFIX: &str = "___";

impl<H: MetadataHost> MetadataBundler<H> {
    /// Convert the value of a symbol's canonical identity, once
    pub(crate) fn convert_symbol(&mut self, id: SymbolId) -> BundleResult<()> {
        let target = self.ensure_canonical(id).symbol;
        if self.symbols.get(target).referenced {
            return Ok(());
        }
        self.symbols.get_mut(target).referenced = true;

        let declaration = self.ensure_canonical(target).declaration;
        let declaration = self.symbols.get(declaration);
        let (module, name) = (declaration.module.clone(), declaration.name.clone());
        if name.starts_with(RESERVED_NAME_PREFIX) {
            return Ok(());
        }

        let Some(metadata) = self.store.get(&module) else {
            return Ok(());
        };
        let Some(value) = metadata.get(&name) else {
            return Ok(());
        };

        let converted = self.convert_value(&module, value)?;
        self.symbols.get_mut(target).value = Some(converted);
        Ok(())
    }

    /// Convert any value found in `module`
    pub(crate) fn convert_value(
        &mut self,
        module: &str,
        value: &MetadataValue,
    ) -> BundleResult<MetadataValue> {
        Ok(match value {
            MetadataValue::Null
            | MetadataValue::Bool(_)
            | MetadataValue::Number(_)
            | MetadataValue::String(_) => value.clone(),
            MetadataValue::Array(items) => MetadataValue::Array(self.convert_values(module, items)?),
            MetadataValue::Object(entries) => {
                MetadataValue::Object(self.convert_map(module, entries)?)
            }
            MetadataValue::Node(node) => self.convert_node(module, node)?,
        })
    }

    fn convert_node(&mut self, module: &str, node: &SymbolicNode) -> BundleResult<MetadataValue> {
        let converted = match node {
            SymbolicNode::Class(class) => SymbolicNode::Class(self.convert_class(module, class)?),
            // Interfaces carry no runtime value.
            SymbolicNode::Interface => SymbolicNode::Interface,
            SymbolicNode::Function(function) => {
                SymbolicNode::Function(self.convert_function(module, function)?)
            }
            SymbolicNode::Error(error) => SymbolicNode::Error(convert_error(module, error)),
            SymbolicNode::Reference(reference) => {
                return self.convert_reference(module, reference);
            }
            SymbolicNode::Binary {
                operator,
                left,
                right,
            } => SymbolicNode::Binary {
                operator: operator.clone(),
                left: self.convert_value(module, left)?,
                right: self.convert_value(module, right)?,
            },
            SymbolicNode::Index { expression, index } => SymbolicNode::Index {
                expression: self.convert_value(module, expression)?,
                index: self.convert_value(module, index)?,
            },
            SymbolicNode::Pre { operator, operand } => SymbolicNode::Pre {
                operator: operator.clone(),
                operand: self.convert_value(module, operand)?,
            },
            SymbolicNode::If {
                condition,
                then_expression,
                else_expression,
            } => SymbolicNode::If {
                condition: self.convert_value(module, condition)?,
                then_expression: self.convert_value(module, then_expression)?,
                else_expression: self.convert_value(module, else_expression)?,
            },
            SymbolicNode::Call {
                expression,
                arguments,
            } => SymbolicNode::Call {
                expression: self.convert_value(module, expression)?,
                arguments: self.convert_list(module, arguments.as_deref())?,
            },
            SymbolicNode::New {
                expression,
                arguments,
            } => SymbolicNode::New {
                expression: self.convert_value(module, expression)?,
                arguments: self.convert_list(module, arguments.as_deref())?,
            },
            SymbolicNode::Select { expression, member } => SymbolicNode::Select {
                expression: self.convert_value(module, expression)?,
                member: member.clone(),
            },
            SymbolicNode::Spread { expression } => SymbolicNode::Spread {
                expression: self.convert_value(module, expression)?,
            },
        };
        Ok(converted.into())
    }

    fn convert_class(&mut self, module: &str, class: &ClassMetadata) -> BundleResult<ClassMetadata> {
        let members = match &class.members {
            Some(members) => {
                let mut result = indexmap::IndexMap::with_capacity(members.len());
                for (name, overloads) in members {
                    let converted = overloads
                        .iter()
                        .map(|member| self.convert_member(module, member))
                        .collect::<BundleResult<Vec<_>>>()?;
                    result.insert(name.clone(), converted);
                }
                Some(result)
            }
            None => None,
        };

        let statics = match &class.statics {
            Some(statics) => {
                let mut result = MetadataMap::with_capacity(statics.len());
                for (name, value) in statics {
                    let converted = match value.as_node() {
                        Some(SymbolicNode::Function(function)) => {
                            SymbolicNode::Function(self.convert_function(module, function)?).into()
                        }
                        _ => value.clone(),
                    };
                    result.insert(name.clone(), converted);
                }
                Some(result)
            }
            None => None,
        };

        Ok(ClassMetadata {
            extends: self.convert_optional(module, class.extends.as_ref())?,
            arity: class.arity,
            decorators: self.convert_list(module, class.decorators.as_deref())?,
            members,
            statics,
        })
    }

    fn convert_member(
        &mut self,
        module: &str,
        member: &MemberMetadata,
    ) -> BundleResult<MemberMetadata> {
        Ok(match member {
            MemberMetadata::Constructor(method) => MemberMetadata::Constructor(MethodMetadata {
                decorators: self.convert_list(module, method.decorators.as_deref())?,
                parameter_decorators: self
                    .convert_parameter_decorators(module, method.parameter_decorators.as_deref())?,
                parameters: self.convert_list(module, method.parameters.as_deref())?,
            }),
            MemberMetadata::Method(method) => MemberMetadata::Method(MethodMetadata {
                decorators: self.convert_list(module, method.decorators.as_deref())?,
                parameter_decorators: self
                    .convert_parameter_decorators(module, method.parameter_decorators.as_deref())?,
                parameters: None,
            }),
            MemberMetadata::Property(property) => MemberMetadata::Property(PropertyMetadata {
                decorators: self.convert_list(module, property.decorators.as_deref())?,
            }),
        })
    }

    fn convert_parameter_decorators(
        &mut self,
        module: &str,
        parameters: Option<&[Option<Vec<MetadataValue>>]>,
    ) -> BundleResult<Option<Vec<Option<Vec<MetadataValue>>>>> {
        let Some(parameters) = parameters else {
            return Ok(None);
        };
        parameters
            .iter()
            .map(|decorators| self.convert_list(module, decorators.as_deref()))
            .collect::<BundleResult<Vec<_>>>()
            .map(Some)
    }

    fn convert_function(
        &mut self,
        module: &str,
        function: &FunctionMetadata,
    ) -> BundleResult<FunctionMetadata> {
        Ok(FunctionMetadata {
            parameters: function.parameters.clone(),
            defaults: self.convert_list(module, function.defaults.as_deref())?,
            value: self.convert_optional(module, function.value.as_ref())?,
        })
    }

    fn convert_reference(
        &mut self,
        module: &str,
        reference: &Reference,
    ) -> BundleResult<MetadataValue> {
        match reference {
            Reference::Global { name, arguments } => {
                let declared = self
                    .store
                    .get(module)
                    .is_some_and(|metadata| metadata.declares(name));
                if declared {
                    let symbol = self.canonical_symbol_of(module, name);
                    return self.create_reference(symbol);
                }
                // Globals such as `Math` or `JSON` stay as they are.
                Ok(Reference::Global {
                    name: name.clone(),
                    arguments: self.convert_list(module, arguments.as_deref())?,
                }
                .into())
            }
            Reference::Imported {
                module: from,
                name,
                arguments,
            } => {
                if is_relative(from) {
                    let referenced = resolve_module(from, module);
                    let symbol = self.canonical_symbol_of(&referenced, name);
                    return self.create_reference(symbol);
                }
                Ok(Reference::Imported {
                    module: from.clone(),
                    name: name.clone(),
                    arguments: self.convert_list(module, arguments.as_deref())?,
                }
                .into())
            }
            Reference::ImportedDefault {
                module: from,
                default,
                arguments,
            } => {
                if is_relative(from) {
                    return Ok(MetadataError::new("Unsupported bundled default import reference")
                        .with_context("module", from.as_str())
                        .in_module(module)
                        .into());
                }
                Ok(Reference::ImportedDefault {
                    module: from.clone(),
                    default: *default,
                    arguments: self.convert_list(module, arguments.as_deref())?,
                }
                .into())
            }
            Reference::Module { module: from } => {
                // Internal module boundaries are erased by bundling.
                if is_relative(from) {
                    return Ok(MetadataError::new("Unsupported bundled module reference")
                        .with_context("module", from.as_str())
                        .in_module(module)
                        .into());
                }
                Ok(reference.clone().into())
            }
            Reference::Bundled(id) => Ok(Reference::Bundled(*id).into()),
        }
    }

    /// Reference to the canonical identity of `symbol`
    fn create_reference(&mut self, symbol: SymbolId) -> BundleResult<MetadataValue> {
        let canonical = self.symbols.canonical(symbol)?;
        let declaration = self.symbols.get(canonical.declaration);
        if !is_relative(&declaration.module) {
            // Re-exported from outside the bundle: point at the original import.
            return Ok(Reference::imported(declaration.module.clone(), declaration.name.clone()).into());
        }

        self.convert_symbol(symbol)?;
        Ok(Reference::Bundled(canonical.symbol).into())
    }

    fn convert_values(
        &mut self,
        module: &str,
        values: &[MetadataValue],
    ) -> BundleResult<Vec<MetadataValue>> {
        values
            .iter()
            .map(|value| self.convert_value(module, value))
            .collect()
    }

    fn convert_map(&mut self, module: &str, entries: &MetadataMap) -> BundleResult<MetadataMap> {
        entries
            .iter()
            .map(|(key, value)| Ok((key.clone(), self.convert_value(module, value)?)))
            .collect()
    }

    fn convert_list(
        &mut self,
        module: &str,
        values: Option<&[MetadataValue]>,
    ) -> BundleResult<Option<Vec<MetadataValue>>> {
        values
            .map(|values| self.convert_values(module, values))
            .transpose()
    }

    fn convert_optional(
        &mut self,
        module: &str,
        value: Option<&MetadataValue>,
    ) -> BundleResult<Option<MetadataValue>> {
        value
            .map(|value| self.convert_value(module, value))
            .transpose()
    }
}

fn convert_error(module: &str, error: &MetadataError) -> MetadataError {
    MetadataError {
        module: Some(module.to_string()),
        ..error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::schema::ModuleMetadata;
    use serde_json::json;

    fn bundler_for(modules: &[(&str, serde_json::Value)]) -> MetadataBundler<MemoryHost> {
        let mut host = MemoryHost::new();
        for (name, value) in modules {
            let metadata: ModuleMetadata = serde_json::from_value(value.clone()).unwrap();
            host.insert(*name, metadata);
        }
        let mut bundler = MetadataBundler::new("index", "lib", host);
        let exported = bundler.export_all("./index");
        bundler.canonicalize_symbols(&exported);
        bundler
    }

    fn value(value: serde_json::Value) -> MetadataValue {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_primitives_pass_through() {
        let mut bundler = bundler_for(&[("./index", json!({ "version": 3, "metadata": {} }))]);

        let input = value(json!([1, "two", true, null, { "nested": 2.5 }]));
        let output = bundler.convert_value("./index", &input).unwrap();

        assert_eq!(output, input);
    }

    #[test]
    fn test_bundled_module_reference_becomes_error() {
        let mut bundler = bundler_for(&[("./index", json!({ "version": 3, "metadata": {} }))]);

        let input = value(json!({ "__symbolic": "reference", "module": "./internal" }));
        let output = bundler.convert_value("./index", &input).unwrap();

        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({
                "__symbolic": "error",
                "message": "Unsupported bundled module reference",
                "context": { "module": "./internal" },
                "module": "./index"
            })
        );
    }

    #[test]
    fn test_external_references_unchanged() {
        let mut bundler = bundler_for(&[("./index", json!({ "version": 3, "metadata": {} }))]);

        let module_ref = value(json!({ "__symbolic": "reference", "module": "@angular/core" }));
        assert_eq!(bundler.convert_value("./index", &module_ref).unwrap(), module_ref);

        let global = value(json!({ "__symbolic": "reference", "name": "Math" }));
        assert_eq!(bundler.convert_value("./index", &global).unwrap(), global);

        let imported = value(json!({
            "__symbolic": "reference",
            "module": "@angular/core",
            "name": "InjectionToken",
            "arguments": [{ "__symbolic": "reference", "name": "Math" }]
        }));
        assert_eq!(bundler.convert_value("./index", &imported).unwrap(), imported);
    }

    #[test]
    fn test_error_stamped_with_module() {
        let mut bundler = bundler_for(&[("./index", json!({ "version": 3, "metadata": {} }))]);

        let input = value(json!({
            "__symbolic": "error",
            "message": "Destructuring not supported",
            "line": 3,
            "character": 7
        }));
        let output = bundler.convert_value("./lib/a", &input).unwrap();

        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({
                "__symbolic": "error",
                "message": "Destructuring not supported",
                "line": 3,
                "character": 7,
                "module": "./lib/a"
            })
        );
    }

    #[test]
    fn test_relative_import_becomes_handle() {
        let mut bundler = bundler_for(&[
            (
                "./index",
                json!({ "version": 3, "metadata": {}, "exports": [{ "from": "./a" }] }),
            ),
            ("./a", json!({ "version": 3, "metadata": { "A": { "__symbolic": "class" } } })),
        ]);

        let input = value(json!({ "__symbolic": "reference", "module": "./a", "name": "A" }));
        let output = bundler.convert_value("./index", &input).unwrap();

        let public = bundler.symbols().lookup("./index", "A").unwrap();
        assert_eq!(output, Reference::Bundled(public).into());
        assert!(bundler.symbols().get(public).referenced);
        assert!(bundler.symbols().get(public).value.is_some());
    }

    #[test]
    fn test_local_global_is_rewritten() {
        let mut bundler = bundler_for(&[(
            "./index",
            json!({
                "version": 3,
                "metadata": {
                    "TOKEN": "token",
                    "Service": {
                        "__symbolic": "class",
                        "decorators": [{ "__symbolic": "reference", "name": "TOKEN" }]
                    }
                }
            }),
        )]);

        let input = value(json!({ "__symbolic": "reference", "name": "TOKEN" }));
        let output = bundler.convert_value("./index", &input).unwrap();

        let token = bundler.symbols().lookup("./index", "TOKEN").unwrap();
        assert_eq!(output, Reference::Bundled(token).into());
    }

    #[test]
    fn test_reserved_names_not_converted() {
        let mut bundler = bundler_for(&[(
            "./index",
            json!({ "version": 3, "metadata": { "___internal": 1 } }),
        )]);

        let id = bundler.symbols().lookup("./index", "___internal").unwrap();
        bundler.convert_symbol(id).unwrap();

        assert!(bundler.symbols().get(id).referenced);
        assert!(bundler.symbols().get(id).value.is_none());
    }

    #[test]
    fn test_statics_only_convert_functions() {
        let mut bundler = bundler_for(&[(
            "./index",
            json!({ "version": 3, "metadata": { "Helper": 1 } }),
        )]);

        let input = value(json!({
            "__symbolic": "class",
            "statics": {
                "create": {
                    "__symbolic": "function",
                    "parameters": [],
                    "value": { "__symbolic": "reference", "name": "Helper" }
                },
                "plain": { "__symbolic": "reference", "name": "Helper" }
            }
        }));
        let output = bundler.convert_value("./index", &input).unwrap();

        let Some(SymbolicNode::Class(class)) = output.as_node() else {
            panic!("expected class");
        };
        let statics = class.statics.as_ref().unwrap();
        let helper = bundler.symbols().lookup("./index", "Helper").unwrap();
        let Some(SymbolicNode::Function(create)) = statics["create"].as_node() else {
            panic!("expected function");
        };
        assert_eq!(create.value, Some(Reference::Bundled(helper).into()));
        assert_eq!(statics["plain"], value(json!({ "__symbolic": "reference", "name": "Helper" })));
    }
}
