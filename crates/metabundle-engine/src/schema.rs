//! Symbolic metadata schema
//!
//! Serde model of the per-module metadata documents and of the value trees they carry.
//! The documents use a `__symbolic` discriminator on every structured node; each node kind
//! is a closed enum here so the converter has to handle every kind explicitly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::bundler::SymbolId;

/// Schema version written into every bundle
pub const METADATA_VERSION: u32 = 3;

/// Ordered mapping from names to values
///
/// Insertion order is kept so serialized output is reproducible.
pub type MetadataMap = IndexMap<String, MetadataValue>;

fn default_version() -> u32 {
    METADATA_VERSION
}

/// Discriminator of a module document (`"__symbolic": "module"`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleTag {
    /// The only tag a module document carries
    #[default]
    Module,
}

/// Metadata document of a single module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// Always `module`
    #[serde(rename = "__symbolic", default)]
    pub symbolic: ModuleTag,
    /// Schema version of the document
    #[serde(default = "default_version")]
    pub version: u32,
    /// Declared (or re-exported) names in declaration order
    #[serde(default)]
    pub metadata: MetadataMap,
    /// `export ... from` declarations in declaration order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Vec<ExportDeclaration>>,
    /// Module name other bundles should use to import this one
    #[serde(rename = "importAs", default, skip_serializing_if = "Option::is_none")]
    pub import_as: Option<String>,
}

impl ModuleMetadata {
    /// Create a document with the given entries and no re-exports
    pub fn new(metadata: MetadataMap) -> Self {
        Self {
            symbolic: ModuleTag::Module,
            version: METADATA_VERSION,
            metadata,
            exports: None,
            import_as: None,
        }
    }

    /// Add an export declaration
    pub fn with_export(mut self, export: ExportDeclaration) -> Self {
        self.exports.get_or_insert_with(Vec::new).push(export);
        self
    }

    /// Look up an entry by name
    pub fn get(&self, name: &str) -> Option<&MetadataValue> {
        self.metadata.get(name)
    }

    /// Whether the module has an entry for `name`
    pub fn declares(&self, name: &str) -> bool {
        self.metadata.contains_key(name)
    }

    /// Iterate export declarations (empty when the module has none)
    pub fn export_declarations(&self) -> impl Iterator<Item = &ExportDeclaration> {
        self.exports.iter().flatten()
    }
}

/// An `export ... from "<module>"` declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDeclaration {
    /// Module specifier the names come from
    pub from: String,
    /// Named items; `None` re-exports everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<Vec<ExportItem>>,
}

impl ExportDeclaration {
    /// `export * from "<from>"`
    pub fn all(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            export: None,
        }
    }

    /// `export { <items> } from "<from>"`
    pub fn named(from: impl Into<String>, items: Vec<ExportItem>) -> Self {
        Self {
            from: from.into(),
            export: Some(items),
        }
    }
}

/// A single item of a named export declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportItem {
    /// Exported under its own name
    Name(String),
    /// `name as alias`
    Alias {
        /// Name in the source module
        name: String,
        /// Name in the exporting module
        #[serde(rename = "as")]
        alias: String,
    },
}

impl ExportItem {
    /// Name of the item in the module it is exported from
    pub fn name(&self) -> &str {
        match self {
            ExportItem::Name(name) => name,
            ExportItem::Alias { name, .. } => name,
        }
    }

    /// Name the item is exported as
    pub fn exported_as(&self) -> &str {
        match self {
            ExportItem::Name(name) => name,
            ExportItem::Alias { alias, .. } => alias,
        }
    }
}

impl From<&str> for ExportItem {
    fn from(name: &str) -> Self {
        ExportItem::Name(name.to_string())
    }
}

/// Any value that can appear in a metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// `null`
    Null,
    /// Boolean literal
    Bool(bool),
    /// Numeric literal
    Number(serde_json::Number),
    /// String literal
    String(String),
    /// Array literal
    Array(Vec<MetadataValue>),
    /// A `__symbolic` node
    Node(Box<SymbolicNode>),
    /// Plain object literal
    Object(MetadataMap),
}

impl MetadataValue {
    /// Whether the value is a primitive (passes through conversion unchanged)
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            MetadataValue::Null
                | MetadataValue::Bool(_)
                | MetadataValue::Number(_)
                | MetadataValue::String(_)
        )
    }

    /// The symbolic node, if the value is one
    pub fn as_node(&self) -> Option<&SymbolicNode> {
        match self {
            MetadataValue::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The reference expression, if the value is one
    pub fn as_reference(&self) -> Option<&Reference> {
        match self.as_node() {
            Some(SymbolicNode::Reference(reference)) => Some(reference),
            _ => None,
        }
    }
}

impl From<SymbolicNode> for MetadataValue {
    fn from(node: SymbolicNode) -> Self {
        MetadataValue::Node(Box::new(node))
    }
}

impl From<Reference> for MetadataValue {
    fn from(reference: Reference) -> Self {
        SymbolicNode::Reference(reference).into()
    }
}

impl From<MetadataError> for MetadataValue {
    fn from(error: MetadataError) -> Self {
        SymbolicNode::Error(error).into()
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

/// A structured node tagged with `__symbolic`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__symbolic", rename_all = "lowercase")]
pub enum SymbolicNode {
    /// Class declaration
    Class(ClassMetadata),
    /// Interface declaration (no runtime value)
    Interface,
    /// Function declaration
    Function(FunctionMetadata),
    /// Evaluation error recorded in place of a value
    Error(MetadataError),
    /// Reference to a symbol or module
    Reference(Reference),
    /// `left <operator> right`
    Binary {
        /// Operator text
        operator: String,
        /// Left operand
        left: MetadataValue,
        /// Right operand
        right: MetadataValue,
    },
    /// `expression[index]`
    Index {
        /// Indexed value
        expression: MetadataValue,
        /// Index value
        index: MetadataValue,
    },
    /// Prefix operator
    Pre {
        /// Operator text
        operator: String,
        /// Operand
        operand: MetadataValue,
    },
    /// `condition ? then : else`
    If {
        /// Condition
        condition: MetadataValue,
        /// Value when the condition holds
        #[serde(rename = "thenExpression")]
        then_expression: MetadataValue,
        /// Value otherwise
        #[serde(rename = "elseExpression")]
        else_expression: MetadataValue,
    },
    /// Function call
    Call {
        /// Callee
        expression: MetadataValue,
        /// Call arguments
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Vec<MetadataValue>>,
    },
    /// `new` expression
    New {
        /// Constructed class
        expression: MetadataValue,
        /// Constructor arguments
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Vec<MetadataValue>>,
    },
    /// `expression.member`
    Select {
        /// Selected-from value
        expression: MetadataValue,
        /// Member name
        member: String,
    },
    /// `...expression`
    Spread {
        /// Spread value
        expression: MetadataValue,
    },
}

/// Metadata of a decorated class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    /// Base class expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<MetadataValue>,
    /// Number of type parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<u32>,
    /// Class decorators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorators: Option<Vec<MetadataValue>>,
    /// Decorated members by name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<IndexMap<String, Vec<MemberMetadata>>>,
    /// Static members by name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statics: Option<MetadataMap>,
}

/// A decorated class member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__symbolic", rename_all = "lowercase")]
pub enum MemberMetadata {
    /// The class constructor
    Constructor(MethodMetadata),
    /// A method
    Method(MethodMetadata),
    /// A property or accessor
    Property(PropertyMetadata),
}

/// Metadata of a method or constructor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodMetadata {
    /// Method decorators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorators: Option<Vec<MetadataValue>>,
    /// Decorators of each parameter (`null` for undecorated parameters)
    #[serde(
        rename = "parameterDecorators",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parameter_decorators: Option<Vec<Option<Vec<MetadataValue>>>>,
    /// Parameter types (constructors only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<MetadataValue>>,
}

/// Metadata of a decorated property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    /// Property decorators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorators: Option<Vec<MetadataValue>>,
}

/// Metadata of a function whose body is a single returned expression
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionMetadata {
    /// Parameter names
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Default values of parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Vec<MetadataValue>>,
    /// Returned expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<MetadataValue>,
}

/// An error recorded in place of a value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataError {
    /// Human readable message
    pub message: String,
    /// Zero based line of the offending node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Zero based column of the offending node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<u32>,
    /// Extra data describing the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<MetadataMap>,
    /// Module the error was found in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl MetadataError {
    /// Create an error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Attach a context entry
    pub fn with_context(mut self, key: &str, value: impl Into<MetadataValue>) -> Self {
        self.context
            .get_or_insert_with(MetadataMap::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// Record the owning module
    pub fn in_module(mut self, module: &str) -> Self {
        self.module = Some(module.to_string());
        self
    }
}

/// A `reference` node
///
/// The variants are distinguished by which fields are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// A named symbol imported from a module
    Imported {
        /// Module specifier
        module: String,
        /// Name in that module
        name: String,
        /// Type arguments or call arguments
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Vec<MetadataValue>>,
    },
    /// The default export of a module
    ImportedDefault {
        /// Module specifier
        module: String,
        /// Always `true`
        default: bool,
        /// Type arguments or call arguments
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Vec<MetadataValue>>,
    },
    /// A whole module (namespace import)
    Module {
        /// Module specifier
        module: String,
    },
    /// A global or module-local name
    Global {
        /// Referenced name
        name: String,
        /// Type arguments or call arguments
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arguments: Option<Vec<MetadataValue>>,
    },
    /// Reference to a bundled symbol whose final name is not known yet
    ///
    /// Produced only while converting; replaced by a `Global` reference before a bundle
    /// is handed out. Never serialized or deserialized.
    #[serde(skip)]
    Bundled(SymbolId),
}

impl Reference {
    /// Reference to a global name without arguments
    pub fn global(name: impl Into<String>) -> Self {
        Reference::Global {
            name: name.into(),
            arguments: None,
        }
    }

    /// Reference to a named export of a module
    pub fn imported(module: impl Into<String>, name: impl Into<String>) -> Self {
        Reference::Imported {
            module: module.into(),
            name: name.into(),
            arguments: None,
        }
    }
}
