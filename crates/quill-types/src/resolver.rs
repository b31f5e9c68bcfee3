//! Name resolution for binding
//!
//! The [`NameResolver`] trait is the seam between the binder and its
//! environment. The global [`SymbolTable`] holds host-supplied globals, data
//! sources, functions and type names; [`ComposedResolver`] stacks read-only
//! resolvers with first-match-wins precedence; [`FunctionScopeResolver`]
//! layers a UDF's parameter scope over any global resolver by composition.

use crate::FormulaType;
use indexmap::IndexMap;
use quill_ast::UdfArg;
use serde::{Deserialize, Serialize};

/// An external tabular data source visible to the binder
///
/// The binder only records references to these; fetching data and deciding
/// whole-query delegation belong to the surrounding evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDataSource {
    /// Logical name of the source
    pub name: String,
    /// Table schema of the source
    pub schema: FormulaType,
    /// Whether operations over this source can be pushed down to the service
    pub delegatable: bool,
    /// Whether the source pages its results
    pub pageable: bool,
    /// Whether reading the source requires asynchronous evaluation
    pub requires_async: bool,
}

impl ExternalDataSource {
    /// Create a data source description
    pub fn new(name: impl Into<String>, schema: FormulaType) -> Self {
        Self {
            name: name.into(),
            schema,
            delegatable: false,
            pageable: false,
            requires_async: true,
        }
    }

    /// Mark the source delegatable
    pub fn delegatable(mut self) -> Self {
        self.delegatable = true;
        self
    }

    /// Mark the source pageable
    pub fn pageable(mut self) -> Self {
        self.pageable = true;
        self
    }
}

/// How a function's result type derives from its arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReturnTypeRule {
    /// A fixed result type
    Fixed(FormulaType),
    /// Table over the record shape of the first argument (table constructor)
    TableOfRecords,
    /// Record merging the fields of all record arguments, later fields winning
    MergedRecords,
}

/// Signature of a callable function known to the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Types of the leading fixed parameters
    pub fixed_params: Vec<FormulaType>,
    /// Type of the repeating tail parameter, for variadic functions
    pub repeat_param: Option<FormulaType>,
    /// How the result type is derived
    pub return_rule: ReturnTypeRule,
    /// Whether invoking this function requires asynchronous evaluation
    pub requires_async: bool,
}

impl FunctionSignature {
    /// Create a fixed-arity signature
    pub fn new(
        name: impl Into<String>,
        fixed_params: Vec<FormulaType>,
        return_type: FormulaType,
    ) -> Self {
        Self {
            name: name.into(),
            fixed_params,
            repeat_param: None,
            return_rule: ReturnTypeRule::Fixed(return_type),
            requires_async: false,
        }
    }

    /// Create a variadic signature with at least one argument
    pub fn variadic(
        name: impl Into<String>,
        repeat_param: FormulaType,
        return_rule: ReturnTypeRule,
    ) -> Self {
        Self {
            name: name.into(),
            fixed_params: Vec::new(),
            repeat_param: Some(repeat_param),
            return_rule,
            requires_async: false,
        }
    }

    /// Mark the function as requiring asynchronous evaluation
    pub fn with_async(mut self) -> Self {
        self.requires_async = true;
        self
    }

    /// Check whether the signature accepts an argument count
    pub fn accepts_arity(&self, count: usize) -> bool {
        if self.repeat_param.is_some() {
            count >= self.fixed_params.len().max(1)
        } else {
            count == self.fixed_params.len()
        }
    }

    /// Declared type of the parameter at a position
    pub fn param_at(&self, index: usize) -> Option<&FormulaType> {
        self.fixed_params
            .get(index)
            .or(self.repeat_param.as_ref())
    }
}

/// What kind of symbol a name resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Host-supplied global value
    Global,
    /// UDF parameter with its positional index, needed to emit parameter reads
    Parameter {
        /// Position within the function's parameter list
        index: usize,
    },
    /// External tabular data source
    DataSource(ExternalDataSource),
    /// Enum member value
    EnumValue,
}

/// The result of a successful name lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameLookupInfo {
    /// Symbol kind
    pub kind: SymbolKind,
    /// Symbol type
    pub ty: FormulaType,
}

impl NameLookupInfo {
    /// Create lookup info
    pub fn new(kind: SymbolKind, ty: FormulaType) -> Self {
        Self { kind, ty }
    }
}

/// Name resolution seam consumed by the binder and the type graph resolver
pub trait NameResolver {
    /// Resolve a value identifier
    fn lookup(&self, name: &str) -> Option<NameLookupInfo>;

    /// Resolve a type name
    fn lookup_type(&self, name: &str) -> Option<FormulaType>;

    /// Resolve a callable function by name
    fn lookup_function(&self, name: &str) -> Option<&FunctionSignature>;

    /// Resolve an enum namespace member
    fn lookup_enum(&self, _name: &str) -> Option<NameLookupInfo> {
        None
    }

    /// Resolve the control-scope `Self` reference
    fn lookup_self(&self) -> Option<NameLookupInfo> {
        None
    }

    /// Resolve the control-scope `Parent` reference
    fn lookup_parent(&self) -> Option<NameLookupInfo> {
        None
    }
}

/// Global symbol environment supplied by the host
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    globals: IndexMap<String, NameLookupInfo>,
    functions: IndexMap<String, FunctionSignature>,
    types: IndexMap<String, FormulaType>,
}

impl SymbolTable {
    /// Create an empty symbol table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table pre-populated with built-in type names and functions
    pub fn with_builtins() -> Self {
        let mut table = Self::new();

        for name in [
            "Boolean",
            "Number",
            "Decimal",
            "Text",
            "DateTime",
            "DateTimeNoTimeZone",
        ] {
            // from_primitive_name covers exactly these names
            if let Some(ty) = FormulaType::from_primitive_name(name) {
                table.add_type(name, ty);
            }
        }

        table.add_function(FunctionSignature::variadic(
            "And",
            FormulaType::Boolean,
            ReturnTypeRule::Fixed(FormulaType::Boolean),
        ));
        table.add_function(FunctionSignature::variadic(
            "Or",
            FormulaType::Boolean,
            ReturnTypeRule::Fixed(FormulaType::Boolean),
        ));
        table.add_function(FunctionSignature::new(
            "Not",
            vec![FormulaType::Boolean],
            FormulaType::Boolean,
        ));
        table.add_function(FunctionSignature::variadic(
            "Table",
            FormulaType::Polymorphic,
            ReturnTypeRule::TableOfRecords,
        ));
        table.add_function(FunctionSignature::variadic(
            "MergeRecords",
            FormulaType::Polymorphic,
            ReturnTypeRule::MergedRecords,
        ));
        table.add_function(FunctionSignature::new(
            "Abs",
            vec![FormulaType::Number],
            FormulaType::Number,
        ));
        table.add_function(FunctionSignature::new(
            "Len",
            vec![FormulaType::Text],
            FormulaType::Number,
        ));
        table.add_function(FunctionSignature::new(
            "Text",
            vec![FormulaType::Number],
            FormulaType::Text,
        ));
        table.add_function(FunctionSignature::new(
            "Value",
            vec![FormulaType::Text],
            FormulaType::Number,
        ));

        table
    }

    /// Register a host-supplied global value
    pub fn add_global(&mut self, name: impl Into<String>, ty: FormulaType) {
        self.globals
            .insert(name.into(), NameLookupInfo::new(SymbolKind::Global, ty));
    }

    /// Register an external data source
    pub fn add_data_source(&mut self, source: ExternalDataSource) {
        let ty = source.schema.clone();
        self.globals.insert(
            source.name.clone(),
            NameLookupInfo::new(SymbolKind::DataSource(source), ty),
        );
    }

    /// Register a callable function
    pub fn add_function(&mut self, signature: FunctionSignature) {
        self.functions.insert(signature.name.clone(), signature);
    }

    /// Register a named type
    pub fn add_type(&mut self, name: impl Into<String>, ty: FormulaType) {
        self.types.insert(name.into(), ty);
    }

    /// Check whether a function with the name is registered
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

impl NameResolver for SymbolTable {
    fn lookup(&self, name: &str) -> Option<NameLookupInfo> {
        self.globals.get(name).cloned()
    }

    fn lookup_type(&self, name: &str) -> Option<FormulaType> {
        self.types.get(name).cloned()
    }

    fn lookup_function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }
}

/// Stack of resolvers with first-match-wins precedence
pub struct ComposedResolver<'a> {
    layers: Vec<&'a dyn NameResolver>,
}

impl<'a> ComposedResolver<'a> {
    /// Compose resolvers; earlier layers take precedence
    pub fn new(layers: Vec<&'a dyn NameResolver>) -> Self {
        Self { layers }
    }
}

impl NameResolver for ComposedResolver<'_> {
    fn lookup(&self, name: &str) -> Option<NameLookupInfo> {
        self.layers.iter().find_map(|l| l.lookup(name))
    }

    fn lookup_type(&self, name: &str) -> Option<FormulaType> {
        self.layers.iter().find_map(|l| l.lookup_type(name))
    }

    fn lookup_function(&self, name: &str) -> Option<&FunctionSignature> {
        self.layers.iter().find_map(|l| l.lookup_function(name))
    }

    fn lookup_enum(&self, name: &str) -> Option<NameLookupInfo> {
        self.layers.iter().find_map(|l| l.lookup_enum(name))
    }

    fn lookup_self(&self) -> Option<NameLookupInfo> {
        self.layers.iter().find_map(|l| l.lookup_self())
    }

    fn lookup_parent(&self) -> Option<NameLookupInfo> {
        self.layers.iter().find_map(|l| l.lookup_parent())
    }
}

/// Resolver layering a UDF's parameter scope over the global environment
///
/// Value lookups check the parameters first and return the parameter's type
/// plus positional index on a hit. Function, type, enum and control-scope
/// lookups always delegate to the global resolver; the local layer never
/// intercepts them. Construction requires parameter types to already be
/// resolved; this resolver performs no resolution itself.
pub struct FunctionScopeResolver<'a> {
    global: &'a dyn NameResolver,
    params: IndexMap<String, (FormulaType, usize)>,
}

impl<'a> FunctionScopeResolver<'a> {
    /// Create a function-scope resolver from resolved parameter types
    ///
    /// `param_types` is indexed by each argument's positional index.
    pub fn new(
        global: &'a dyn NameResolver,
        args: &[UdfArg],
        param_types: &[FormulaType],
    ) -> Self {
        debug_assert_eq!(args.len(), param_types.len());

        let params = args
            .iter()
            .map(|arg| {
                (
                    arg.name.inner.clone(),
                    (param_types[arg.index].clone(), arg.index),
                )
            })
            .collect();

        Self { global, params }
    }
}

impl NameResolver for FunctionScopeResolver<'_> {
    fn lookup(&self, name: &str) -> Option<NameLookupInfo> {
        if let Some((ty, index)) = self.params.get(name) {
            return Some(NameLookupInfo::new(
                SymbolKind::Parameter { index: *index },
                ty.clone(),
            ));
        }

        self.global.lookup(name)
    }

    fn lookup_type(&self, name: &str) -> Option<FormulaType> {
        // Parameters are values, never types
        self.global.lookup_type(name)
    }

    fn lookup_function(&self, name: &str) -> Option<&FunctionSignature> {
        self.global.lookup_function(name)
    }

    fn lookup_enum(&self, name: &str) -> Option<NameLookupInfo> {
        self.global.lookup_enum(name)
    }

    fn lookup_self(&self) -> Option<NameLookupInfo> {
        self.global.lookup_self()
    }

    fn lookup_parent(&self) -> Option<NameLookupInfo> {
        self.global.lookup_parent()
    }
}
